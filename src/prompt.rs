//! Operator prompt for choosing the run mode
//!
//! Only asked when earlier runs left failed indices behind.

use crate::sweep::RunMode;
use std::io::{BufRead, Write};

/// Asks whether to re-attempt only the failed indices
///
/// An answer starting with `y` (after trimming, any case) selects
/// `RunMode::RetryOnly`; anything else, including end of input, selects
/// `RunMode::Normal`.
pub fn ask_run_mode<R: BufRead, W: Write>(
    failed: &[usize],
    input: &mut R,
    output: &mut W,
) -> std::io::Result<RunMode> {
    write!(
        output,
        "Found failed indices: [{}].\nRetry only those? (y/n): ",
        format_indices(failed)
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(parse_answer(&answer))
}

/// Interprets a yes/no answer
pub fn parse_answer(answer: &str) -> RunMode {
    if answer.trim().to_lowercase().starts_with('y') {
        RunMode::RetryOnly
    } else {
        RunMode::Normal
    }
}

/// Renders indices as `1, 4, 9`
pub fn format_indices(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
