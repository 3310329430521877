//! Filename sanitation for downloaded assets
//!
//! Files already on disk were named by this exact rule, so it must not drift.

use unicode_normalization::UnicodeNormalization;

/// Maximum length of a sanitized base name
pub const MAX_FILENAME_LEN: usize = 100;

/// Derives a filesystem-safe base name from a record's display name
///
/// # Rules (applied in order)
///
/// 1. Lower-case the text
/// 2. Canonical decomposition (NFD), dropping combining diacritical marks
///    (U+0300..U+036F)
/// 3. Remove `(` and `)`
/// 4. Replace every character that is not an ASCII letter or digit with `_`
/// 5. Collapse runs of `_` into one
/// 6. Truncate to 100 characters
///
/// # Example
///
/// ```
/// use catalog_sweep::sanitize_filename;
///
/// assert_eq!(
///     sanitize_filename("Taladro (Inalámbrico) Núm. 1!"),
///     "taladro_inalambrico_num_1_"
/// );
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .filter(|c| !matches!(c, '(' | ')'))
    {
        let mapped = if c.is_ascii_alphanumeric() { c } else { '_' };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }

    // Output is pure ASCII, so byte length equals character count
    out.truncate(MAX_FILENAME_LEN);
    out
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}
