//! Run mode and phase definitions for a sweep
//!
//! The mode is decided once before scanning starts; the phase tracks where
//! the orchestrator is in its lifecycle.

use std::fmt;

/// Which indices a run visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Ascending from the checkpoint to the last visible card
    Normal,

    /// Only the indices recorded as failed, in discovery order
    RetryOnly,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::RetryOnly => "retry-only",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one orchestrator run
///
/// `Idle -> ModeSelect -> (NormalScan | RetryScan) -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepPhase {
    /// Stores loaded, nothing driven yet
    Idle,

    /// Choosing between a normal and a retry-only scan
    ModeSelect,

    /// Walking indices from the checkpoint
    NormalScan,

    /// Re-attempting previously failed indices
    RetryScan,

    /// Browser closed, summary reported
    Done,
}

impl SweepPhase {
    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: SweepPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::ModeSelect)
                | (Self::ModeSelect, Self::NormalScan)
                | (Self::ModeSelect, Self::RetryScan)
                | (Self::NormalScan, Self::Done)
                | (Self::RetryScan, Self::Done)
        )
    }

    /// The scan phase that serves `mode`
    pub fn scan_for(mode: RunMode) -> Self {
        match mode {
            RunMode::Normal => Self::NormalScan,
            RunMode::RetryOnly => Self::RetryScan,
        }
    }
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ModeSelect => "mode-select",
            Self::NormalScan => "normal-scan",
            Self::RetryScan => "retry-scan",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
