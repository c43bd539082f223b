use std::fmt;

use serde::Serialize;

use super::Phase;
use crate::error::{CoreError, CoreReason};
use crate::model::{TargetGroup, TargetIdentity};

/// What happened to one destination that was fully cut over.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationOutcome {
    pub group: TargetGroup,
    pub registered: usize,
    /// Health polls issued before every snapshot identity was ready.
    pub polls: u32,
    /// Pre-existing members removed because they were not in the snapshot.
    pub pruned: Vec<TargetIdentity>,
}

/// Result of a successful switchover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwitchoverReport {
    pub source: TargetGroup,
    pub snapshot: Vec<TargetIdentity>,
    pub destinations: Vec<DestinationOutcome>,
    pub source_retired: bool,
}

// ---------------------------------------------------------------------------
// SwitchoverFailure
// ---------------------------------------------------------------------------

/// A switchover that stopped part way.
///
/// Nothing is rolled back: destinations in `completed` stay switched,
/// `untouched` were never modified, and `destination` (if any) is the one
/// that was being processed when `phase` failed.
#[derive(Debug)]
pub struct SwitchoverFailure {
    pub phase: Phase,
    pub destination: Option<TargetGroup>,
    pub completed: Vec<DestinationOutcome>,
    pub untouched: Vec<TargetGroup>,
    reason: CoreReason,
    error: CoreError,
}

impl SwitchoverFailure {
    pub(super) fn new(
        phase: Phase,
        reason: CoreReason,
        error: CoreError,
        destination: Option<TargetGroup>,
        completed: Vec<DestinationOutcome>,
        untouched: Vec<TargetGroup>,
    ) -> Self {
        Self {
            phase,
            destination,
            completed,
            untouched,
            reason,
            error,
        }
    }

    pub fn reason(&self) -> &CoreReason {
        &self.reason
    }

    pub fn error(&self) -> &CoreError {
        &self.error
    }

    pub fn into_error(self) -> CoreError {
        self.error
    }

    pub fn completed_names(&self) -> Vec<&str> {
        self.completed.iter().map(|o| o.group.name.as_str()).collect()
    }
}

impl fmt::Display for SwitchoverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "switchover failed while {}", self.phase)?;
        if let Some(dest) = &self.destination {
            write!(f, " {}", dest.name)?;
        }
        write!(f, ": {}", self.error)?;
        if self.completed.is_empty() {
            write!(f, "; no destination was cut over")?;
        } else {
            write!(f, "; already cut over: {}", self.completed_names().join(", "))?;
        }
        if !self.untouched.is_empty() {
            let names: Vec<&str> = self.untouched.iter().map(|g| g.name.as_str()).collect();
            write!(f, "; untouched: {}", names.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for SwitchoverFailure {}
