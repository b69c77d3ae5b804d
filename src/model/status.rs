// Status and stage enums

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a test case, fixture or step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Failed,
    Broken,
    Passed,
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Failed => "failed",
            Status::Broken => "broken",
            Status::Passed => "passed",
            Status::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution stage of a lifecycle entity
///
/// The engine sets these values but never validates transitions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Scheduled,
    Running,
    Finished,
    Pending,
    Interrupted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scheduled => "scheduled",
            Stage::Running => "running",
            Stage::Finished => "finished",
            Stage::Pending => "pending",
            Stage::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
