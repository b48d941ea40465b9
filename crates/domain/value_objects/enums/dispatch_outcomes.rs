use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::attempt_statuses::AttemptStatus;

/// What a single dispatch call reports back to its caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Successful,
    NotSuccessful,
    Blocked,
}

impl Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = match self {
            DispatchOutcome::Successful => "successful",
            DispatchOutcome::NotSuccessful => "not_successful",
            DispatchOutcome::Blocked => "blocked",
        };
        write!(f, "{}", outcome)
    }
}

impl From<AttemptStatus> for DispatchOutcome {
    fn from(value: AttemptStatus) -> Self {
        match value {
            AttemptStatus::Successful => DispatchOutcome::Successful,
            AttemptStatus::NotSuccessful => DispatchOutcome::NotSuccessful,
        }
    }
}
