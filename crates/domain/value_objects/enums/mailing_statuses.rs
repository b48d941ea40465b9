use anyhow::{Error, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Lifecycle of a mailing: `Created` until the first dispatch, `Running` while sends are
/// attempted, `Completed` after a successful send.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MailingStatus {
    #[default]
    Created,
    Running,
    Completed,
}

impl MailingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MailingStatus::Completed)
    }
}

impl Display for MailingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            MailingStatus::Created => "created",
            MailingStatus::Running => "running",
            MailingStatus::Completed => "completed",
        };
        write!(f, "{}", status)
    }
}

impl TryFrom<&str> for MailingStatus {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(MailingStatus::Created),
            "running" => Ok(MailingStatus::Running),
            "completed" => Ok(MailingStatus::Completed),
            other => Err(anyhow!("unknown mailing status: {other}")),
        }
    }
}
