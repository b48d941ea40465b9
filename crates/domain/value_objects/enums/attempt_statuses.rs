use anyhow::{Error, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Successful,
    NotSuccessful,
}

impl Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            AttemptStatus::Successful => "successful",
            AttemptStatus::NotSuccessful => "not_successful",
        };
        write!(f, "{}", status)
    }
}

impl TryFrom<&str> for AttemptStatus {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "successful" => Ok(AttemptStatus::Successful),
            "not_successful" => Ok(AttemptStatus::NotSuccessful),
            other => Err(anyhow!("unknown attempt status: {other}")),
        }
    }
}
