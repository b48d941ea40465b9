use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Manager,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin",
        };
        write!(f, "{}", role)
    }
}

impl Role {
    /// Unknown claims fall back to the least privileged role.
    pub fn from_claim(value: &str) -> Self {
        match value {
            "manager" => Role::Manager,
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}
