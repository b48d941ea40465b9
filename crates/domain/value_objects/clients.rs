use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::clients::{ClientEntity, InsertClientEntity, UpdateClientEntity};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClientModel {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl From<ClientEntity> for ClientModel {
    fn from(entity: ClientEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            full_name: entity.full_name,
            comment: entity.comment,
            owner_id: entity.owner_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertClientModel {
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
}

impl InsertClientModel {
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        if self.full_name.trim().is_empty() {
            return Err("full_name must not be empty".to_string());
        }
        Ok(())
    }

    pub fn to_entity(&self, owner_id: Uuid) -> InsertClientEntity {
        let now = Utc::now();
        InsertClientEntity {
            email: self.email.trim().to_lowercase(),
            full_name: self.full_name.trim().to_string(),
            comment: self.comment.clone(),
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClientModel {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub comment: Option<Option<String>>,
}

impl UpdateClientModel {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if self
            .full_name
            .as_deref()
            .is_some_and(|full_name| full_name.trim().is_empty())
        {
            return Err("full_name must not be empty".to_string());
        }
        Ok(())
    }

    pub fn to_entity(&self) -> UpdateClientEntity {
        UpdateClientEntity {
            email: self.email.as_ref().map(|email| email.trim().to_lowercase()),
            full_name: self
                .full_name
                .as_ref()
                .map(|full_name| full_name.trim().to_string()),
            comment: self.comment.clone(),
            updated_at: Utc::now(),
        }
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(format!("invalid email address: {email}")),
    }
}
