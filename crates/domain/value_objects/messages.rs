use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::messages::{InsertMessageEntity, MessageEntity, UpdateMessageEntity};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageModel {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub owner_id: Option<Uuid>,
}

impl From<MessageEntity> for MessageModel {
    fn from(entity: MessageEntity) -> Self {
        Self {
            id: entity.id,
            subject: entity.subject,
            body: entity.body,
            owner_id: entity.owner_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertMessageModel {
    pub subject: String,
    pub body: String,
}

impl InsertMessageModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.trim().is_empty() {
            return Err("subject must not be empty".to_string());
        }
        Ok(())
    }

    pub fn to_entity(&self, owner_id: Uuid) -> InsertMessageEntity {
        let now = Utc::now();
        InsertMessageEntity {
            subject: self.subject.trim().to_string(),
            body: self.body.clone(),
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMessageModel {
    pub subject: Option<String>,
    pub body: Option<String>,
}

impl UpdateMessageModel {
    pub fn validate(&self) -> Result<(), String> {
        if self
            .subject
            .as_deref()
            .is_some_and(|subject| subject.trim().is_empty())
        {
            return Err("subject must not be empty".to_string());
        }
        Ok(())
    }

    pub fn to_entity(&self) -> UpdateMessageEntity {
        UpdateMessageEntity {
            subject: self.subject.as_ref().map(|subject| subject.trim().to_string()),
            body: self.body.clone(),
            updated_at: Utc::now(),
        }
    }
}
