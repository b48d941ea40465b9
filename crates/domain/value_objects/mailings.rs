use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{
        mailing_attempts::MailingAttemptEntity,
        mailings::{InsertMailingEntity, MailingDispatchStateEntity, MailingEntity},
        messages::MessageEntity,
    },
    value_objects::enums::{attempt_statuses::AttemptStatus, mailing_statuses::MailingStatus},
};

/// A mailing with its lifecycle parsed. Status transitions only happen through
/// `begin_dispatch` and `complete_dispatch`; `is_blocked` never moves the status.
/// `scheduled_at` belongs to the owner, the `date_*_message` stamps to the dispatcher.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailingModel {
    pub id: Uuid,
    pub message_id: Uuid,
    pub status: MailingStatus,
    pub is_blocked: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub date_first_message: Option<DateTime<Utc>>,
    pub date_end_message: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MailingEntity> for MailingModel {
    type Error = anyhow::Error;

    fn try_from(entity: MailingEntity) -> Result<Self> {
        Ok(Self {
            id: entity.id,
            message_id: entity.message_id,
            status: MailingStatus::try_from(entity.status.as_str())?,
            is_blocked: entity.is_blocked,
            scheduled_at: entity.scheduled_at,
            date_first_message: entity.date_first_message,
            date_end_message: entity.date_end_message,
            owner_id: entity.owner_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl MailingModel {
    /// Entered on every non-blocked dispatch. The first-sent timestamp is kept once set.
    pub fn begin_dispatch(&mut self, now: DateTime<Utc>) {
        self.status = MailingStatus::Running;
        if self.date_first_message.is_none() {
            self.date_first_message = Some(now);
        }
    }

    /// Entered only after the transport accepted the message.
    pub fn complete_dispatch(&mut self, now: DateTime<Utc>) {
        self.date_end_message = Some(now);
        self.status = MailingStatus::Completed;
    }

    pub fn dispatch_state(&self) -> MailingDispatchStateEntity {
        MailingDispatchStateEntity {
            status: self.status.to_string(),
            date_first_message: self.date_first_message,
            date_end_message: self.date_end_message,
            updated_at: Utc::now(),
        }
    }
}

/// Everything one dispatch needs, resolved up front by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MailingDispatchModel {
    pub mailing: MailingModel,
    pub message: MessageEntity,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailingDetailModel {
    #[serde(flatten)]
    pub mailing: MailingModel,
    pub client_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertMailingModel {
    pub message_id: Uuid,
    #[serde(default)]
    pub client_ids: Vec<Uuid>,
    /// Earliest time the worker may start sending. Manual dispatch ignores it.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl InsertMailingModel {
    pub fn to_entity(&self, owner_id: Uuid) -> InsertMailingEntity {
        let now = Utc::now();
        InsertMailingEntity {
            message_id: self.message_id,
            status: MailingStatus::Created.to_string(),
            is_blocked: false,
            scheduled_at: self.scheduled_at,
            owner_id: Some(owner_id),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMailingModel {
    pub message_id: Uuid,
    #[serde(default)]
    pub client_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockMailingModel {
    pub is_blocked: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MailingAttemptModel {
    pub id: Uuid,
    pub mailing_id: Uuid,
    pub status: AttemptStatus,
    pub server_response: String,
    pub owner_id: Option<Uuid>,
    pub attempted_at: DateTime<Utc>,
}

impl TryFrom<MailingAttemptEntity> for MailingAttemptModel {
    type Error = anyhow::Error;

    fn try_from(entity: MailingAttemptEntity) -> Result<Self> {
        Ok(Self {
            id: entity.id,
            mailing_id: entity.mailing_id,
            status: AttemptStatus::try_from(entity.status.as_str())?,
            server_response: entity.server_response,
            owner_id: entity.owner_id,
            attempted_at: entity.attempted_at,
        })
    }
}
