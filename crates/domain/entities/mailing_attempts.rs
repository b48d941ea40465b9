use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::mailing_attempts;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = mailing_attempts)]
pub struct MailingAttemptEntity {
    pub id: Uuid,
    pub mailing_id: Uuid,
    pub status: String,
    pub server_response: String,
    pub owner_id: Option<Uuid>,
    pub attempted_at: DateTime<Utc>,
}

/// `attempted_at` is assigned by the database on insert.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = mailing_attempts)]
pub struct InsertMailingAttemptEntity {
    pub mailing_id: Uuid,
    pub status: String,
    pub server_response: String,
    pub owner_id: Option<Uuid>,
}
