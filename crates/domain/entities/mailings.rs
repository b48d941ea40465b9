use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::{mailing_clients, mailings};

/// Raw mailing row. Status stays as text and is parsed into `MailingStatus` by `MailingModel`.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = mailings)]
pub struct MailingEntity {
    pub id: Uuid,
    pub message_id: Uuid,
    pub status: String,
    pub is_blocked: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub date_first_message: Option<DateTime<Utc>>,
    pub date_end_message: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mailings)]
pub struct InsertMailingEntity {
    pub message_id: Uuid,
    pub status: String,
    pub is_blocked: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = mailings)]
pub struct UpdateMailingEntity {
    pub message_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Fields the dispatcher owns. `None` dates are left untouched in the row.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = mailings)]
pub struct MailingDispatchStateEntity {
    pub status: String,
    pub date_first_message: Option<DateTime<Utc>>,
    pub date_end_message: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mailing_clients)]
pub struct InsertMailingClientEntity {
    pub mailing_id: Uuid,
    pub client_id: Uuid,
}
