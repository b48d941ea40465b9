use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::messages;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = messages)]
pub struct MessageEntity {
    pub id: Uuid,
    pub subject: String,
    pub body: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct InsertMessageEntity {
    pub subject: String,
    pub body: String,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = messages)]
pub struct UpdateMessageEntity {
    pub subject: Option<String>,
    pub body: Option<String>,
    pub updated_at: DateTime<Utc>,
}
