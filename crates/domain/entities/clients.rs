use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::clients;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = clients)]
pub struct ClientEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = clients)]
pub struct InsertClientEntity {
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = clients)]
pub struct UpdateClientEntity {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub comment: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}
