pub mod errors;
pub mod postgres_connection;
pub mod schema;
