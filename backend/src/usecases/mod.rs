pub mod clients;
pub mod crud_error;
pub mod mailings;
pub mod messages;
