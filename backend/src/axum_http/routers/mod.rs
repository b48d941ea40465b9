pub mod clients;
pub mod mailings;
pub mod messages;
