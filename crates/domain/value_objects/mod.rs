pub mod clients;
pub mod enums;
pub mod iam;
pub mod mail;
pub mod mailings;
pub mod messages;
