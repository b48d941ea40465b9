pub mod clients;
pub mod mailing_attempts;
pub mod mailings;
pub mod messages;
