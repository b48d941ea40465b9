pub mod clients;
pub mod mail_transport;
pub mod mailing_attempts;
pub mod mailings;
pub mod messages;
