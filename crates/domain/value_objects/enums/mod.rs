pub mod attempt_statuses;
pub mod dispatch_outcomes;
pub mod mailing_statuses;
pub mod roles;
