use anyhow::Result;
use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use crates::{
    application::usecases::mailing_dispatch::{DispatchError, MailingDispatchUseCase},
    domain::{
        repositories::{
            mail_transport::MailTransport, mailing_attempts::MailingAttemptRepository,
            mailings::MailingRepository,
        },
        value_objects::enums::dispatch_outcomes::DispatchOutcome,
    },
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "mailingctl", about = "Dispatch and inspect mailings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a mailing now
    Dispatch {
        #[arg(value_name = "MAILING_ID")]
        mailing_id: Uuid,
    },
    /// Print the attempt history of a mailing, oldest first
    Attempts {
        #[arg(value_name = "MAILING_ID")]
        mailing_id: Uuid,
    },
    /// Stop a mailing from being sent
    Block {
        #[arg(value_name = "MAILING_ID")]
        mailing_id: Uuid,
    },
    /// Allow a blocked mailing to be sent again
    Unblock {
        #[arg(value_name = "MAILING_ID")]
        mailing_id: Uuid,
    },
}

/// What a command prints and whether the process should exit successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    pub success: bool,
}

impl CommandOutput {
    fn ok(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            success: true,
        }
    }

    fn error(line: impl Into<String>) -> Self {
        let line: String = line.into();
        Self {
            lines: vec![format!("Error: {line}")],
            success: false,
        }
    }
}

/// Runs operator commands. No permission checks: whoever can reach the database is trusted.
pub struct Operator<M, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    mailing_repo: Arc<M>,
    attempt_repo: Arc<A>,
    dispatcher: MailingDispatchUseCase<M, A, T>,
}

impl<M, A, T> Operator<M, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    pub fn new(
        mailing_repo: Arc<M>,
        attempt_repo: Arc<A>,
        dispatcher: MailingDispatchUseCase<M, A, T>,
    ) -> Self {
        Self {
            mailing_repo,
            attempt_repo,
            dispatcher,
        }
    }

    pub async fn execute(&self, command: Command) -> Result<CommandOutput> {
        match command {
            Command::Dispatch { mailing_id } => self.dispatch(mailing_id).await,
            Command::Attempts { mailing_id } => self.attempts(mailing_id).await,
            Command::Block { mailing_id } => self.set_blocked(mailing_id, true).await,
            Command::Unblock { mailing_id } => self.set_blocked(mailing_id, false).await,
        }
    }

    async fn dispatch(&self, mailing_id: Uuid) -> Result<CommandOutput> {
        match self.dispatcher.dispatch_by_id(mailing_id).await {
            Ok(report) => {
                info!(%mailing_id, outcome = %report.outcome, "mailingctl: dispatch finished");
                Ok(match report.outcome {
                    DispatchOutcome::Successful => CommandOutput::ok(report.message),
                    DispatchOutcome::NotSuccessful | DispatchOutcome::Blocked => {
                        CommandOutput::error(report.message)
                    }
                })
            }
            Err(
                err @ (DispatchError::NotFound(_)
                | DispatchError::AlreadyCompleted(_)
                | DispatchError::InProgress(_)),
            ) => Ok(CommandOutput::error(err.to_string())),
            Err(DispatchError::Internal(err)) => Err(err),
        }
    }

    async fn attempts(&self, mailing_id: Uuid) -> Result<CommandOutput> {
        if self.mailing_repo.find_by_id(mailing_id).await?.is_none() {
            return Ok(CommandOutput::error(format!("mailing {mailing_id} not found")));
        }

        let attempts = self.attempt_repo.list_by_mailing(mailing_id).await?;
        if attempts.is_empty() {
            return Ok(CommandOutput::ok("No attempts recorded"));
        }

        let lines = attempts
            .into_iter()
            .map(|attempt| {
                format!(
                    "{}  {:<14}  {}",
                    attempt
                        .attempted_at
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                    attempt.status,
                    attempt.server_response
                )
            })
            .collect();

        Ok(CommandOutput {
            lines,
            success: true,
        })
    }

    async fn set_blocked(&self, mailing_id: Uuid, is_blocked: bool) -> Result<CommandOutput> {
        if self.mailing_repo.find_by_id(mailing_id).await?.is_none() {
            return Ok(CommandOutput::error(format!("mailing {mailing_id} not found")));
        }

        self.mailing_repo.set_blocked(mailing_id, is_blocked).await?;
        info!(%mailing_id, is_blocked, "mailingctl: block flag updated");

        let state = if is_blocked { "blocked" } else { "unblocked" };
        Ok(CommandOutput::ok(format!("Mailing {mailing_id} {state}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crates::{
        application::usecases::mailing_dispatch::DispatchSettings,
        domain::{
            entities::{
                mailing_attempts::MailingAttemptEntity, mailings::MailingEntity,
                messages::MessageEntity,
            },
            repositories::{
                mail_transport::MockMailTransport,
                mailing_attempts::MockMailingAttemptRepository,
                mailings::MockMailingRepository,
            },
            value_objects::{
                enums::mailing_statuses::MailingStatus,
                mailings::{MailingDispatchModel, MailingModel},
            },
        },
    };
    use mockall::predicate::{always, eq};
    use std::time::Duration;

    fn operator(
        mailing_repo: MockMailingRepository,
        attempt_repo: MockMailingAttemptRepository,
        dispatch_repo: MockMailingRepository,
    ) -> Operator<MockMailingRepository, MockMailingAttemptRepository, MockMailTransport> {
        let dispatcher = MailingDispatchUseCase::new(
            Arc::new(dispatch_repo),
            Arc::new(MockMailingAttemptRepository::new()),
            Arc::new(MockMailTransport::new()),
            DispatchSettings {
                sender: "mailer@example.com".to_string(),
                send_timeout: Duration::from_secs(5),
            },
        );

        Operator::new(Arc::new(mailing_repo), Arc::new(attempt_repo), dispatcher)
    }

    fn stored_mailing(id: Uuid) -> MailingEntity {
        let now = Utc::now();
        MailingEntity {
            id,
            message_id: Uuid::new_v4(),
            status: "running".to_string(),
            is_blocked: false,
            scheduled_at: None,
            date_first_message: Some(now),
            date_end_message: None,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn parses_subcommands() {
        let id = Uuid::new_v4();

        let cli = Cli::try_parse_from(["mailingctl", "dispatch", id.to_string().as_str()]).unwrap();
        assert_eq!(cli.command, Command::Dispatch { mailing_id: id });

        let cli = Cli::try_parse_from(["mailingctl", "unblock", id.to_string().as_str()]).unwrap();
        assert_eq!(cli.command, Command::Unblock { mailing_id: id });
    }

    #[test]
    fn rejects_malformed_identifier() {
        assert!(Cli::try_parse_from(["mailingctl", "dispatch", "42"]).is_err());
    }

    #[tokio::test]
    async fn dispatch_of_unknown_mailing_reports_not_found() {
        let mailing_id = Uuid::new_v4();
        let mut dispatch_repo = MockMailingRepository::new();
        dispatch_repo
            .expect_try_claim_dispatch()
            .with(eq(mailing_id), always(), always())
            .returning(|_, _, _| Ok(false));
        dispatch_repo
            .expect_find_dispatch_target()
            .with(eq(mailing_id))
            .returning(|_| Ok(None));

        let output = operator(
            MockMailingRepository::new(),
            MockMailingAttemptRepository::new(),
            dispatch_repo,
        )
        .execute(Command::Dispatch { mailing_id })
        .await
        .unwrap();

        assert!(!output.success);
        assert_eq!(output.lines, vec![format!("Error: mailing {mailing_id} not found")]);
    }

    #[tokio::test]
    async fn dispatch_racing_another_process_reports_error() {
        let mailing_id = Uuid::new_v4();
        let mut dispatch_repo = MockMailingRepository::new();
        dispatch_repo
            .expect_try_claim_dispatch()
            .returning(|_, _, _| Ok(false));
        dispatch_repo.expect_find_dispatch_target().returning(|id| {
            let now = Utc::now();
            let message_id = Uuid::new_v4();
            Ok(Some(MailingDispatchModel {
                mailing: MailingModel {
                    id,
                    message_id,
                    status: MailingStatus::Running,
                    is_blocked: false,
                    scheduled_at: None,
                    date_first_message: Some(now),
                    date_end_message: None,
                    owner_id: None,
                    created_at: now,
                    updated_at: now,
                },
                message: MessageEntity {
                    id: message_id,
                    subject: "Weekly digest".to_string(),
                    body: "Hello".to_string(),
                    owner_id: None,
                    created_at: now,
                    updated_at: now,
                },
                recipients: vec![],
            }))
        });
        dispatch_repo.expect_save_dispatch_state().times(0);

        let output = operator(
            MockMailingRepository::new(),
            MockMailingAttemptRepository::new(),
            dispatch_repo,
        )
        .execute(Command::Dispatch { mailing_id })
        .await
        .unwrap();

        assert!(!output.success);
        assert_eq!(
            output.lines,
            vec![format!(
                "Error: mailing {mailing_id} is being dispatched by another caller"
            )]
        );
    }

    #[tokio::test]
    async fn attempts_are_printed_oldest_first() {
        let mailing_id = Uuid::new_v4();
        let stored = stored_mailing(mailing_id);
        let mut mailing_repo = MockMailingRepository::new();
        mailing_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));

        let mut attempt_repo = MockMailingAttemptRepository::new();
        attempt_repo
            .expect_list_by_mailing()
            .with(eq(mailing_id))
            .returning(move |mailing_id| {
                Ok(vec![
                    MailingAttemptEntity {
                        id: Uuid::new_v4(),
                        mailing_id,
                        status: "not_successful".to_string(),
                        server_response: "Failed to send message: smtp timeout".to_string(),
                        owner_id: None,
                        attempted_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                    },
                    MailingAttemptEntity {
                        id: Uuid::new_v4(),
                        mailing_id,
                        status: "successful".to_string(),
                        server_response: "Message sent successfully".to_string(),
                        owner_id: None,
                        attempted_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
                    },
                ])
            });

        let output = operator(mailing_repo, attempt_repo, MockMailingRepository::new())
            .execute(Command::Attempts { mailing_id })
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.lines.len(), 2);
        assert!(output.lines[0].starts_with("2024-03-01T09:00:00Z"));
        assert!(output.lines[0].contains("smtp timeout"));
        assert!(output.lines[1].contains("Message sent successfully"));
    }

    #[tokio::test]
    async fn block_sets_flag_without_touching_status() {
        let mailing_id = Uuid::new_v4();
        let stored = stored_mailing(mailing_id);
        let mut mailing_repo = MockMailingRepository::new();
        mailing_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        mailing_repo
            .expect_set_blocked()
            .with(eq(mailing_id), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        mailing_repo.expect_save_dispatch_state().times(0);

        let output = operator(
            mailing_repo,
            MockMailingAttemptRepository::new(),
            MockMailingRepository::new(),
        )
        .execute(Command::Block { mailing_id })
        .await
        .unwrap();

        assert!(output.success);
        assert_eq!(output.lines, vec![format!("Mailing {mailing_id} blocked")]);
    }

    #[tokio::test]
    async fn unblock_of_unknown_mailing_fails() {
        let mut mailing_repo = MockMailingRepository::new();
        mailing_repo.expect_find_by_id().returning(|_| Ok(None));
        mailing_repo.expect_set_blocked().times(0);

        let output = operator(
            mailing_repo,
            MockMailingAttemptRepository::new(),
            MockMailingRepository::new(),
        )
        .execute(Command::Unblock {
            mailing_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

        assert!(!output.success);
    }
}
