use anyhow::Result;
use chrono::Utc;
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
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct DispatchLoopSettings {
    pub poll_interval: Duration,
    pub max_failed_attempts: i64,
    pub batch_size: i64,
}

/// Counts for one polling pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub successful: usize,
    pub not_successful: usize,
    pub blocked: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn total(&self) -> usize {
        self.successful + self.not_successful + self.blocked + self.skipped + self.failed
    }
}

pub async fn run_dispatch_loop<M, A, T>(
    mailing_repo: Arc<M>,
    dispatcher: Arc<MailingDispatchUseCase<M, A, T>>,
    settings: DispatchLoopSettings,
) -> Result<()>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    info!(
        poll_interval_secs = settings.poll_interval.as_secs(),
        max_failed_attempts = settings.max_failed_attempts,
        batch_size = settings.batch_size,
        "dispatch_loop: started"
    );

    loop {
        if let Err(err) = process_due_mailings(&*mailing_repo, &*dispatcher, &settings).await {
            error!(db_error = ?err, "dispatch_loop: failed to load due mailings");
        }

        tokio::time::sleep(settings.poll_interval).await;
    }
}

/// Dispatches every due mailing once. A failure on one mailing never stops the pass.
pub async fn process_due_mailings<M, A, T>(
    mailing_repo: &M,
    dispatcher: &MailingDispatchUseCase<M, A, T>,
    settings: &DispatchLoopSettings,
) -> Result<PassSummary>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    let candidates = mailing_repo
        .list_dispatch_candidates(Utc::now(), settings.max_failed_attempts, settings.batch_size)
        .await?;

    if candidates.is_empty() {
        debug!("dispatch_loop: no due mailings");
        return Ok(PassSummary::default());
    }

    info!(count = candidates.len(), "dispatch_loop: dispatching due mailings");

    let mut summary = PassSummary::default();
    for mailing_id in candidates {
        match dispatcher.dispatch_by_id(mailing_id).await {
            Ok(report) => {
                match report.outcome {
                    DispatchOutcome::Successful => summary.successful += 1,
                    DispatchOutcome::NotSuccessful => summary.not_successful += 1,
                    DispatchOutcome::Blocked => summary.blocked += 1,
                }
                debug!(%mailing_id, outcome = %report.outcome, "dispatch_loop: mailing dispatched");
            }
            Err(
                err @ (DispatchError::NotFound(_)
                | DispatchError::AlreadyCompleted(_)
                | DispatchError::InProgress(_)),
            ) => {
                // Deleted, finished or taken by another caller since the candidate query.
                info!(%mailing_id, reason = %err, "dispatch_loop: skipping mailing");
                summary.skipped += 1;
            }
            Err(DispatchError::Internal(err)) => {
                warn!(%mailing_id, error = ?err, "dispatch_loop: dispatch failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        successful = summary.successful,
        not_successful = summary.not_successful,
        blocked = summary.blocked,
        skipped = summary.skipped,
        failed = summary.failed,
        "dispatch_loop: pass finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::{
        application::usecases::mailing_dispatch::DispatchSettings,
        domain::{
            entities::{mailing_attempts::MailingAttemptEntity, messages::MessageEntity},
            repositories::{
                mail_transport::MockMailTransport,
                mailing_attempts::MockMailingAttemptRepository,
                mailings::MockMailingRepository,
            },
            value_objects::{
                enums::mailing_statuses::MailingStatus,
                mail::TransportError,
                mailings::{MailingDispatchModel, MailingModel},
            },
        },
    };
    use mockall::predicate::{always, eq};
    use uuid::Uuid;

    fn loop_settings() -> DispatchLoopSettings {
        DispatchLoopSettings {
            poll_interval: Duration::from_secs(60),
            max_failed_attempts: 3,
            batch_size: 10,
        }
    }

    fn target(mailing_id: Uuid, status: MailingStatus) -> MailingDispatchModel {
        let now = Utc::now();
        let message_id = Uuid::new_v4();
        MailingDispatchModel {
            mailing: MailingModel {
                id: mailing_id,
                message_id,
                status,
                is_blocked: false,
                scheduled_at: None,
                date_first_message: None,
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
            recipients: vec!["a@example.com".to_string()],
        }
    }

    fn dispatcher(
        mailing_repo: MockMailingRepository,
        attempt_repo: MockMailingAttemptRepository,
        transport: MockMailTransport,
    ) -> MailingDispatchUseCase<MockMailingRepository, MockMailingAttemptRepository, MockMailTransport>
    {
        MailingDispatchUseCase::new(
            Arc::new(mailing_repo),
            Arc::new(attempt_repo),
            Arc::new(transport),
            DispatchSettings {
                sender: "mailer@example.com".to_string(),
                send_timeout: Duration::from_secs(5),
            },
        )
    }

    fn echo_attempt(attempt_repo: &mut MockMailingAttemptRepository) {
        attempt_repo.expect_create().returning(|insert| {
            Ok(MailingAttemptEntity {
                id: Uuid::new_v4(),
                mailing_id: insert.mailing_id,
                status: insert.status,
                server_response: insert.server_response,
                owner_id: insert.owner_id,
                attempted_at: Utc::now(),
            })
        });
    }

    fn expect_claim(mailing_repo: &mut MockMailingRepository, mailing_id: Uuid, granted: bool) {
        mailing_repo
            .expect_try_claim_dispatch()
            .with(eq(mailing_id), always(), always())
            .times(1)
            .returning(move |_, _, _| Ok(granted));
    }

    #[tokio::test]
    async fn empty_pass_dispatches_nothing() {
        let mut candidates_repo = MockMailingRepository::new();
        candidates_repo
            .expect_list_dispatch_candidates()
            .withf(|_, max_failed, limit| *max_failed == 3 && *limit == 10)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let mut transport = MockMailTransport::new();
        transport.expect_send().times(0);

        let summary = process_due_mailings(
            &candidates_repo,
            &dispatcher(
                MockMailingRepository::new(),
                MockMailingAttemptRepository::new(),
                transport,
            ),
            &loop_settings(),
        )
        .await
        .unwrap();

        assert_eq!(summary, PassSummary::default());
    }

    #[tokio::test]
    async fn pass_counts_each_outcome_and_continues_after_failures() {
        let sent = Uuid::new_v4();
        let failed_send = Uuid::new_v4();
        let vanished = Uuid::new_v4();
        let completed = Uuid::new_v4();
        let leased = Uuid::new_v4();

        let mut candidates_repo = MockMailingRepository::new();
        candidates_repo
            .expect_list_dispatch_candidates()
            .returning(move |_, _, _| Ok(vec![sent, failed_send, vanished, completed, leased]));

        let mut mailing_repo = MockMailingRepository::new();
        expect_claim(&mut mailing_repo, sent, true);
        expect_claim(&mut mailing_repo, failed_send, true);
        expect_claim(&mut mailing_repo, vanished, false);
        expect_claim(&mut mailing_repo, completed, false);
        expect_claim(&mut mailing_repo, leased, false);
        mailing_repo
            .expect_find_dispatch_target()
            .with(eq(sent))
            .returning(move |id| Ok(Some(target(id, MailingStatus::Created))));
        mailing_repo
            .expect_find_dispatch_target()
            .with(eq(failed_send))
            .returning(move |id| {
                let mut target = target(id, MailingStatus::Running);
                target.recipients = vec!["broken@example.com".to_string()];
                Ok(Some(target))
            });
        mailing_repo
            .expect_find_dispatch_target()
            .with(eq(vanished))
            .returning(|_| Ok(None));
        mailing_repo
            .expect_find_dispatch_target()
            .with(eq(completed))
            .returning(move |id| Ok(Some(target(id, MailingStatus::Completed))));
        mailing_repo
            .expect_find_dispatch_target()
            .with(eq(leased))
            .returning(move |id| Ok(Some(target(id, MailingStatus::Running))));
        mailing_repo
            .expect_save_dispatch_state()
            .times(2)
            .returning(|_, _| Ok(()));
        mailing_repo
            .expect_release_dispatch_claim()
            .times(2)
            .returning(|_| Ok(()));

        let mut attempt_repo = MockMailingAttemptRepository::new();
        echo_attempt(&mut attempt_repo);

        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|email| {
                if email.recipients == vec!["broken@example.com".to_string()] {
                    Err(TransportError::Smtp("550 mailbox unavailable".to_string()))
                } else {
                    Ok(())
                }
            });

        let summary = process_due_mailings(
            &candidates_repo,
            &dispatcher(mailing_repo, attempt_repo, transport),
            &loop_settings(),
        )
        .await
        .unwrap();

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.not_successful, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total(), 5);
    }

    #[tokio::test]
    async fn storage_failure_on_one_mailing_is_counted() {
        let mailing_id = Uuid::new_v4();

        let mut candidates_repo = MockMailingRepository::new();
        candidates_repo
            .expect_list_dispatch_candidates()
            .returning(move |_, _, _| Ok(vec![mailing_id]));

        let mut mailing_repo = MockMailingRepository::new();
        expect_claim(&mut mailing_repo, mailing_id, true);
        mailing_repo
            .expect_find_dispatch_target()
            .returning(|_| Err(anyhow::anyhow!("connection reset")));
        mailing_repo
            .expect_release_dispatch_claim()
            .with(eq(mailing_id))
            .times(1)
            .returning(|_| Ok(()));

        let summary = process_due_mailings(
            &candidates_repo,
            &dispatcher(
                mailing_repo,
                MockMailingAttemptRepository::new(),
                MockMailTransport::new(),
            ),
            &loop_settings(),
        )
        .await
        .unwrap();

        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn candidate_query_failure_is_returned() {
        let mut candidates_repo = MockMailingRepository::new();
        candidates_repo
            .expect_list_dispatch_candidates()
            .returning(|_, _, _| Err(anyhow::anyhow!("database unavailable")));

        let result = process_due_mailings(
            &candidates_repo,
            &dispatcher(
                MockMailingRepository::new(),
                MockMailingAttemptRepository::new(),
                MockMailTransport::new(),
            ),
            &loop_settings(),
        )
        .await;

        assert!(result.is_err());
    }
}
