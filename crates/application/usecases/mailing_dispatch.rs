use anyhow::anyhow;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::dispatch_locks::DispatchLocks,
    domain::{
        entities::mailing_attempts::InsertMailingAttemptEntity,
        repositories::{
            mail_transport::MailTransport, mailing_attempts::MailingAttemptRepository,
            mailings::MailingRepository,
        },
        value_objects::{
            enums::{attempt_statuses::AttemptStatus, dispatch_outcomes::DispatchOutcome},
            mail::{OutgoingEmail, TransportError},
            mailings::MailingDispatchModel,
        },
    },
};

pub const BLOCKED_RESPONSE: &str = "Mailing is blocked";
pub const SUCCESS_RESPONSE: &str = "Message sent successfully";

/// Lease head-room on top of the send timeout, covering the lookup and the two writes.
const CLAIM_GRACE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("mailing {0} not found")]
    NotFound(Uuid),
    #[error("mailing {0} is already completed")]
    AlreadyCompleted(Uuid),
    #[error("mailing {0} is being dispatched by another caller")]
    InProgress(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result handed back to the invocation surface: the human-readable response text and the
/// outcome of the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub message: String,
    pub outcome: DispatchOutcome,
}

impl DispatchReport {
    fn blocked() -> Self {
        Self {
            message: BLOCKED_RESPONSE.to_string(),
            outcome: DispatchOutcome::Blocked,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Configured sender account.
    pub sender: String,
    /// Upper bound for a single transport call.
    pub send_timeout: Duration,
}

pub struct MailingDispatchUseCase<M, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    mailing_repo: Arc<M>,
    attempt_repo: Arc<A>,
    transport: Arc<T>,
    settings: DispatchSettings,
    locks: DispatchLocks,
}

impl<M, A, T> Clone for MailingDispatchUseCase<M, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            mailing_repo: Arc::clone(&self.mailing_repo),
            attempt_repo: Arc::clone(&self.attempt_repo),
            transport: Arc::clone(&self.transport),
            settings: self.settings.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<M, A, T> MailingDispatchUseCase<M, A, T>
where
    M: MailingRepository + Send + Sync + 'static,
    A: MailingAttemptRepository + Send + Sync + 'static,
    T: MailTransport + Send + Sync + 'static,
{
    pub fn new(
        mailing_repo: Arc<M>,
        attempt_repo: Arc<A>,
        transport: Arc<T>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            mailing_repo,
            attempt_repo,
            transport,
            settings,
            locks: DispatchLocks::new(),
        }
    }

    /// Dispatches a mailing by identifier on its own task. Dropping the returned future
    /// (request timeout, client gone) does not cancel a send that already started, so the
    /// attempt record and the mailing state are still written.
    pub async fn dispatch_by_id(&self, mailing_id: Uuid) -> Result<DispatchReport, DispatchError> {
        let usecase = self.clone();

        tokio::spawn(async move { usecase.dispatch_claimed(mailing_id).await })
            .await
            .map_err(|join_error| {
                error!(%mailing_id, ?join_error, "mailing_dispatch: dispatch task failed");
                DispatchError::Internal(anyhow!("dispatch task for mailing {mailing_id} failed"))
            })?
    }

    /// Holds the in-process lock and the database lease for the whole dispatch. The mailing
    /// is loaded only once both are held, so it is never older than a concurrent dispatch.
    async fn dispatch_claimed(&self, mailing_id: Uuid) -> Result<DispatchReport, DispatchError> {
        let _guard = self.locks.acquire(mailing_id).await;

        let now = Utc::now();
        let claimed = self
            .mailing_repo
            .try_claim_dispatch(mailing_id, now, self.claim_deadline(now))
            .await
            .map_err(|err| {
                error!(%mailing_id, db_error = ?err, "mailing_dispatch: failed to claim mailing");
                DispatchError::Internal(err)
            })?;

        if !claimed {
            return Err(self.explain_refused_claim(mailing_id).await);
        }

        let result = match self.load_target(mailing_id).await {
            Ok(target) => self.dispatch(target).await,
            Err(err) => Err(err),
        };

        if let Err(err) = self.mailing_repo.release_dispatch_claim(mailing_id).await {
            // The lease runs out on its own.
            warn!(%mailing_id, db_error = ?err, "mailing_dispatch: failed to release claim");
        }

        result
    }

    async fn load_target(&self, mailing_id: Uuid) -> Result<MailingDispatchModel, DispatchError> {
        self.mailing_repo
            .find_dispatch_target(mailing_id)
            .await
            .map_err(|err| {
                error!(
                    %mailing_id,
                    db_error = ?err,
                    "mailing_dispatch: failed to load mailing"
                );
                DispatchError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%mailing_id, "mailing_dispatch: mailing not found");
                DispatchError::NotFound(mailing_id)
            })
    }

    /// A refused claim means missing, completed, or leased elsewhere.
    async fn explain_refused_claim(&self, mailing_id: Uuid) -> DispatchError {
        let target = match self.load_target(mailing_id).await {
            Ok(target) => target,
            Err(err) => return err,
        };

        if target.mailing.status.is_terminal() {
            warn!(%mailing_id, "mailing_dispatch: refusing to re-dispatch completed mailing");
            DispatchError::AlreadyCompleted(mailing_id)
        } else {
            info!(%mailing_id, "mailing_dispatch: mailing is leased by another dispatch");
            DispatchError::InProgress(mailing_id)
        }
    }

    fn claim_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let lease = self.settings.send_timeout.saturating_add(CLAIM_GRACE);
        TimeDelta::from_std(lease)
            .ok()
            .and_then(|lease| now.checked_add_signed(lease))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Runs one dispatch attempt. Transport failures never escape: they become a
    /// `not_successful` attempt. Every non-blocked call that reaches the send step records
    /// exactly one attempt.
    pub async fn dispatch(
        &self,
        target: MailingDispatchModel,
    ) -> Result<DispatchReport, DispatchError> {
        let MailingDispatchModel {
            mut mailing,
            message,
            recipients,
        } = target;
        let mailing_id = mailing.id;

        if mailing.is_blocked {
            info!(%mailing_id, "mailing_dispatch: mailing is blocked, nothing sent");
            return Ok(DispatchReport::blocked());
        }

        if mailing.status.is_terminal() {
            warn!(
                %mailing_id,
                status = %mailing.status,
                "mailing_dispatch: refusing to re-dispatch completed mailing"
            );
            return Err(DispatchError::AlreadyCompleted(mailing_id));
        }

        mailing.begin_dispatch(Utc::now());

        info!(
            %mailing_id,
            recipient_count = recipients.len(),
            "mailing_dispatch: sending message"
        );

        let email = OutgoingEmail {
            subject: message.subject,
            body: message.body,
            sender: self.settings.sender.clone(),
            recipients,
        };

        let (status, server_response) = match self.send_with_timeout(email).await {
            Ok(()) => {
                mailing.complete_dispatch(Utc::now());
                info!(%mailing_id, "mailing_dispatch: message sent");
                (AttemptStatus::Successful, SUCCESS_RESPONSE.to_string())
            }
            Err(err) => {
                warn!(
                    %mailing_id,
                    transport_error = %err,
                    "mailing_dispatch: transport failed, mailing stays running"
                );
                (
                    AttemptStatus::NotSuccessful,
                    format!("Failed to send message: {err}"),
                )
            }
        };

        let insert_attempt_entity = InsertMailingAttemptEntity {
            mailing_id,
            status: status.to_string(),
            server_response: server_response.clone(),
            owner_id: mailing.owner_id,
        };

        // Both writes are attempted even when the first one fails.
        let recorded = self.attempt_repo.create(insert_attempt_entity).await;
        let saved = self
            .mailing_repo
            .save_dispatch_state(mailing_id, mailing.dispatch_state())
            .await;

        if let Err(err) = recorded {
            error!(
                %mailing_id,
                attempt_status = %status,
                db_error = ?err,
                "mailing_dispatch: failed to record attempt"
            );
            return Err(DispatchError::Internal(err));
        }
        if let Err(err) = saved {
            error!(
                %mailing_id,
                mailing_status = %mailing.status,
                db_error = ?err,
                "mailing_dispatch: failed to save mailing state"
            );
            return Err(DispatchError::Internal(err));
        }

        Ok(DispatchReport {
            message: server_response,
            outcome: DispatchOutcome::from(status),
        })
    }

    async fn send_with_timeout(&self, email: OutgoingEmail) -> Result<(), TransportError> {
        let send_timeout = self.settings.send_timeout;
        match tokio::time::timeout(send_timeout, self.transport.send(email)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(send_timeout)),
        }
    }
}
