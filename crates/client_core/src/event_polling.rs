use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{
    domain::Identity,
    protocol::{RegisterAbortReason, SessionAction},
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    config::SessionSettings,
    error::SessionError,
    selectors::active_event_queue_id,
    store::{while_active, while_tracking_queue, SessionHandle},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRegistration {
    pub queue_id: String,
    pub last_event_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub id: i64,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum EventQueueError {
    #[error("server no longer recognizes event queue {queue_id}")]
    BadEventQueueId { queue_id: String },
    #[error("event queue request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(#[source] anyhow::Error),
    #[error("server error: {0}")]
    Server(#[source] anyhow::Error),
}

impl EventQueueError {
    pub fn abort_reason(&self) -> RegisterAbortReason {
        match self {
            EventQueueError::Timeout => RegisterAbortReason::Timeout,
            EventQueueError::Network(_) => RegisterAbortReason::Network,
            EventQueueError::Server(_) => RegisterAbortReason::Server,
            EventQueueError::BadEventQueueId { .. } => RegisterAbortReason::Unexpected,
        }
    }
}

/// Server side of the event queue. Implementations report an invalidated
/// queue as [`EventQueueError::BadEventQueueId`].
#[async_trait]
pub trait EventQueueApi: Send + Sync {
    async fn register_queue(&self, identity: &Identity)
        -> Result<QueueRegistration, EventQueueError>;
    async fn get_events(
        &self,
        identity: &Identity,
        queue_id: &str,
        last_event_id: i64,
    ) -> Result<Vec<QueueEvent>, EventQueueError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    NotActive,
    DeadQueue,
    QueueReplaced,
    ConsumerGone,
}

#[derive(Debug, Clone)]
struct Backoff {
    base: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl Backoff {
    fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: None,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = match self.current {
            None => self.base,
            Some(previous) => previous.saturating_mul(2).min(self.max),
        };
        self.current = Some(delay);
        delay
    }

    fn reset(&mut self) {
        self.current = None;
    }
}

pub struct EventPoller {
    api: Arc<dyn EventQueueApi>,
    session: SessionHandle,
    retry_base: Duration,
    retry_max: Duration,
}

impl EventPoller {
    pub fn new(
        api: Arc<dyn EventQueueApi>,
        session: SessionHandle,
        settings: &SessionSettings,
    ) -> Self {
        Self {
            api,
            session,
            retry_base: settings.poll_retry_base(),
            retry_max: settings.poll_retry_max(),
        }
    }

    pub async fn run(
        &self,
        identity: &Identity,
        events: mpsc::Sender<QueueEvent>,
    ) -> Result<PollExit, SessionError> {
        let Some(registration) = self.register(identity).await? else {
            return Ok(PollExit::NotActive);
        };
        let queue_id = registration.queue_id;
        let mut last_event_id = registration.last_event_id;
        let mut backoff = Backoff::new(self.retry_base, self.retry_max);

        loop {
            if !self.still_polling(identity, &queue_id) {
                info!(%identity, %queue_id, "event queue no longer tracked; stopping poll");
                return Ok(PollExit::QueueReplaced);
            }

            match self
                .api
                .get_events(identity, &queue_id, last_event_id)
                .await
            {
                Ok(batch) => {
                    backoff.reset();
                    if !self.still_polling(identity, &queue_id) {
                        info!(%identity, %queue_id, "dropping events for a queue we no longer track");
                        return Ok(PollExit::QueueReplaced);
                    }
                    for event in batch {
                        last_event_id = last_event_id.max(event.id);
                        if events.send(event).await.is_err() {
                            return Ok(PollExit::ConsumerGone);
                        }
                    }
                }
                Err(EventQueueError::BadEventQueueId { .. }) => {
                    let killed = self
                        .session
                        .dispatch_and_wait_if(
                            SessionAction::DeadQueue,
                            while_tracking_queue(identity.clone(), queue_id.clone()),
                        )
                        .await?;
                    if killed.is_none() {
                        return Ok(PollExit::QueueReplaced);
                    }
                    warn!(%identity, %queue_id, "server reports event queue is dead");
                    return Ok(PollExit::DeadQueue);
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    warn!(
                        %identity,
                        %queue_id,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "event poll failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn register(
        &self,
        identity: &Identity,
    ) -> Result<Option<QueueRegistration>, SessionError> {
        let started = self
            .session
            .dispatch_and_wait_if(SessionAction::RegisterStart, while_active(identity.clone()))
            .await?;
        if started.is_none() {
            warn!(%identity, "refusing to poll for an account that is not active");
            return Ok(None);
        }

        match self.api.register_queue(identity).await {
            Ok(registration) => {
                let recorded = self
                    .session
                    .dispatch_and_wait_if(
                        SessionAction::RegisterComplete {
                            queue_id: registration.queue_id.clone(),
                        },
                        while_active(identity.clone()),
                    )
                    .await?;
                if recorded.is_none() {
                    info!(%identity, queue_id = %registration.queue_id, "account switched during registration; dropping queue");
                    return Ok(None);
                }
                info!(%identity, queue_id = %registration.queue_id, "registered event queue");
                Ok(Some(registration))
            }
            Err(err) => {
                let reason = err.abort_reason();
                warn!(%identity, error = %err, ?reason, "event queue registration failed");
                let aborted = self
                    .session
                    .dispatch_and_wait_if(
                        SessionAction::RegisterAbort { reason },
                        while_active(identity.clone()),
                    )
                    .await?;
                if aborted.is_none() {
                    return Ok(None);
                }
                Err(SessionError::Registration(err))
            }
        }
    }

    fn still_polling(&self, identity: &Identity, queue_id: &str) -> bool {
        self.session.select(|state, accounts| {
            active_event_queue_id(state, accounts, identity) == Some(queue_id)
        })
    }
}

#[cfg(test)]
#[path = "tests/event_polling_tests.rs"]
mod tests;
