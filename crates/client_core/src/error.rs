use shared::domain::Identity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session dispatch loop has shut down")]
    DispatchClosed,
    #[error("event queue registration failed: {0}")]
    Registration(#[source] crate::event_polling::EventQueueError),
    #[error("push token request failed for {identity}: {source}")]
    PushToken {
        identity: Identity,
        #[source]
        source: anyhow::Error,
    },
}
