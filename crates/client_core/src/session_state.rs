use serde::Serialize;
use shared::domain::Orientation;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EventQueueState {
    #[default]
    NoQueue,
    Registering,
    Active { queue_id: String },
}

impl EventQueueState {
    pub fn loading(&self) -> bool {
        matches!(self, EventQueueState::Registering)
    }

    pub fn queue_id(&self) -> Option<&str> {
        match self {
            EventQueueState::Active { queue_id } => Some(queue_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GlobalSessionState {
    // None until the platform reports connectivity.
    pub is_online: Option<bool>,
    pub is_hydrated: bool,
    pub orientation: Orientation,
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PerAccountSessionState {
    pub event_queue: EventQueueState,
    pub outbox_sending: bool,
    pub has_dismissed_server_compat_notice: bool,
    // Never clamped; callers pair every end with a start.
    pub register_push_token_requests_in_progress: i32,
}

impl PerAccountSessionState {
    pub fn loading(&self) -> bool {
        self.event_queue.loading()
    }

    pub fn event_queue_id(&self) -> Option<&str> {
        self.event_queue.queue_id()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    pub global: GlobalSessionState,
    pub account: PerAccountSessionState,
}
