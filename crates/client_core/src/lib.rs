pub mod accounts;
pub mod config;
pub mod error;
pub mod event_polling;
pub mod push_token;
pub mod selectors;
pub mod session_reducer;
pub mod session_state;
pub mod store;

pub use accounts::{Account, AccountsSnapshot};
pub use config::{load_settings, load_settings_from, SessionSettings};
pub use error::SessionError;
pub use event_polling::{
    EventPoller, EventQueueApi, EventQueueError, PollExit, QueueEvent, QueueRegistration,
};
pub use push_token::{PushTokenApi, PushTokenRegistrar};
pub use session_reducer::reduce;
pub use session_state::{
    EventQueueState, GlobalSessionState, PerAccountSessionState, SessionState,
};
pub use store::{while_active, while_tracking_queue, DispatchGuard, SessionHandle, SessionStore};
