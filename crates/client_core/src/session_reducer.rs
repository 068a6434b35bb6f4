use shared::{domain::same_account, domain::Identity, protocol::SessionAction};

use crate::{
    accounts::AccountsSnapshot,
    session_state::{EventQueueState, PerAccountSessionState, SessionState},
};

pub fn reduce(
    mut state: SessionState,
    action: &SessionAction,
    accounts: &AccountsSnapshot,
) -> SessionState {
    match action {
        SessionAction::DeadQueue => {
            // The server told us the queue id is invalid; forgetting it is
            // what stops the poller on its next check.
            state.account.event_queue = EventQueueState::NoQueue;
        }
        SessionAction::ResetAccountData => {
            state.account = PerAccountSessionState::default();
        }
        SessionAction::Rehydrate => {
            state.global.is_hydrated = true;
        }
        SessionAction::RegisterStart => {
            state.account.event_queue = EventQueueState::Registering;
        }
        SessionAction::RegisterAbort { .. } => {
            if state.account.event_queue == EventQueueState::Registering {
                state.account.event_queue = EventQueueState::NoQueue;
            }
        }
        SessionAction::RegisterComplete { queue_id } => {
            state.account.event_queue = EventQueueState::Active {
                queue_id: queue_id.clone(),
            };
        }
        SessionAction::AppOnline { is_online } => {
            state.global.is_online = *is_online;
        }
        SessionAction::AppOrientation { orientation } => {
            state.global.orientation = *orientation;
        }
        SessionAction::GotPushToken { push_token } => {
            state.global.push_token = push_token.clone();
        }
        SessionAction::ToggleOutboxSending { sending } => {
            state.account.outbox_sending = *sending;
        }
        SessionAction::DismissServerCompatNotice => {
            state.account.has_dismissed_server_compat_notice = true;
        }
        SessionAction::RegisterPushTokenStart { identity } => {
            if is_for_active_account(identity, accounts) {
                state.account.register_push_token_requests_in_progress += 1;
            }
        }
        SessionAction::RegisterPushTokenEnd { identity } => {
            if is_for_active_account(identity, accounts) {
                state.account.register_push_token_requests_in_progress -= 1;
            }
        }
        SessionAction::Unrecognized => {}
    }
    state
}

// TODO: track push-token requests for every account, not only the active one.
pub(crate) fn is_for_active_account(identity: &Identity, accounts: &AccountsSnapshot) -> bool {
    accounts
        .active_identity()
        .is_some_and(|active| same_account(identity, active))
}

#[cfg(test)]
#[path = "tests/session_reducer_tests.rs"]
mod tests;
