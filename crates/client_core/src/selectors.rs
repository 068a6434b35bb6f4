use shared::domain::Identity;

use crate::{
    accounts::AccountsSnapshot,
    session_reducer::is_for_active_account,
    session_state::{GlobalSessionState, PerAccountSessionState, SessionState},
};

pub fn global_session(state: &SessionState) -> &GlobalSessionState {
    &state.global
}

pub fn per_account_session<'a>(
    state: &'a SessionState,
    accounts: &AccountsSnapshot,
    identity: &Identity,
) -> Option<&'a PerAccountSessionState> {
    is_for_active_account(identity, accounts).then_some(&state.account)
}

pub fn active_event_queue_id<'a>(
    state: &'a SessionState,
    accounts: &AccountsSnapshot,
    identity: &Identity,
) -> Option<&'a str> {
    per_account_session(state, accounts, identity).and_then(|account| account.event_queue_id())
}

pub fn is_event_queue_active(
    state: &SessionState,
    accounts: &AccountsSnapshot,
    identity: &Identity,
) -> bool {
    active_event_queue_id(state, accounts, identity).is_some()
}

pub fn push_token_registration_count(
    state: &SessionState,
    accounts: &AccountsSnapshot,
    identity: &Identity,
) -> i32 {
    per_account_session(state, accounts, identity)
        .map(|account| account.register_push_token_requests_in_progress)
        .unwrap_or(0)
}

pub fn is_hydrated(state: &SessionState) -> bool {
    state.global.is_hydrated
}

pub fn push_token(state: &SessionState) -> Option<&str> {
    state.global.push_token.as_deref()
}

#[cfg(test)]
#[path = "tests/selectors_tests.rs"]
mod tests;
