use shared::{domain::Identity, protocol::SessionAction};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::{
    accounts::AccountsSnapshot,
    config::SessionSettings,
    error::SessionError,
    selectors::active_event_queue_id,
    session_reducer::{is_for_active_account, reduce},
    session_state::SessionState,
};

pub type DispatchGuard = Box<dyn FnOnce(&SessionState, &AccountsSnapshot) -> bool + Send>;

struct Envelope {
    action: SessionAction,
    guard: Option<DispatchGuard>,
    applied: Option<oneshot::Sender<(SessionState, bool)>>,
}

#[derive(Clone)]
pub struct SessionHandle {
    actions: mpsc::Sender<Envelope>,
    state: watch::Receiver<SessionState>,
    accounts: watch::Receiver<AccountsSnapshot>,
}

pub struct SessionStore;

impl SessionStore {
    pub fn spawn(
        settings: &SessionSettings,
        accounts: watch::Receiver<AccountsSnapshot>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (action_tx, action_rx) = mpsc::channel(settings.dispatch_queue_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let task = tokio::spawn(run_dispatch_loop(action_rx, state_tx, accounts.clone()));
        let handle = SessionHandle {
            actions: action_tx,
            state: state_rx,
            accounts,
        };
        (handle, task)
    }
}

pub fn while_active(identity: Identity) -> DispatchGuard {
    Box::new(move |_, accounts| is_for_active_account(&identity, accounts))
}

pub fn while_tracking_queue(identity: Identity, queue_id: String) -> DispatchGuard {
    Box::new(move |state, accounts| {
        active_event_queue_id(state, accounts, &identity) == Some(queue_id.as_str())
    })
}

async fn run_dispatch_loop(
    mut actions: mpsc::Receiver<Envelope>,
    state_tx: watch::Sender<SessionState>,
    accounts: watch::Receiver<AccountsSnapshot>,
) {
    while let Some(Envelope {
        action,
        guard,
        applied,
    }) = actions.recv().await
    {
        let current = state_tx.borrow().clone();
        let (next, accepted) = {
            let accounts = accounts.borrow();
            let accepted = guard.map_or(true, |guard| guard(&current, &*accounts));
            if !accepted {
                debug!(action = action.kind(), "dispatch guard rejected action");
                (current, false)
            } else {
                if let SessionAction::RegisterPushTokenStart { identity }
                | SessionAction::RegisterPushTokenEnd { identity } = &action
                {
                    if !is_for_active_account(identity, &accounts) {
                        debug!(
                            action = action.kind(),
                            %identity,
                            "discarding push token result for inactive account"
                        );
                    }
                }
                (reduce(current, &action, &accounts), true)
            }
        };

        let in_progress = next.account.register_push_token_requests_in_progress;
        if in_progress < 0 {
            warn!(
                in_progress,
                "push token request counter went negative; an end was dispatched without a start"
            );
        }

        let changed = state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next.clone();
                true
            }
        });
        debug!(action = action.kind(), changed, "applied session action");

        if let Some(applied) = applied {
            let _ = applied.send((next, accepted));
        }
    }
    debug!("session dispatch loop stopped");
}

impl SessionHandle {
    pub async fn dispatch(&self, action: SessionAction) -> Result<(), SessionError> {
        self.send(action, None, None).await
    }

    pub async fn dispatch_and_wait(
        &self,
        action: SessionAction,
    ) -> Result<SessionState, SessionError> {
        let (applied_tx, applied_rx) = oneshot::channel();
        self.send(action, None, Some(applied_tx)).await?;
        let (state, _) = applied_rx.await.map_err(|_| SessionError::DispatchClosed)?;
        Ok(state)
    }

    pub async fn dispatch_and_wait_if(
        &self,
        action: SessionAction,
        guard: DispatchGuard,
    ) -> Result<Option<SessionState>, SessionError> {
        let (applied_tx, applied_rx) = oneshot::channel();
        self.send(action, Some(guard), Some(applied_tx)).await?;
        let (state, accepted) = applied_rx.await.map_err(|_| SessionError::DispatchClosed)?;
        Ok(accepted.then_some(state))
    }

    async fn send(
        &self,
        action: SessionAction,
        guard: Option<DispatchGuard>,
        applied: Option<oneshot::Sender<(SessionState, bool)>>,
    ) -> Result<(), SessionError> {
        self.actions
            .send(Envelope {
                action,
                guard,
                applied,
            })
            .await
            .map_err(|_| SessionError::DispatchClosed)
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn accounts(&self) -> AccountsSnapshot {
        self.accounts.borrow().clone()
    }

    pub fn select<R>(&self, selector: impl FnOnce(&SessionState, &AccountsSnapshot) -> R) -> R {
        let state = self.state.borrow();
        let accounts = self.accounts.borrow();
        selector(&state, &accounts)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn updates(&self) -> WatchStream<SessionState> {
        WatchStream::new(self.state.clone())
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
