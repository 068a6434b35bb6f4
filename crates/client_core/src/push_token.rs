use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use shared::{domain::Identity, protocol::SessionAction};
use tracing::{debug, info, warn};

use crate::{error::SessionError, selectors::push_token, store::SessionHandle};

/// Per-account push-token endpoints on the server.
#[async_trait]
pub trait PushTokenApi: Send + Sync {
    async fn register_token(&self, identity: &Identity, token: &str) -> anyhow::Result<()>;
    async fn unregister_token(&self, identity: &Identity, token: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenOp {
    Register,
    Unregister,
}

pub struct PushTokenRegistrar {
    api: Arc<dyn PushTokenApi>,
    session: SessionHandle,
}

impl PushTokenRegistrar {
    pub fn new(api: Arc<dyn PushTokenApi>, session: SessionHandle) -> Self {
        Self { api, session }
    }

    pub async fn register(&self, identity: &Identity) -> Result<bool, SessionError> {
        self.with_current_token(identity, TokenOp::Register).await
    }

    pub async fn unregister(&self, identity: &Identity) -> Result<bool, SessionError> {
        self.with_current_token(identity, TokenOp::Unregister).await
    }

    pub async fn handle_new_token(&self, token: Option<String>) -> Result<(), SessionError> {
        self.session
            .dispatch_and_wait(SessionAction::GotPushToken {
                push_token: token.clone(),
            })
            .await?;

        let Some(token) = token else {
            info!("platform reported no push token");
            return Ok(());
        };

        let identities: Vec<Identity> = self
            .session
            .accounts()
            .logged_in()
            .map(|account| account.identity.clone())
            .collect();

        let results = join_all(
            identities
                .iter()
                .map(|identity| self.tracked_request(identity, &token, TokenOp::Register)),
        )
        .await;

        let mut first_error = None;
        for result in results {
            if let Err(err) = result {
                warn!(error = %err, "push token registration failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn with_current_token(
        &self,
        identity: &Identity,
        op: TokenOp,
    ) -> Result<bool, SessionError> {
        let token = self
            .session
            .select(|state, _| push_token(state).map(str::to_owned));
        let Some(token) = token else {
            debug!(%identity, ?op, "no push token yet; skipping");
            return Ok(false);
        };
        self.tracked_request(identity, &token, op).await?;
        Ok(true)
    }

    async fn tracked_request(
        &self,
        identity: &Identity,
        token: &str,
        op: TokenOp,
    ) -> Result<(), SessionError> {
        let api = Arc::clone(&self.api);
        let session = self.session.clone();
        let task_identity = identity.clone();
        let token = token.to_string();

        // Detached so the end is dispatched even if the caller stops waiting.
        let request = tokio::spawn(async move {
            session
                .dispatch(SessionAction::RegisterPushTokenStart {
                    identity: task_identity.clone(),
                })
                .await?;

            let result = match op {
                TokenOp::Register => api.register_token(&task_identity, &token).await,
                TokenOp::Unregister => api.unregister_token(&task_identity, &token).await,
            };

            session
                .dispatch(SessionAction::RegisterPushTokenEnd {
                    identity: task_identity,
                })
                .await?;
            Ok::<_, SessionError>(result)
        });

        let result = match request.await {
            Ok(outcome) => outcome?,
            Err(join_err) => Err(anyhow::Error::new(join_err)),
        };
        result.map_err(|source| SessionError::PushToken {
            identity: identity.clone(),
            source,
        })
    }
}

#[cfg(test)]
#[path = "tests/push_token_tests.rs"]
mod tests;
