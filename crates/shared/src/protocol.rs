use serde::{Deserialize, Serialize};

use crate::{
    domain::{Identity, Orientation},
    error::ActionDecodeError,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegisterAbortReason {
    Server,
    Network,
    Timeout,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionAction {
    Rehydrate,
    DeadQueue,
    ResetAccountData,
    AppOnline {
        is_online: Option<bool>,
    },
    RegisterStart,
    RegisterAbort {
        reason: RegisterAbortReason,
    },
    RegisterComplete {
        queue_id: String,
    },
    AppOrientation {
        orientation: Orientation,
    },
    ToggleOutboxSending {
        sending: bool,
    },
    GotPushToken {
        push_token: Option<String>,
    },
    DismissServerCompatNotice,
    RegisterPushTokenStart {
        identity: Identity,
    },
    RegisterPushTokenEnd {
        identity: Identity,
    },
    #[serde(other)]
    Unrecognized,
}

impl SessionAction {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionAction::Rehydrate => "rehydrate",
            SessionAction::DeadQueue => "dead_queue",
            SessionAction::ResetAccountData => "reset_account_data",
            SessionAction::AppOnline { .. } => "app_online",
            SessionAction::RegisterStart => "register_start",
            SessionAction::RegisterAbort { .. } => "register_abort",
            SessionAction::RegisterComplete { .. } => "register_complete",
            SessionAction::AppOrientation { .. } => "app_orientation",
            SessionAction::ToggleOutboxSending { .. } => "toggle_outbox_sending",
            SessionAction::GotPushToken { .. } => "got_push_token",
            SessionAction::DismissServerCompatNotice => "dismiss_server_compat_notice",
            SessionAction::RegisterPushTokenStart { .. } => "register_push_token_start",
            SessionAction::RegisterPushTokenEnd { .. } => "register_push_token_end",
            SessionAction::Unrecognized => "unrecognized",
        }
    }
}

pub fn decode_action_log(raw: &str) -> Result<Vec<SessionAction>, ActionDecodeError> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| ActionDecodeError::Malformed {
                line: index + 1,
                source,
            })
        })
        .collect()
}
