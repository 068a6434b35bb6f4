use serde::{Deserialize, Serialize};
use shared::domain::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub identity: Identity,
    #[serde(default)]
    pub api_key: String,
}

impl Account {
    pub fn new(identity: Identity, api_key: impl Into<String>) -> Self {
        Self {
            identity,
            api_key: api_key.into(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountsSnapshot {
    pub accounts: Vec<Account>,
}

impl AccountsSnapshot {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.accounts.first()
    }

    pub fn active_identity(&self) -> Option<&Identity> {
        self.active_account().map(|account| &account.identity)
    }

    pub fn logged_in(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|account| account.is_logged_in())
    }
}
