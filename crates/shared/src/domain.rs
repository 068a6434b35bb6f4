use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub realm: Url,
    pub email: String,
}

impl Identity {
    pub fn new(realm: Url, email: impl Into<String>) -> Self {
        Self {
            realm,
            email: email.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.email, self.realm)
    }
}

pub fn key_of_identity(identity: &Identity) -> String {
    format!("{}\0{}", identity.realm, identity.email)
}

pub fn same_account(a: &Identity, b: &Identity) -> bool {
    key_of_identity(a) == key_of_identity(b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}
