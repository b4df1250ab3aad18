use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::email_address::EmailAddress;

/// The `Message-ID` header of an outgoing email, including the angle brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh id in the domain of the sender address.
    pub fn generate(sender: &EmailAddress) -> Self {
        Self(format!("<{}@{}>", Uuid::new_v4(), sender.domain()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
