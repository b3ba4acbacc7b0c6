//! Player Identity
//!
//! The host platform hands over its user record once at startup. The engine
//! only reads it: the external id is the correlation key for the remote
//! store, the names feed the header label.

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity parsing errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Not a user record (including ids that are neither integers nor strings).
    #[error("invalid user record: {0}")]
    Json(#[from] serde_json::Error),

    /// The id is blank and cannot key a remote balance.
    #[error("user id is empty")]
    EmptyId,
}

/// Platform user id: an integer or a string, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostId {
    /// Numeric id
    Num(i64),
    /// Textual id
    Text(String),
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostId::Num(n) => write!(f, "{}", n),
            HostId::Text(s) => f.write_str(s),
        }
    }
}

/// User record as delivered by the host platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostUser {
    /// Platform user id
    pub id: HostId,
    /// First name
    pub first_name: String,
    /// Last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Handle
    #[serde(default)]
    pub username: Option<String>,
    /// Premium subscriber flag
    #[serde(default)]
    pub is_premium: Option<bool>,
}

/// Read-only identity of the signed-in player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque id used as the remote correlation key
    pub external_id: String,
    /// Primary display name
    pub display_name: String,
    /// Secondary (family) name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_name: Option<String>,
    /// Platform handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Premium flag, when the platform reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

impl Identity {
    /// Create an identity with just an id and a name.
    pub fn new(external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: display_name.into(),
            secondary_name: None,
            username: None,
            is_premium: None,
        }
    }

    /// Parse the host platform's user JSON.
    ///
    /// Numeric and string ids are both accepted and kept as text; any other
    /// id, or a blank one, is rejected.
    pub fn from_host_json(json: &str) -> Result<Self, IdentityError> {
        let user: HostUser = serde_json::from_str(json)?;
        Self::try_from(user)
    }

    /// Full name for display ("First Last" or "First").
    pub fn full_name(&self) -> String {
        match &self.secondary_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.display_name, last),
            _ => self.display_name.clone(),
        }
    }
}

impl TryFrom<HostUser> for Identity {
    type Error = IdentityError;

    fn try_from(user: HostUser) -> Result<Self, Self::Error> {
        let external_id = user.id.to_string();
        if external_id.trim().is_empty() {
            return Err(IdentityError::EmptyId);
        }
        Ok(Self {
            external_id,
            display_name: user.first_name,
            secondary_name: user.last_name,
            username: user.username,
            is_premium: user.is_premium,
        })
    }
}

/// Header label for the top bar; guests get a placeholder name.
pub fn header_label(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => format!("{} (CEO)", identity.full_name()),
        None => "Guest (CEO)".to_string(),
    }
}
