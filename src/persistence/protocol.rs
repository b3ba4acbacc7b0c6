//! Protocol Messages
//!
//! JSON bodies exchanged with the remote coin store.

use serde::{Deserialize, Serialize};

use crate::persistence::identity::Identity;

// =============================================================================
// ENGINE -> STORE
// =============================================================================

/// Body of `CreateOrFetchUser`: an idempotent upsert keyed by `external_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrFetchUserRequest {
    /// Correlation key
    pub external_id: String,
    /// Display name
    pub display_name: String,
    /// Secondary name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_name: Option<String>,
    /// Platform handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Premium flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

impl From<&Identity> for CreateOrFetchUserRequest {
    fn from(identity: &Identity) -> Self {
        Self {
            external_id: identity.external_id.clone(),
            display_name: identity.display_name.clone(),
            secondary_name: identity.secondary_name.clone(),
            username: identity.username.clone(),
            is_premium: identity.is_premium,
        }
    }
}

/// Body of `UpdateCoins`. The user is addressed by the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCoinsRequest {
    /// New coin balance
    pub coins: u64,
    /// Tier index at the time of the update
    pub level_index: usize,
}

// =============================================================================
// STORE -> ENGINE
// =============================================================================

/// Reply to `CreateOrFetchUser`.
///
/// Signed so a corrupt negative balance decodes and can be clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinsResponse {
    /// Stored balance
    pub coins: i64,
}

impl CreateOrFetchUserRequest {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl CoinsResponse {
    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_omits_absent_fields() {
        let request = CreateOrFetchUserRequest::from(&Identity::new("77", "Ada"));
        assert_eq!(
            request.to_json().unwrap(),
            r#"{"external_id":"77","display_name":"Ada"}"#
        );
    }

    #[test]
    fn test_coins_response_ignores_extra_fields() {
        let response = CoinsResponse::from_json(r#"{"coins": -12, "username": "ada"}"#).unwrap();
        assert_eq!(response.coins, -12);
    }

    #[test]
    fn test_update_body_shape() {
        let body = serde_json::to_value(UpdateCoinsRequest { coins: 5045, level_index: 1 }).unwrap();
        assert_eq!(body, serde_json::json!({"coins": 5045, "level_index": 1}));
    }
}
