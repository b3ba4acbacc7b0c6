//! Remote Coin Store
//!
//! The persistence authority for a player's balance across sessions. Two
//! operations only: fetch-or-create on session start and a coin update on
//! every change.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::persistence::identity::Identity;
use crate::persistence::protocol::{CoinsResponse, CreateOrFetchUserRequest, UpdateCoinsRequest};

/// Remote store errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Request could not be sent or the reply could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Store answered with a non-success status.
    #[error("store rejected request: HTTP {0}")]
    Status(u16),

    /// Base URL cannot carry a path.
    #[error("invalid store url: {0}")]
    InvalidUrl(String),
}

/// Persistence authority seam.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upsert the user and return their stored balance.
    async fn create_or_fetch_user(&self, identity: &Identity) -> Result<i64, RemoteError>;

    /// Overwrite the user's stored balance.
    async fn update_coins(
        &self,
        external_id: &str,
        coins: u64,
        level_index: usize,
    ) -> Result<(), RemoteError>;
}

/// JSON-over-HTTP store.
///
/// - `POST {base}/users` with the identity, replies `{"coins": n}`
/// - `POST {base}/users/{external_id}/coins` with `{"coins": n, "level_index": i}`
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    base_url: Url,
    client: Client,
}

impl HttpRemoteStore {
    /// Create a store client with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// Base URL with extra path segments appended (each one percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL of the upsert endpoint.
    pub fn users_url(&self) -> Result<Url, RemoteError> {
        self.endpoint(&["users"])
    }

    /// URL of a user's coin endpoint.
    pub fn coins_url(&self, external_id: &str) -> Result<Url, RemoteError> {
        self.endpoint(&["users", external_id, "coins"])
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn create_or_fetch_user(&self, identity: &Identity) -> Result<i64, RemoteError> {
        let url = self.users_url()?;
        let response = self
            .client
            .post(url)
            .json(&CreateOrFetchUserRequest::from(identity))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let body: CoinsResponse = response.json().await?;
        debug!("Fetched {} coins for user {}", body.coins, identity.external_id);
        Ok(body.coins)
    }

    async fn update_coins(
        &self,
        external_id: &str,
        coins: u64,
        level_index: usize,
    ) -> Result<(), RemoteError> {
        let url = self.coins_url(external_id)?;
        let response = self
            .client
            .post(url)
            .json(&UpdateCoinsRequest { coins, level_index })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status(response.status().as_u16()))
        }
    }
}

/// Scriptable in-process store for tests.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Returns a fixed balance (or a 503 when `None`) and records pushes.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct FakeRemote {
        pub(crate) coins: Option<i64>,
        pub(crate) fail_pushes: bool,
        pub(crate) pulls: Arc<Mutex<Vec<String>>>,
        pub(crate) pushes: Arc<Mutex<Vec<(String, u64, usize)>>>,
    }

    impl FakeRemote {
        pub(crate) fn with_coins(coins: i64) -> Self {
            Self {
                coins: Some(coins),
                ..Default::default()
            }
        }

        pub(crate) fn unavailable() -> Self {
            Self::default()
        }

        pub(crate) fn pushed(&self) -> Vec<(String, u64, usize)> {
            self.pushes.lock().unwrap().clone()
        }

        pub(crate) fn pull_count(&self) -> usize {
            self.pulls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn create_or_fetch_user(&self, identity: &Identity) -> Result<i64, RemoteError> {
            self.pulls.lock().unwrap().push(identity.external_id.clone());
            self.coins.ok_or(RemoteError::Status(503))
        }

        async fn update_coins(
            &self,
            external_id: &str,
            coins: u64,
            level_index: usize,
        ) -> Result<(), RemoteError> {
            self.pushes
                .lock()
                .unwrap()
                .push((external_id.to_string(), coins, level_index));
            if self.fail_pushes {
                Err(RemoteError::Status(500))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let store = HttpRemoteStore::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(store.users_url().unwrap().as_str(), "http://localhost:5000/api/users");
        assert_eq!(
            store.coins_url("42").unwrap().as_str(),
            "http://localhost:5000/api/users/42/coins"
        );
    }

    #[test]
    fn test_external_id_is_path_encoded() {
        let store = HttpRemoteStore::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            store.coins_url("a/b").unwrap().as_str(),
            "http://localhost:5000/users/a%2Fb/coins"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            HttpRemoteStore::new("not a url", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpRemoteStore::new("mailto:someone@example.com", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let store = HttpRemoteStore::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let result = store.create_or_fetch_user(&Identity::new("1", "Ada")).await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));

        let result = store.update_coins("1", 10, 0).await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));
    }
}
