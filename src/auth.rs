//! Bearer token cache for the music service.

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::ports::TokenProvider;

/// An access token and when it was issued.
///
/// The provider's `expires_in` is not trusted; a token is considered stale only
/// once the API rejects it.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub obtained_at: Instant,
}

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            obtained_at: Instant::now(),
        }
    }
}

/// Holds the current token and refreshes it on demand.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    current: Option<Token>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            current: None,
        }
    }

    /// Return the cached token, exchanging credentials first if there is none.
    ///
    /// Exchange failures propagate without retry.
    pub async fn get_token(&mut self) -> Result<Token> {
        if let Some(token) = &self.current {
            return Ok(token.clone());
        }

        tracing::debug!("Refreshing access token");
        let token = self.provider.exchange().await?;
        self.current = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next `get_token` performs a fresh exchange.
    pub fn invalidate(&mut self) {
        if let Some(token) = self.current.take() {
            tracing::debug!(
                age_secs = token.obtained_at.elapsed().as_secs(),
                "Invalidated access token"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTokenProvider;

    #[tokio::test]
    async fn caches_until_invalidated() {
        let provider = Arc::new(FakeTokenProvider::default());
        let mut cache = TokenCache::new(provider.clone());

        let first = cache.get_token().await.expect("first token");
        let second = cache.get_token().await.expect("cached token");
        assert_eq!(first.value, "token-1");
        assert_eq!(second.value, "token-1");
        assert_eq!(provider.exchanges(), 1);

        cache.invalidate();
        let third = cache.get_token().await.expect("refreshed token");
        assert_eq!(third.value, "token-2");
        assert_eq!(provider.exchanges(), 2);
    }

    #[tokio::test]
    async fn exchange_failure_is_not_cached() {
        let provider = Arc::new(FakeTokenProvider::failing_first(1));
        let mut cache = TokenCache::new(provider.clone());

        let err = cache.get_token().await.expect_err("exchange should fail");
        assert!(err.is_auth());

        let token = cache.get_token().await.expect("second attempt succeeds");
        assert_eq!(token.value, "token-2");
        assert_eq!(provider.exchanges(), 2);
    }
}
