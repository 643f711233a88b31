use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use tokio::sync::Mutex;

/// A token this close to expiry is refreshed instead of reused.
const REFRESH_MARGIN_SECONDS: i64 = 30;

/// Pesapal returns an expiry alongside the token, but it is not parsed; a
/// conservative fixed lease is used instead.
const TOKEN_LEASE_MINUTES: i64 = 50;

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn leased_now(token: String) -> Self {
        Self {
            token,
            expires_at: Utc::now() + Duration::minutes(TOKEN_LEASE_MINUTES),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(REFRESH_MARGIN_SECONDS)
    }
}

#[derive(Debug, Default)]
pub struct TokenCache {
    inner: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Returns the cached token while it is fresh, otherwise refreshes it.
    /// The lock is held across the refresh so concurrent callers coalesce
    /// into a single remote call.
    pub async fn bearer_token<F, Fut>(&self, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedToken>>,
    {
        let mut cached = self.inner.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.token.clone());
            }
        }

        let fresh = refresh().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);

        Ok(token)
    }
}
