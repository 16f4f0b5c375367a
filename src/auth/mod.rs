//! Credential capability handed to anything that talks to the backend.

/// Persisted bearer tokens.
pub mod token_store;

use anyhow::Result;
use async_trait::async_trait;

pub use token_store::FileTokenStorage;

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "VANISHLY_TOKEN";

/// Supplies the current bearer token. `Ok(None)` means "not signed in".
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<Option<String>>;
}

/// Token resolved from the environment first, then the token file.
#[derive(Clone)]
pub struct SessionTokens {
    storage: FileTokenStorage,
    base_url: String,
}

impl SessionTokens {
    pub fn new(storage: FileTokenStorage, base_url: impl Into<String>) -> Self {
        Self {
            storage,
            base_url: base_url.into(),
        }
    }

    /// Store a token pasted from the sign-in page.
    pub async fn sign_in(&self, token: &str) -> Result<()> {
        self.storage.set(&self.base_url, token.trim()).await
    }

    /// Forget the stored token.
    pub async fn sign_out(&self) -> Result<()> {
        self.storage.remove(&self.base_url).await
    }
}

#[async_trait]
impl TokenProvider for SessionTokens {
    async fn token(&self) -> Result<Option<String>> {
        if let Ok(t) = std::env::var(TOKEN_ENV)
            && !t.trim().is_empty()
        {
            return Ok(Some(t.trim().to_string()));
        }
        self.storage.get(&self.base_url).await
    }
}

/// Fixed token for poller tests.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct StaticToken(pub Option<String>);

#[cfg(test)]
#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}
