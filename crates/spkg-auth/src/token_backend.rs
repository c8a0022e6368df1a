//! Flat allow-list of shared bearer tokens.
//!
//! Every listed token may upload binpkgs for every package.

use crate::{AuthError, AuthProvider, AuthResult};
use async_trait::async_trait;
use serde::Deserialize;

pub struct TokenAuthProvider {
    allowed_tokens: Vec<String>,
}

/// In the config specify the accepted tokens as `allowed_tokens: [..]`.
#[derive(Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub allowed_tokens: Vec<String>,
}

impl TokenAuthProvider {
    pub fn new(config: Config) -> AuthResult<Self> {
        if config.allowed_tokens.iter().any(|t| t.is_empty()) {
            return Err(anyhow::anyhow!("allowed_tokens contains an empty token").into());
        }
        if config.allowed_tokens.is_empty() {
            tracing::warn!("No allowed tokens configured, every upload will be rejected");
        } else {
            tracing::info!(tokens = config.allowed_tokens.len(), "Loaded allowed tokens");
        }
        Ok(Self {
            allowed_tokens: config.allowed_tokens,
        })
    }

    pub fn token_count(&self) -> usize {
        self.allowed_tokens.len()
    }

    fn is_allowed(&self, token: &str) -> bool {
        self.allowed_tokens.iter().any(|allowed| allowed == token)
    }
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    type Config = Config;

    async fn healthcheck(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn auth_upload(&self, token: &str, _any_package: &str) -> AuthResult<()> {
        if self.is_allowed(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
