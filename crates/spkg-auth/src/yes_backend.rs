//! A backend that says "yes" to every request for authorization.
//!
//! This is exactly as insecure as it sounds, and is meant primarily for testing purposes.
//! The `Authorization: Bearer <token>` header is still required, but any token passes.

use crate::{AuthProvider, AuthResult};
use async_trait::async_trait;

/// In the config specify `auth_allow_full_access_without_any_checks: true` to let
/// anyone who can connect upload binpkgs for any indexed package.
pub struct YesAuthProvider(());

impl YesAuthProvider {
    #[track_caller]
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(yes_config: Config) -> AuthResult<Self> {
        if !yes_config.auth_allow_full_access_without_any_checks {
            return Err(anyhow::anyhow!("enabled 'yes' auth without explicit opt-in").into());
        }
        Ok(Self(()))
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct Config {
    pub auth_allow_full_access_without_any_checks: bool,
}

#[async_trait]
impl AuthProvider for YesAuthProvider {
    type Config = Config;

    async fn healthcheck(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn auth_upload(&self, _token: &str, _package: &str) -> AuthResult<()> {
        Ok(())
    }
}
