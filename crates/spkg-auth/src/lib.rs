#![cfg_attr(docsrs, feature(doc_cfg))]

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

#[cfg(feature = "yes-backend")]
#[cfg_attr(docsrs, doc(cfg(feature = "yes-backend")))]
pub mod yes_backend;

pub mod token_backend;

mod error;

pub use error::*;

/// Scheme prefix of the `Authorization` header, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

#[async_trait]
pub trait AuthProvider {
    type Config;

    async fn healthcheck(&self) -> anyhow::Result<()>;

    /// Verify that the bearer token may upload binpkgs for `package`.
    ///
    /// The package name is passed as sent by the client; it has not been
    /// checked against the index yet.
    async fn auth_upload(&self, token: &str, package: &str) -> AuthResult<()>;

    fn token_from_headers<'h>(&self, headers: &'h HeaderMap) -> AuthResult<&'h str> {
        bearer_token_from_headers(headers)
    }
}

/// Extract the token of an `Authorization: Bearer <token>` header.
///
/// A missing header, a header that isn't valid UTF-8, or any other scheme is
/// reported as [`AuthError::Forbidden`]. The scheme match is case-sensitive.
pub fn bearer_token_from_headers(headers: &HeaderMap) -> AuthResult<&str> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::Forbidden)?;
    let value = std::str::from_utf8(header.as_bytes()).map_err(|_| AuthError::Forbidden)?;
    value.strip_prefix(BEARER_PREFIX).ok_or(AuthError::Forbidden)
}
