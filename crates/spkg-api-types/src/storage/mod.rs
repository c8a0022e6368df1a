pub use bytes::Bytes;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};

mod error;

#[async_trait]
pub trait StorageProvider {
    /// Store a binpkg as `<root>/<binpkg_path>/<filename>`, replacing any existing file.
    ///
    /// `binpkg_path` comes from the package index, `filename` from the client.
    /// The package directory must already exist; it is never created here.
    async fn put_binpkg(&self, binpkg_path: &str, filename: &str, data: Bytes) -> StorageResult<()>;

    async fn healthcheck(&self) -> anyhow::Result<()>;
}
