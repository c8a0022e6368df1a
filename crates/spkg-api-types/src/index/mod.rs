use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::{IndexError, IndexResult};

mod error;

/// One entry of the package index, as stored in `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Directory of the package's binpkgs, relative to the storage root.
    pub binpkg_path: String,
}

/// Read-only lookup from package name to its storage path fragment.
///
/// Implementations are loaded once at startup and never mutated afterwards,
/// so lookups need no locking.
///
/// # Note
/// The index does NOT authenticate user actions.
/// Callers must authorize the upload before resolving the package.
#[async_trait]
pub trait IndexProvider: Sync {
    type Config;

    /// Resolve the storage path fragment of a package.
    ///
    /// Any string is accepted as a name. If the package is not in the index,
    /// [`IndexError::NotFound`] is returned.
    async fn binpkg_path(&self, package: &str) -> IndexResult<String>;

    async fn healthcheck(&self) -> anyhow::Result<()>;
}
