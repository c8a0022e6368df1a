use crate::path::FilenamePolicy;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use spkg_api_types::storage::{Bytes, StorageError, StorageProvider, StorageResult};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stores binpkgs under a local repository root whose per-package
/// directories are managed outside of this server.
pub struct FsStorageProvider {
    root: PathBuf,
    filename_policy: FilenamePolicy,
}

#[derive(Deserialize, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub filename_policy: FilenamePolicy,
}

impl FsStorageProvider {
    pub fn new(config: StoreConfig) -> StorageResult<Self> {
        if !config.root.is_dir() {
            return Err(StorageError::ServiceError(anyhow::anyhow!(
                "Storage root {} is not a directory",
                config.root.display()
            )));
        }
        Ok(Self {
            root: config.root,
            filename_policy: config.filename_policy,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filename_policy(&self) -> FilenamePolicy {
        self.filename_policy
    }
}

#[async_trait]
impl StorageProvider for FsStorageProvider {
    async fn put_binpkg(&self, binpkg_path: &str, filename: &str, data: Bytes) -> StorageResult<()> {
        let dest = self.filename_policy.destination(&self.root, binpkg_path, filename)?;
        let len = data.len();

        // The blocking write outlives a cancelled request, the rename keeps it all-or-nothing.
        let dest = tokio::task::spawn_blocking(move || write_replace(&dest, &data).map(|()| dest))
            .await
            .context("Storage write task failed")??;

        tracing::debug!(dest = %dest.display(), len, "Stored binpkg");
        Ok(())
    }

    async fn healthcheck(&self) -> anyhow::Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            anyhow::bail!("root not a dir")
        }
    }
}

/// Write to a temporary file next to `dest`, then rename it over `dest`.
fn write_replace(dest: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = dest.parent().context("Destination has no parent directory")?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".upload-")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create file in {}", parent.display()))?;
    // Temp files start out as 0600, the repository is served to others.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .context("Failed to set file permissions")?;
    }
    tmp.write_all(data).context("Failed to write file")?;
    tmp.persist(dest)
        .with_context(|| format!("Failed to move file into place at {}", dest.display()))?;
    Ok(())
}
