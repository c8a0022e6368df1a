use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use spkg_api_types::index::{IndexError, IndexProvider, IndexResult, PackageEntry};
use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::PathBuf;

/// Package index read from a JSON document of the form
/// `{"<package>": {"binpkg_path": "<fragment>"}, ...}`.
///
/// The map is filled once in the constructor and only read afterwards.
/// Picking up changes to the file requires a restart.
pub struct JsonIndexProvider {
    packages: HashMap<String, PackageEntry>,
}

#[derive(Deserialize, Clone)]
pub struct Config {
    /// Location of `index.json`.
    pub index_path: PathBuf,
}

impl JsonIndexProvider {
    pub fn new(config: Config) -> IndexResult<Self> {
        let path = &config.index_path;
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to read index file {}", path.display()))?;
        let index = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to load index from {}", path.display()))?;
        tracing::info!(path = %path.display(), packages = index.len(), "Loaded package index");
        Ok(index)
    }

    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        let packages = serde_json::from_reader(reader).context("Failed to unmarshal index")?;
        Self::from_entries(packages)
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let packages = serde_json::from_str(json).context("Failed to unmarshal index")?;
        Self::from_entries(packages)
    }

    fn from_entries(packages: HashMap<String, PackageEntry>) -> anyhow::Result<Self> {
        if let Some((name, _)) = packages.iter().find(|(_, e)| e.binpkg_path.is_empty()) {
            anyhow::bail!("Package '{name}' has an empty binpkg_path");
        }
        Ok(Self { packages })
    }

    /// Storage path fragment of `package`, or `None` if it isn't indexed.
    pub fn lookup(&self, package: &str) -> Option<&str> {
        self.packages.get(package).map(|e| e.binpkg_path.as_str())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[async_trait]
impl IndexProvider for JsonIndexProvider {
    type Config = Config;

    async fn binpkg_path(&self, package: &str) -> IndexResult<String> {
        self.lookup(package)
            .map(str::to_owned)
            .ok_or(IndexError::NotFound)
    }

    async fn healthcheck(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
