//! Destination path composition: `<root>/<binpkg_path>/<filename>`.

use crate::{StorageError, StorageResult};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// How much the client-supplied filename is trusted when composing the destination.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FilenamePolicy {
    /// The filename must be exactly one plain path component, and the index
    /// fragment must stay below the storage root.
    #[default]
    SingleComponent,
    /// Keep only the last path component of the filename, so `build/foo.pkg`
    /// is stored as `foo.pkg`. The fragment is resolved lexically and clamped
    /// at the storage root.
    #[serde(alias = "verbatim")]
    Basename,
}

impl FilenamePolicy {
    pub fn destination(self, root: &Path, binpkg_path: &str, filename: &str) -> StorageResult<PathBuf> {
        match self {
            Self::SingleComponent => {
                if !is_plain_filename(filename) {
                    return Err(StorageError::InvalidFilename(filename.into()));
                }
                if !is_relative_below(binpkg_path) {
                    return Err(anyhow::anyhow!(
                        "Index path '{binpkg_path}' points outside of the storage root"
                    )
                    .into());
                }
                Ok(root.join(binpkg_path).join(filename))
            }
            Self::Basename => {
                let name = last_component(filename);
                if !is_plain_filename(name) {
                    return Err(StorageError::InvalidFilename(filename.into()));
                }
                Ok(join_clamped(root, binpkg_path).join(name))
            }
        }
    }
}

fn last_component(filename: &str) -> &str {
    let trimmed = filename.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// `root` joined with `fragment`, where `..` never climbs above `root` and
/// an absolute fragment is taken relative to it.
fn join_clamped(root: &Path, fragment: &str) -> PathBuf {
    let mut parts: Vec<&OsStr> = Vec::new();
    for component in Path::new(fragment).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    let mut dest = root.to_path_buf();
    dest.extend(parts);
    dest
}

fn is_plain_filename(filename: &str) -> bool {
    if filename.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn is_relative_below(binpkg_path: &str) -> bool {
    Path::new(binpkg_path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
