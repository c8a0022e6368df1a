#![cfg_attr(docsrs, feature(doc_cfg))]

pub use spkg_api_types::storage::{StorageError, StorageResult};

pub mod fs;

pub mod path;
