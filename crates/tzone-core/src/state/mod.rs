//! State store implementations
//!
//! This module contains implementations of the StateStore trait.

pub mod memory;
pub mod file;

pub use memory::MemoryStateStore;
pub use file::FileStateStore;

use crate::config::StateStoreConfig;
use crate::traits::StateStore;

/// Build the store selected by `config`
pub async fn from_config(config: &StateStoreConfig) -> Result<Box<dyn StateStore>, crate::Error> {
    match config {
        StateStoreConfig::File { path } => Ok(Box::new(FileStateStore::new(path).await?)),
        StateStoreConfig::Memory => Ok(Box::new(MemoryStateStore::new())),
    }
}
