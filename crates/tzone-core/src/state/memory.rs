// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Crash Behavior
//
// - The snapshot is lost on restart
// - The first check after a restart always announces
//
// ## When to Use
//
// - Testing environments
// - Deployments where a duplicate announcement after restart is harmless

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::StateSnapshot;
use crate::traits::StateStore;

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use tzone_core::state::MemoryStateStore;
/// use tzone_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     assert!(store.load().await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<Option<StateSnapshot>>>,
}

impl MemoryStateStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `snapshot`
    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(snapshot))),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<StateSnapshot>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), Error> {
        *self.inner.write().await = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ZoneRecord, ZoneRole};
    use chrono::Utc;

    fn snapshot(name: &str) -> StateSnapshot {
        let now = Utc::now();
        StateSnapshot {
            next: ZoneRecord::new("Jail", "", ZoneRole::Next, now),
            current: ZoneRecord::new(name, "", ZoneRole::Current, now),
        }
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStateStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&snapshot("Oasis")).await.unwrap();
        store.save(&snapshot("Tristram")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.current.name, "Tristram");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStateStore::new();
        let clone = store.clone();
        let saved = snapshot("Oasis");

        store.save(&saved).await.unwrap();
        assert_eq!(clone.load().await.unwrap(), Some(saved));
    }
}
