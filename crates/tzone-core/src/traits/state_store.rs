// # State Store Trait
//
// Defines the interface for persisting the last announced snapshot.
//
// ## Purpose
//
// The store holds exactly one record: the snapshot that was last delivered
// successfully. It lets a restarted daemon avoid re-announcing an hour.
//
// ## Implementations
//
// - File-based: single JSON array, atomic rewrite
// - Memory: non-persistent, for tests

use async_trait::async_trait;

use crate::model::StateSnapshot;

/// Trait for state store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Cache the single record in memory
///
/// ## Forbidden Capabilities
/// - ❌ Decide when to save (owned by `ZoneWatcher`)
/// - ❌ Spawn background tasks
///
/// A single writer is assumed: only the watcher task calls `save`.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateSnapshot))`: The last saved snapshot
    /// - `Ok(None)`: Nothing saved yet
    /// - `Err(Error)`: Storage error (callers treat it as "no prior state")
    async fn load(&self) -> Result<Option<StateSnapshot>, crate::Error>;

    /// Replace the persisted snapshot
    ///
    /// Overwrites any prior content. Saving the same snapshot twice leaves
    /// `load()` returning it.
    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), crate::Error>;
}
