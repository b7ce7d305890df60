//! Entity store contract and implementations.
//!
//! The processor only ever talks to [`EntityStore`]; a real database
//! backend would implement the same trait behind its own connection
//! handling.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entity::{Entity, Status};
use crate::error::StoreError;

/// Contract for the durable entity state owned outside the processor.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Atomically transition an entity's status.
    ///
    /// Fails with [`StoreError::NotFound`] if no entity with `id` exists
    /// and with [`StoreError::UpdateConflict`] if the compare-and-swap
    /// against the last-known value loses a race. No automatic retry.
    async fn update_status(&self, id: Uuid, status: Status) -> Result<(), StoreError>;

    /// Snapshot of all entities currently in [`Status::Submitted`].
    ///
    /// The snapshot is not a live view and may be stale relative to
    /// concurrent writers; callers must tolerate entities disappearing
    /// or new ones appearing after the fetch.
    async fn list_pending(&self) -> Result<Vec<Entity>, StoreError>;
}
