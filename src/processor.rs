//! Worker-pool processor.
//!
//! On every poll tick the processor claims pending entities from the
//! store into its working set and dispatches one concurrent task per
//! claim. Claims are throttled: while any claim is still unconfirmed the
//! tick does nothing, so a batch still transitioning into "confirmed
//! running" is never piled onto.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, Entry};
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::entity::{Entity, Status};
use crate::error::StoreError;
use crate::poller::PollHandler;
use crate::store::EntityStore;

/// Claim lifecycle of a working-set entry.
///
/// An entry is `Claimed` from insertion until the processing task
/// acknowledges it has started, then `Confirmed` until removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Claimed,
    Confirmed,
}

/// What a single poll tick did, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Number of entities newly claimed and dispatched this tick.
    Claimed(usize),
    /// Unconfirmed claims were outstanding; nothing was fetched.
    Throttled,
}

/// Claims pending entities into a transient working set and processes
/// each on an independent task.
///
/// The working set is the only structure shared between the poll tick
/// and the processing tasks; every mutation goes through the map's
/// atomic insert-if-absent, compare-and-swap, and remove primitives.
pub struct WorkerPoolProcessor {
    store: Arc<dyn EntityStore>,
    working_set: Arc<DashMap<Uuid, ClaimState>>,
    max_processing_secs: u64,
}

impl WorkerPoolProcessor {
    /// Create a processor over `store`. Simulated per-entity work lasts
    /// between one second and `max_processing_secs`.
    pub fn new(store: Arc<dyn EntityStore>, max_processing_secs: u64) -> Self {
        Self {
            store,
            working_set: Arc::new(DashMap::new()),
            max_processing_secs: max_processing_secs.max(1),
        }
    }

    /// Number of entities currently claimed or confirmed.
    pub fn working_set_len(&self) -> usize {
        self.working_set.len()
    }

    /// Claim state for an entity, if it is in the working set.
    pub fn claim_state(&self, id: Uuid) -> Option<ClaimState> {
        self.working_set.get(&id).map(|e| *e.value())
    }

    /// Run one poll tick: fetch the pending snapshot and claim every
    /// entity not already in the working set, dispatching a processing
    /// task per claim.
    ///
    /// Skipped entirely while any claim is still unconfirmed. Store
    /// failures are logged and swallowed; the tick never updates entity
    /// status itself.
    pub async fn run_tick(&self) -> TickOutcome {
        if self
            .working_set
            .iter()
            .any(|e| *e.value() == ClaimState::Claimed)
        {
            info!("no entities added; unconfirmed claims outstanding");
            return TickOutcome::Throttled;
        }

        let pending = match self.store.list_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                error!(error = %e, "failed to fetch pending entities");
                return TickOutcome::Claimed(0);
            }
        };

        let mut claimed = 0;
        for entity in pending {
            match self.working_set.entry(entity.id) {
                Entry::Occupied(_) => {
                    warn!(id = %entity.id, "entity already claimed; skipping");
                }
                Entry::Vacant(slot) => {
                    slot.insert(ClaimState::Claimed);
                    claimed += 1;

                    let store = Arc::clone(&self.store);
                    let working_set = Arc::clone(&self.working_set);
                    let max_secs = self.max_processing_secs;
                    tokio::spawn(async move {
                        process_entity(store, working_set, entity, max_secs).await;
                    });
                }
            }
        }

        info!(claimed, "added entities to the working set");
        TickOutcome::Claimed(claimed)
    }
}

#[async_trait]
impl PollHandler for WorkerPoolProcessor {
    async fn retrieve(&self) {
        self.run_tick().await;
    }
}

/// Drive one claimed entity to a terminal status.
///
/// Any error along the way marks the entity failed and is otherwise
/// swallowed; nothing here can take down the poll loop or sibling tasks.
/// The working-set entry is only released on the success path.
async fn process_entity(
    store: Arc<dyn EntityStore>,
    working_set: Arc<DashMap<Uuid, ClaimState>>,
    entity: Entity,
    max_processing_secs: u64,
) {
    let id = entity.id;
    if let Err(e) = drive_entity(&store, &working_set, id, max_processing_secs).await {
        error!(id = %id, error = %e, "error processing entity");
        if let Err(e) = store.update_status(id, Status::Failed).await {
            error!(id = %id, error = %e, "failed to mark entity failed");
        }
    }
}

async fn drive_entity(
    store: &Arc<dyn EntityStore>,
    working_set: &DashMap<Uuid, ClaimState>,
    id: Uuid,
    max_processing_secs: u64,
) -> Result<(), StoreError> {
    store.update_status(id, Status::Processing).await?;

    // Acknowledge the claim: Claimed → Confirmed. A failed swap marks
    // the entity failed defensively, but processing still proceeds, so
    // the last status this task writes is Complete.
    let confirmed = match working_set.get_mut(&id) {
        Some(mut entry) if *entry == ClaimState::Claimed => {
            *entry = ClaimState::Confirmed;
            true
        }
        _ => false,
    };
    if !confirmed {
        warn!(id = %id, "claim confirmation failed; marking entity failed");
        store.update_status(id, Status::Failed).await?;
    }

    debug!(id = %id, "processing entity");
    let secs = rand::thread_rng().gen_range(1..=max_processing_secs);
    sleep(Duration::from_secs(secs)).await;

    store.update_status(id, Status::Complete).await?;

    if working_set.remove(&id).is_none() {
        warn!(id = %id, "working-set entry already absent on removal");
    }

    debug!(id = %id, remaining = working_set.len(), "processing complete");
    Ok(())
}
