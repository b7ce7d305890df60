//! In-memory entity store with a background arrival generator.
//!
//! A fake data layer standing in for a real database. The generator
//! periodically inserts batches of submitted entities to simulate load;
//! it is a demo harness, not part of the store contract.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::entity::{Entity, Status};
use crate::error::{ProcessorError, StoreError};
use crate::store::EntityStore;

/// Concurrent in-memory entity store.
pub struct MemoryStore {
    entities: Arc<DashMap<Uuid, Entity>>,
    generator: Mutex<Option<GeneratorHandle>>,
}

struct GeneratorHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: Arc::new(DashMap::new()),
            generator: Mutex::new(None),
        }
    }

    /// Insert an entity directly (the external-insert path).
    pub fn insert(&self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    /// Current state of an entity, if present.
    pub fn get(&self, id: Uuid) -> Option<Entity> {
        self.entities.get(&id).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Start the background arrival generator.
    ///
    /// The generator is owned by this store instance and runs until
    /// [`stop_generator`](Self::stop_generator) is called or the store is
    /// dropped. Starting a second one while the first is running is
    /// rejected.
    pub fn start_generator(&self, config: GeneratorConfig) -> Result<(), ProcessorError> {
        let mut slot = self.generator.lock().unwrap();
        if slot.is_some() {
            return Err(ProcessorError::AlreadyRunning);
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(generate_arrivals(
            Arc::clone(&self.entities),
            config,
            shutdown_rx,
        ));
        *slot = Some(GeneratorHandle { shutdown_tx, task });
        Ok(())
    }

    /// Stop the arrival generator and wait for it to exit.
    ///
    /// No-op if the generator is not running.
    pub async fn stop_generator(&self) {
        let handle = self.generator.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.shutdown_tx.send(true);
            let _ = handle.task.await;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(handle) = self.generator.lock().unwrap().take() {
            handle.task.abort();
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn update_status(&self, id: Uuid, status: Status) -> Result<(), StoreError> {
        let last_known = self
            .entities
            .get(&id)
            .map(|e| e.status)
            .ok_or(StoreError::NotFound(id))?;

        // Compare-and-swap against the status read above; a concurrent
        // writer landing in between loses us the swap.
        let mut entry = self.entities.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if entry.status != last_known {
            return Err(StoreError::UpdateConflict(id));
        }
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<Entity>, StoreError> {
        Ok(self
            .entities
            .iter()
            .filter(|e| e.status == Status::Submitted)
            .map(|e| e.value().clone())
            .collect())
    }
}

/// Periodically insert a random-sized batch of submitted entities, up to
/// an optional cap on the number of batches. The first batch lands
/// immediately on start.
async fn generate_arrivals(
    entities: Arc<DashMap<Uuid, Entity>>,
    config: GeneratorConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.period_secs));
    let mut batches = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.changed() => {
                debug!("arrival generator shutting down");
                return;
            }
        }

        if config.max_batches.is_some_and(|cap| batches >= cap) {
            info!("max entity batches reached; nothing added");
            continue;
        }

        let count = rand::thread_rng().gen_range(1..=config.max_batch_size);
        for _ in 0..count {
            let entity = Entity::new();
            entities.insert(entity.id, entity);
        }
        batches += 1;
        info!(count, "added new entities to the store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_status_transitions_entity() {
        let store = MemoryStore::new();
        let entity = Entity::new();
        let id = entity.id;
        store.insert(entity);

        store.update_status(id, Status::Processing).await.unwrap();

        let updated = store.get(id).unwrap();
        assert_eq!(updated.status, Status::Processing);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn update_status_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let entity = Entity::new();
        let known = entity.id;
        store.insert(entity);

        let missing = Uuid::new_v4();
        let err = store.update_status(missing, Status::Processing).await;
        assert!(matches!(err, Err(StoreError::NotFound(id)) if id == missing));

        // The store is left unmodified.
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(known).unwrap().status, Status::Submitted);
    }

    #[tokio::test]
    async fn list_pending_filters_by_status() {
        let store = MemoryStore::new();
        let submitted = Entity::new();
        let processing = Entity::new();
        let submitted_id = submitted.id;
        let processing_id = processing.id;
        store.insert(submitted);
        store.insert(processing);
        store
            .update_status(processing_id, Status::Processing)
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, submitted_id);
    }

    #[tokio::test]
    async fn list_pending_is_a_snapshot() {
        let store = MemoryStore::new();
        let entity = Entity::new();
        let id = entity.id;
        store.insert(entity);

        let snapshot = store.list_pending().await.unwrap();
        store.update_status(id, Status::Processing).await.unwrap();

        // The snapshot is detached from later writes.
        assert_eq!(snapshot[0].status, Status::Submitted);
        assert_eq!(store.get(id).unwrap().status, Status::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn generator_inserts_bounded_batches() {
        let store = MemoryStore::new();
        let config = GeneratorConfig {
            period_secs: 30,
            max_batch_size: 5,
            max_batches: None,
        };
        store.start_generator(config).unwrap();

        // First batch is immediate.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_first = store.len();
        assert!((1..=5).contains(&after_first));

        tokio::time::sleep(Duration::from_secs(31)).await;
        let after_second = store.len();
        assert!(after_second > after_first);
        assert!(after_second <= after_first + 5);

        store.stop_generator().await;
    }

    #[tokio::test(start_paused = true)]
    async fn generator_respects_batch_cap() {
        let store = MemoryStore::new();
        let config = GeneratorConfig {
            period_secs: 30,
            max_batch_size: 3,
            max_batches: Some(2),
        };
        store.start_generator(config).unwrap();

        tokio::time::sleep(Duration::from_secs(31)).await;
        let at_cap = store.len();
        assert!((2..=6).contains(&at_cap));

        // Further periods add nothing once the cap is reached.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(store.len(), at_cap);

        store.stop_generator().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_generator_halts_arrivals() {
        let store = MemoryStore::new();
        let config = GeneratorConfig {
            period_secs: 30,
            max_batch_size: 4,
            max_batches: None,
        };
        store.start_generator(config).unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        store.stop_generator().await;
        let at_stop = store.len();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(store.len(), at_stop);
    }

    #[tokio::test]
    async fn generator_double_start_is_rejected() {
        let store = MemoryStore::new();
        let config = GeneratorConfig::default();
        store.start_generator(config.clone()).unwrap();

        let err = store.start_generator(config);
        assert!(matches!(err, Err(ProcessorError::AlreadyRunning)));

        store.stop_generator().await;
    }
}
