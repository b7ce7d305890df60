//! Throttled worker-pool processing over a polled entity store.
//!
//! The crate periodically discovers entities in a pending state, claims
//! them into an in-flight working set, processes each concurrently, and
//! records terminal outcomes in the store. The poll loop and the claim
//! policy are decoupled: [`poller::Poller`] owns the wait-and-tick
//! skeleton, [`processor::WorkerPoolProcessor`] supplies the
//! claim-and-dispatch step, and [`store::EntityStore`] is the seam for
//! the storage backend.

pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod poller;
pub mod processor;
pub mod store;

pub use entity::{Entity, Status};
pub use error::{ProcessorError, StoreError};
pub use poller::{PollHandler, Poller};
pub use processor::{ClaimState, TickOutcome, WorkerPoolProcessor};
pub use store::{EntityStore, MemoryStore};
