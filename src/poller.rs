//! Generic poll loop.
//!
//! [`Poller`] runs a dedicated background task that waits out a fixed
//! interval and invokes a [`PollHandler`] on every tick. Cancellation is
//! cooperative: [`Poller::stop`] signals the loop and waits for it to
//! observe the signal and exit. Work dispatched *by* the handler is not
//! tracked here.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::ProcessorError;

/// The retrieval step invoked on every poll tick.
///
/// Implementations must never panic; a tick that fails internally should
/// log and return so the loop continues.
#[async_trait]
pub trait PollHandler: Send + Sync + 'static {
    async fn retrieve(&self);
}

/// Fixed-interval poll loop over a pluggable retrieval step.
pub struct Poller {
    handler: Arc<dyn PollHandler>,
    interval: Duration,
    running: Mutex<Option<RunningLoop>>,
}

struct RunningLoop {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Create a poller that invokes `handler` once per `interval`.
    ///
    /// A zero interval is rejected.
    pub fn new(handler: Arc<dyn PollHandler>, interval: Duration) -> Result<Self, ProcessorError> {
        if interval.is_zero() {
            return Err(ProcessorError::InvalidInterval);
        }
        Ok(Self {
            handler,
            interval,
            running: Mutex::new(None),
        })
    }

    /// Spawn the poll loop and return immediately.
    ///
    /// The first tick fires only after one full interval has elapsed.
    /// Calling this while the loop is already running is rejected.
    pub fn start(&self) -> Result<(), ProcessorError> {
        let mut slot = self.running.lock().unwrap();
        if slot.is_some() {
            return Err(ProcessorError::AlreadyRunning);
        }

        info!(interval_secs = self.interval.as_secs(), "starting poll loop");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handler = Arc::clone(&self.handler);
        let task = tokio::spawn(poll_loop(handler, self.interval, shutdown_rx));
        *slot = Some(RunningLoop { shutdown_tx, task });
        Ok(())
    }

    /// Signal cancellation and wait for the loop to exit.
    ///
    /// Only the loop itself is awaited; processing tasks already
    /// dispatched by the handler keep running unobserved.
    pub async fn stop(&self) -> Result<(), ProcessorError> {
        let running = self
            .running
            .lock()
            .unwrap()
            .take()
            .ok_or(ProcessorError::NotRunning)?;

        info!("stopping poll loop");
        let _ = running.shutdown_tx.send(true);
        let _ = running.task.await;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().unwrap().is_some()
    }
}

async fn poll_loop(
    handler: Arc<dyn PollHandler>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_rx.changed() => {
                debug!("poll loop observed cancellation");
                return;
            }
        }
        handler.retrieve().await;
    }
}
