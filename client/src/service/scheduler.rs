//! Background tasks - the periodic pass timer and the connectivity listener.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::SyncService;
use crate::connectivity::Connectivity;

/// Handle to the background tasks started by [`SyncService::start`].
///
/// Dropping the handle also stops the tasks, without waiting for them.
#[derive(Debug)]
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHandle {
    /// Stop the background tasks and wait for them to exit.
    ///
    /// A pass that is already running finishes first.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Sync task ended abnormally");
            }
        }
        tracing::info!("Sync service stopped");
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

impl SyncService {
    /// Spawn the periodic pass timer and the connectivity listener.
    ///
    /// Every `sync_interval_ms` a pass runs unless sync is paused or the API
    /// is unreachable. When connectivity becomes reachable, sync resumes and
    /// a pass runs right away; when it is lost, sync pauses. If the API is
    /// already reachable, a pass starts immediately so a restored queue
    /// does not wait for the first tick.
    pub fn start(&self) -> SyncHandle {
        let (shutdown, shutdown_rx) = watch::channel(false);

        // Subscribe before spawning so no transition is missed.
        let mut connectivity = self.inner.connectivity.subscribe();
        let initial = *connectivity.borrow_and_update();

        let scheduler = tokio::spawn(run_scheduler(self.clone(), shutdown_rx.clone()));
        let listener = tokio::spawn(run_connectivity_listener(
            self.clone(),
            connectivity,
            initial,
            shutdown_rx,
        ));

        tracing::info!(
            interval_ms = self.inner.config.sync_interval_ms,
            connectivity = ?initial,
            "Sync service started"
        );

        if initial.is_reachable() {
            self.spawn_pass();
        }

        SyncHandle {
            shutdown,
            tasks: vec![scheduler, listener],
        }
    }
}

async fn run_scheduler(service: SyncService, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_millis(service.inner.config.sync_interval_ms);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                if !service.is_active() {
                    tracing::trace!("Sync inactive, skipping scheduled pass");
                    continue;
                }
                service.process_queue().await;
            }
        }
    }
}

async fn run_connectivity_listener(
    service: SyncService,
    mut connectivity: watch::Receiver<Connectivity>,
    mut previous: Connectivity,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *connectivity.borrow_and_update();
                if current == previous {
                    continue;
                }
                tracing::info!(from = ?previous, to = ?current, "Connectivity changed");

                if current.is_reachable() {
                    service.resume_sync();
                    service.spawn_pass();
                } else {
                    service.pause_sync();
                }
                previous = current;
            }
        }
    }
}
