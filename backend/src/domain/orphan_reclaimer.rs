//! Background sweep that deletes uploaded files no student refers to.
//!
//! The sweep runs once at startup and then on a fixed interval. Files
//! younger than the configured minimum age are kept, so an upload whose
//! record has not been committed yet is never swept.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::student_service::StudentService;

#[derive(Clone)]
pub struct OrphanReclaimer {
    student_service: StudentService,
    interval: Duration,
    min_age: Duration,
}

impl OrphanReclaimer {
    pub fn new(student_service: StudentService, interval: Duration, min_age: Duration) -> Self {
        Self {
            student_service,
            interval,
            min_age,
        }
    }

    /// Run a single sweep and return the names of the deleted files
    pub async fn sweep_once(&self) -> Vec<String> {
        let live_refs = self.student_service.live_image_refs().await;
        debug!("Sweeping uploads against {} live references", live_refs.len());

        match self
            .student_service
            .uploads()
            .reclaim_orphans(&live_refs, self.min_age)
            .await
        {
            Ok(reclaimed) => {
                if !reclaimed.is_empty() {
                    info!("Reclaimed {} orphaned uploads", reclaimed.len());
                }
                reclaimed
            }
            Err(e) => {
                warn!("Orphan sweep failed: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Start sweeping in a background task. The first sweep runs
    /// immediately; sweeps never overlap.
    pub fn spawn(self) -> ReclaimerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                "Orphan reclaimer started (interval {:?}, min age {:?})",
                self.interval, self.min_age
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        self.sweep_once().await;
                    }
                }
            }

            info!("Orphan reclaimer stopped");
        });

        ReclaimerHandle { shutdown_tx, task }
    }
}

/// Handle to a running reclaimer. Dropping it also stops the task.
#[derive(Debug)]
pub struct ReclaimerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReclaimerHandle {
    /// Stop the reclaimer and wait for an in-flight sweep to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Orphan reclaimer task ended abnormally: {}", e);
        }
    }
}
