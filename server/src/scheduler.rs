//! Fixed-interval trigger for ingestion cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::ingest::{IngestOutcome, Ingestor};

/// Drives the ingestor once at start and then every `interval`.
pub struct Scheduler {
    ingestor: Arc<Ingestor>,
    interval: Duration,
}

impl Scheduler {
    /// Create a new scheduler.
    pub fn new(ingestor: Arc<Ingestor>, interval: Duration) -> Self {
        Self { ingestor, interval }
    }

    /// Run until a shutdown signal arrives or its sender is dropped.
    ///
    /// A cycle in progress is allowed to finish before the loop exits.
    /// Ticks missed while a cycle overruns are skipped, not replayed.
    pub async fn run(&self, mut shutdown: mpsc::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs_f64(), "Scheduler started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    match self.ingestor.run_once().await {
                        Ok(IngestOutcome::Stored(batch)) => {
                            debug!(batch_id = %batch.id, "Scheduled cycle stored a batch");
                        }
                        Ok(outcome) => {
                            debug!(?outcome, "Scheduled cycle wrote nothing");
                        }
                        Err(e) => {
                            error!(
                                error = %e,
                                code = e.error_code(),
                                retryable = e.is_retryable(),
                                "Ingestion cycle failed, waiting for next tick"
                            );
                        }
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}
