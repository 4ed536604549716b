//! One ingestion cycle: fetch from every source, then commit a batch.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use quotefeed_common::{Batch, Result};
use quotefeed_sources::FetchCoordinator;
use quotefeed_store::BatchStore;

use crate::metrics::SharedMetrics;

/// Result of a completed ingestion cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// A batch was committed.
    Stored(Batch),
    /// Every source failed; nothing was written.
    Skipped { failed_sources: usize },
    /// Another cycle was still running; this trigger did nothing.
    Busy,
}

/// Runs ingestion cycles against one store.
pub struct Ingestor {
    coordinator: FetchCoordinator,
    store: Arc<dyn BatchStore>,
    metrics: SharedMetrics,
    cycle_guard: Mutex<()>,
}

impl Ingestor {
    /// Create a new ingestor.
    pub fn new(
        coordinator: FetchCoordinator,
        store: Arc<dyn BatchStore>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            coordinator,
            store,
            metrics,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Get the store batches are written to.
    pub fn store(&self) -> &Arc<dyn BatchStore> {
        &self.store
    }

    /// Run one cycle.
    ///
    /// A store failure is returned as an error; the caller is expected to
    /// carry on with the next scheduled cycle.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<IngestOutcome> {
        let _guard = match self.cycle_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("Previous ingestion cycle still running, skipping trigger");
                self.metrics.cycle_overlapped();
                return Ok(IngestOutcome::Busy);
            }
        };

        self.metrics.cycle_started();

        let report = self.coordinator.run_cycle().await;
        self.metrics.sources_failed(report.failures.len());

        if report.is_empty() {
            warn!(
                attempted = report.attempted(),
                "No quotes fetched, skipping batch write"
            );
            self.metrics.cycle_skipped();
            return Ok(IngestOutcome::Skipped {
                failed_sources: report.failures.len(),
            });
        }

        match self.store.append_batch(&report.quotes).await {
            Ok(batch) => {
                self.metrics.batch_stored(batch.len());
                info!(
                    batch_id = %batch.id,
                    quotes = batch.len(),
                    failed_sources = report.failures.len(),
                    "Stored new batch"
                );
                Ok(IngestOutcome::Stored(batch))
            }
            Err(e) => {
                self.metrics.store_failed();
                error!(
                    error = %e,
                    quotes = report.quotes.len(),
                    "Failed to store batch, data for this cycle is lost"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use async_trait::async_trait;
    use quotefeed_common::{QuoteFeedError, Quote};
    use quotefeed_sources::MockQuoteSource;
    use quotefeed_store::{MemoryBatchStore, StoreError, StoreResult};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Memory store whose writes fail while `failing` is set.
    pub(crate) struct FlakyStore {
        pub(crate) inner: MemoryBatchStore,
        pub(crate) failing: AtomicBool,
    }

    impl FlakyStore {
        pub(crate) fn new(failing: bool) -> Self {
            Self {
                inner: MemoryBatchStore::new(),
                failing: AtomicBool::new(failing),
            }
        }
    }

    #[async_trait]
    impl BatchStore for FlakyStore {
        async fn append_batch(&self, quotes: &[Quote]) -> StoreResult<Batch> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Corrupt("disk unavailable".to_string()));
            }
            self.inner.append_batch(quotes).await
        }

        async fn latest_batch(&self) -> StoreResult<Option<Batch>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Corrupt("disk unavailable".to_string()));
            }
            self.inner.latest_batch().await
        }

        async fn batch_count(&self) -> StoreResult<u64> {
            self.inner.batch_count().await
        }
    }

    fn scenario_coordinator() -> FetchCoordinator {
        FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::quoting("a", 900.0, 905.0)),
            Arc::new(MockQuoteSource::quoting("b", 902.0, 906.0)),
            Arc::new(MockQuoteSource::new("c")),
        ])
    }

    #[tokio::test]
    async fn test_partial_failure_stores_batch() {
        let store = Arc::new(MemoryBatchStore::new());
        let metrics = Arc::new(Metrics::new());
        let ingestor = Ingestor::new(scenario_coordinator(), store.clone(), metrics.clone());

        let outcome = ingestor.run_once().await.unwrap();

        let batch = match outcome {
            IngestOutcome::Stored(batch) => batch,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(batch.len(), 2);
        assert_eq!(store.latest_batch().await.unwrap(), Some(batch));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cycles_stored, 1);
        assert_eq!(snapshot.source_failures, 1);
        assert_eq!(snapshot.quotes_stored, 2);
    }

    #[tokio::test]
    async fn test_all_sources_failing_writes_nothing() {
        let store = Arc::new(MemoryBatchStore::new());
        let previous = store
            .append_batch(&[Quote::new("a", 900.0, 905.0).unwrap()])
            .await
            .unwrap();

        let coordinator = FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::new("a")),
            Arc::new(MockQuoteSource::new("b")),
        ]);
        let ingestor = Ingestor::new(coordinator, store.clone(), Arc::new(Metrics::new()));

        let outcome = ingestor.run_once().await.unwrap();

        assert_eq!(outcome, IngestOutcome::Skipped { failed_sources: 2 });
        assert_eq!(store.batch_count().await.unwrap(), 1);
        assert_eq!(store.latest_batch().await.unwrap(), Some(previous));
    }

    #[tokio::test]
    async fn test_store_failure_then_recovery() {
        let store = Arc::new(FlakyStore::new(true));
        let metrics = Arc::new(Metrics::new());
        let ingestor = Ingestor::new(scenario_coordinator(), store.clone(), metrics.clone());

        let err = ingestor.run_once().await.unwrap_err();
        assert!(matches!(err, QuoteFeedError::StoreError(_)));
        assert!(err.is_retryable());

        store.failing.store(false, Ordering::SeqCst);
        let outcome = ingestor.run_once().await.unwrap();

        assert!(matches!(outcome, IngestOutcome::Stored(_)));
        assert_eq!(metrics.snapshot().store_failures, 1);
        assert_eq!(metrics.snapshot().cycles_stored, 1);
    }

    #[tokio::test]
    async fn test_overlapping_cycle_is_rejected() {
        let slow = Arc::new(
            MockQuoteSource::quoting("slow", 900.0, 905.0).with_delay(Duration::from_millis(300)),
        );
        let store = Arc::new(MemoryBatchStore::new());
        let metrics = Arc::new(Metrics::new());
        let ingestor = Arc::new(Ingestor::new(
            FetchCoordinator::new(vec![slow]),
            store.clone(),
            metrics.clone(),
        ));

        let first = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { ingestor.run_once().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = ingestor.run_once().await.unwrap();

        assert_eq!(second, IngestOutcome::Busy);
        assert!(matches!(first.await.unwrap().unwrap(), IngestOutcome::Stored(_)));
        assert_eq!(store.batch_count().await.unwrap(), 1);
        assert_eq!(metrics.snapshot().cycles_overlapped, 1);
    }
}
