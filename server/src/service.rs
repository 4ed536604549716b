//! Quote service: owns the ingestion scheduler and the read path state.

use std::sync::Arc;

use axum::Router;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use quotefeed_common::Result;
use quotefeed_sources::FetchCoordinator;
use quotefeed_store::BatchStore;

use crate::api::{self, AppState};
use crate::config::ServerConfig;
use crate::ingest::Ingestor;
use crate::metrics::{Metrics, SharedMetrics};
use crate::scheduler::Scheduler;
use crate::state::ServiceState;

/// The service tying sources, store, scheduler and HTTP surface together.
pub struct QuoteService {
    /// Configuration.
    config: ServerConfig,
    /// Current lifecycle state.
    state: Arc<RwLock<ServiceState>>,
    /// Batch store shared by the writer and the readers.
    store: Arc<dyn BatchStore>,
    /// Ingestion cycle runner.
    ingestor: Arc<Ingestor>,
    /// Ingestion metrics.
    metrics: SharedMetrics,
    /// Shutdown signal sender.
    shutdown_tx: mpsc::Sender<()>,
    /// Shutdown signal receiver, handed to the scheduler on start.
    shutdown_rx: Mutex<Option<mpsc::Receiver<()>>>,
    /// Running scheduler task.
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
}

impl QuoteService {
    /// Create a new service. Nothing runs until [`start`](Self::start).
    pub fn new(
        config: ServerConfig,
        coordinator: FetchCoordinator,
        store: Arc<dyn BatchStore>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let metrics = Arc::new(Metrics::new());
        let ingestor = Arc::new(Ingestor::new(coordinator, store.clone(), metrics.clone()));

        Self {
            config,
            state: Arc::new(RwLock::new(ServiceState::Starting)),
            store,
            ingestor,
            metrics,
            shutdown_tx,
            shutdown_rx: Mutex::new(Some(shutdown_rx)),
            scheduler_task: Mutex::new(None),
        }
    }

    /// Start the ingestion scheduler. The first cycle runs immediately.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let shutdown_rx = match self.shutdown_rx.lock().take() {
            Some(rx) => rx,
            None => {
                warn!("Quote service already started");
                return Ok(());
            }
        };

        let scheduler = Scheduler::new(self.ingestor.clone(), self.config.ingest.fetch_interval);
        let task = tokio::spawn(async move {
            scheduler.run(shutdown_rx).await;
        });
        *self.scheduler_task.lock() = Some(task);

        *self.state.write() = ServiceState::Running;

        info!(
            interval_secs = self.config.ingest.fetch_interval.as_secs(),
            "Quote service started"
        );
        Ok(())
    }

    /// Stop the scheduler, letting a cycle in progress finish.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping quote service");

        *self.state.write() = ServiceState::ShuttingDown;

        let _ = self.shutdown_tx.send(()).await;

        let task = self.scheduler_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Scheduler task ended abnormally");
            }
        }

        *self.state.write() = ServiceState::Stopped;

        info!("Quote service stopped");
        Ok(())
    }

    /// HTTP router serving the read path.
    pub fn router(&self) -> Router {
        api::router(AppState {
            store: self.store.clone(),
            metrics: self.metrics.clone(),
            state: self.state.clone(),
        })
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Get the ingestion metrics.
    pub fn metrics(&self) -> SharedMetrics {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotefeed_sources::MockQuoteSource;
    use quotefeed_store::MemoryBatchStore;
    use std::time::Duration;

    fn create_test_service(store: Arc<dyn BatchStore>) -> QuoteService {
        let coordinator = FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::quoting("a", 900.0, 905.0)),
            Arc::new(MockQuoteSource::quoting("b", 902.0, 906.0)),
            Arc::new(MockQuoteSource::new("c")),
        ]);
        QuoteService::new(ServerConfig::default(), coordinator, store)
    }

    #[tokio::test]
    async fn test_service_creation() {
        let service = create_test_service(Arc::new(MemoryBatchStore::new()));

        assert_eq!(service.state(), ServiceState::Starting);
        assert_eq!(service.metrics().snapshot().cycles_total, 0);
    }

    #[tokio::test]
    async fn test_service_start_stop() {
        let store = Arc::new(MemoryBatchStore::new());
        let service = create_test_service(store.clone());

        service.start().await.unwrap();
        assert_eq!(service.state(), ServiceState::Running);

        tokio::time::sleep(Duration::from_millis(100)).await;
        service.stop().await.unwrap();
        assert_eq!(service.state(), ServiceState::Stopped);

        // The first cycle runs at start.
        let batch = store.latest_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(service.metrics().snapshot().cycles_stored, 1);
    }

    #[tokio::test]
    async fn test_double_start_is_harmless() {
        let service = create_test_service(Arc::new(MemoryBatchStore::new()));

        service.start().await.unwrap();
        service.start().await.unwrap();
        service.stop().await.unwrap();

        assert_eq!(service.state(), ServiceState::Stopped);
    }
}
