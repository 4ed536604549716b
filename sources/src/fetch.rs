//! Settle-all fan-out over every registered source.

use futures::future::join_all;
use quotefeed_common::Quote;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::adapter::QuoteSource;
use crate::error::SourceError;

/// A source that produced nothing in a cycle.
#[derive(Debug)]
pub struct SourceFailure {
    /// Label of the failing source.
    pub source_id: String,
    /// Why it failed.
    pub error: SourceError,
}

/// Outcome of one fetch cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Quotes from the sources that succeeded. Order is not significant.
    pub quotes: Vec<Quote>,
    /// One entry per source that failed.
    pub failures: Vec<SourceFailure>,
}

impl CycleReport {
    /// Number of sources invoked.
    pub fn attempted(&self) -> usize {
        self.quotes.len() + self.failures.len()
    }

    /// True when no source succeeded.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Invokes every source concurrently and waits for all of them to settle.
pub struct FetchCoordinator {
    sources: Vec<Arc<dyn QuoteSource>>,
}

impl FetchCoordinator {
    /// Create a coordinator over the given sources.
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        Self { sources }
    }

    /// Register one more source.
    pub fn with_source(mut self, source: Arc<dyn QuoteSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Labels of the registered sources.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Fetch from every source.
    ///
    /// Never fails as a whole: failing sources are reported in
    /// [`CycleReport::failures`] and the remaining quotes are returned.
    /// Latency is bounded by the slowest source, not the sum.
    #[instrument(skip(self), fields(sources = self.sources.len()))]
    pub async fn run_cycle(&self) -> CycleReport {
        let outcomes = join_all(self.sources.iter().map(|source| async move {
            (source.name().to_string(), source.fetch().await)
        }))
        .await;

        let mut report = CycleReport::default();

        for (source_id, outcome) in outcomes {
            match outcome {
                Ok(quote) => {
                    debug!(source = %source_id, "Source settled with a quote");
                    report.quotes.push(quote);
                }
                Err(error) => {
                    warn!(
                        source = %source_id,
                        kind = error.kind(),
                        error = %error,
                        "Source failed to return a quote"
                    );
                    report.failures.push(SourceFailure { source_id, error });
                }
            }
        }

        info!(
            succeeded = report.quotes.len(),
            failed = report.failures.len(),
            "Fetch cycle settled"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockQuoteSource;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_partial_failure_keeps_successes() {
        let failing = Arc::new(MockQuoteSource::new("c"));
        let coordinator = FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::quoting("a", 900.0, 905.0)),
            Arc::new(MockQuoteSource::quoting("b", 902.0, 906.0)),
            failing.clone(),
        ]);

        let report = coordinator.run_cycle().await;

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.quotes.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source_id, "c");
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_sources_fail() {
        let coordinator = FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::new("a")),
            Arc::new(MockQuoteSource::new("b")),
        ]);

        let report = coordinator.run_cycle().await;

        assert!(report.is_empty());
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_no_sources() {
        let coordinator = FetchCoordinator::new(Vec::new());
        assert!(coordinator.is_empty());

        let report = coordinator.run_cycle().await;

        assert_eq!(report.attempted(), 0);
    }

    #[tokio::test]
    async fn test_sources_run_concurrently() {
        let delay = Duration::from_millis(300);
        let coordinator = FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::quoting("a", 900.0, 905.0).with_delay(delay)),
            Arc::new(MockQuoteSource::quoting("b", 901.0, 906.0).with_delay(delay)),
        ])
        .with_source(Arc::new(MockQuoteSource::new("c").with_delay(delay)));

        let started = Instant::now();
        let report = coordinator.run_cycle().await;
        let elapsed = started.elapsed();

        assert_eq!(report.quotes.len(), 2);
        assert!(elapsed < Duration::from_millis(800), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_source_names() {
        let coordinator = FetchCoordinator::new(vec![
            Arc::new(MockQuoteSource::new("a")),
            Arc::new(MockQuoteSource::new("b")),
        ]);
        assert_eq!(coordinator.source_names(), vec!["a", "b"]);
        assert_eq!(coordinator.len(), 2);
    }
}
