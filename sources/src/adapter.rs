//! Quote source trait and implementations.

use async_trait::async_trait;
use quotefeed_common::Quote;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::registry::SourceDefinition;

/// Trait for upstream quote sources.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Get the source label recorded on every quote it produces.
    fn name(&self) -> &str;

    /// Fetch one quote from the upstream.
    async fn fetch(&self) -> SourceResult<Quote>;
}

/// Source backed by one JSON HTTP endpoint.
///
/// The field mapping in the [`SourceDefinition`] is the only place where
/// upstream schema drift has to be absorbed.
pub struct HttpQuoteSource {
    definition: SourceDefinition,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpQuoteSource {
    /// Create a new HTTP source sharing the given client.
    pub fn new(definition: SourceDefinition, client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            definition,
            client,
            timeout,
        }
    }

    fn request_error(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout {
                source_id: self.definition.label.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            SourceError::Http {
                source_id: self.definition.label.clone(),
                message: err.to_string(),
            }
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> SourceError {
        SourceError::MalformedPayload {
            source_id: self.definition.label.clone(),
            reason: reason.into(),
        }
    }

    /// Read a price at a JSON pointer. Accepts numbers and numeric strings.
    fn extract_price(&self, body: &Value, pointer: &str) -> SourceResult<f64> {
        match body.pointer(pointer) {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| self.malformed(format!("{} is not representable", pointer))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.malformed(format!("{} is not numeric: {:?}", pointer, s))),
            Some(Value::Null) | None => Err(self.malformed(format!("{} is missing", pointer))),
            Some(other) => Err(self.malformed(format!(
                "{} has unexpected type: {}",
                pointer, other
            ))),
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    fn name(&self) -> &str {
        &self.definition.label
    }

    async fn fetch(&self) -> SourceResult<Quote> {
        let response = self
            .client
            .get(&self.definition.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_id: self.definition.label.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.request_error(e))?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| self.malformed(format!("invalid JSON: {}", e)))?;

        let buy_price = self.extract_price(&body, &self.definition.buy_field)?;
        let sell_price = self.extract_price(&body, &self.definition.sell_field)?;

        let quote = Quote::new(self.definition.label.clone(), buy_price, sell_price)
            .map_err(|e| self.malformed(e.to_string()))?;

        debug!(
            source = %quote.source,
            buy_price = quote.buy_price,
            sell_price = quote.sell_price,
            "Got quote from source"
        );

        Ok(quote)
    }
}

/// Mock quote source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockQuoteSource {
    name: String,
    response: parking_lot::Mutex<Option<(f64, f64)>>,
    delay: Option<Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockQuoteSource {
    /// Create a mock that fails until a quote is set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: parking_lot::Mutex::new(None),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a mock that answers with the given prices.
    pub fn quoting(name: impl Into<String>, buy_price: f64, sell_price: f64) -> Self {
        let mock = Self::new(name);
        mock.set_quote(buy_price, sell_price);
        mock
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer subsequent fetches with these prices.
    pub fn set_quote(&self, buy_price: f64, sell_price: f64) {
        *self.response.lock() = Some((buy_price, sell_price));
    }

    /// Fail subsequent fetches.
    pub fn set_failing(&self) {
        *self.response.lock() = None;
    }

    /// Number of fetches observed.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> SourceResult<Quote> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = *self.response.lock();
        match response {
            Some((buy, sell)) => Quote::new(self.name.clone(), buy, sell).map_err(|e| {
                SourceError::MalformedPayload {
                    source_id: self.name.clone(),
                    reason: e.to_string(),
                }
            }),
            None => Err(SourceError::Http {
                source_id: self.name.clone(),
                message: "connection refused".to_string(),
            }),
        }
    }
}
