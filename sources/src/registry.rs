//! Built-in source definitions and loading of custom ones.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::adapter::{HttpQuoteSource, QuoteSource};
use crate::error::{SourceError, SourceResult};

/// Static configuration of one HTTP source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Label stored as the quote's `source`.
    pub label: String,
    /// Endpoint fetched with a single GET.
    pub url: String,
    /// JSON pointer to the buy price, e.g. `/blue/value_buy`.
    pub buy_field: String,
    /// JSON pointer to the sell price.
    pub sell_field: String,
}

impl SourceDefinition {
    /// Create a new definition.
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        buy_field: impl Into<String>,
        sell_field: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            buy_field: buy_field.into(),
            sell_field: sell_field.into(),
        }
    }

    /// Validate the definition.
    pub fn validate(&self) -> SourceResult<()> {
        let invalid = |reason: &str| SourceError::InvalidDefinition {
            label: self.label.clone(),
            reason: reason.to_string(),
        };

        if self.label.trim().is_empty() {
            return Err(invalid("label cannot be empty"));
        }

        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(invalid("url must be http or https"));
        }

        if !self.buy_field.starts_with('/') || !self.sell_field.starts_with('/') {
            return Err(invalid("price fields must be JSON pointers starting with '/'"));
        }

        Ok(())
    }
}

/// The three blue-dollar sources collected by default.
pub fn default_sources() -> Vec<SourceDefinition> {
    vec![
        // cronista.com, served through the bluelytics API
        SourceDefinition::new(
            "https://www.cronista.com/MercadosOnline/moneda.html?id=ARSB",
            "https://api.bluelytics.com.ar/v2/latest",
            "/blue/value_buy",
            "/blue/value_sell",
        ),
        // dolarhoy.com, served through DolarAPI
        SourceDefinition::new(
            "https://www.dolarhoy.com",
            "https://dolarapi.com/v1/dolares/blue",
            "/compra",
            "/venta",
        ),
        // ambito.com, served through DolarAPI
        SourceDefinition::new(
            "https://www.ambito.com/contenidos/dolar.html",
            "https://dolarapi.com/v1/ambito/dolares/blue",
            "/compra",
            "/venta",
        ),
    ]
}

/// Load definitions from a JSON array file, replacing the defaults.
pub fn load_definitions(path: &Path) -> SourceResult<Vec<SourceDefinition>> {
    let label = path.display().to_string();

    let raw = std::fs::read_to_string(path).map_err(|e| SourceError::InvalidDefinition {
        label: label.clone(),
        reason: e.to_string(),
    })?;

    let definitions: Vec<SourceDefinition> =
        serde_json::from_str(&raw).map_err(|e| SourceError::InvalidDefinition {
            label: label.clone(),
            reason: e.to_string(),
        })?;

    if definitions.is_empty() {
        return Err(SourceError::InvalidDefinition {
            label,
            reason: "at least one source is required".to_string(),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for definition in &definitions {
        definition.validate()?;
        if !seen.insert(definition.label.as_str()) {
            return Err(SourceError::InvalidDefinition {
                label: definition.label.clone(),
                reason: "duplicate label".to_string(),
            });
        }
    }

    info!(path = %label, count = definitions.len(), "Loaded source definitions");
    Ok(definitions)
}

/// Build HTTP sources sharing one client.
pub fn build_sources(
    definitions: Vec<SourceDefinition>,
    client: reqwest::Client,
    timeout: Duration,
) -> Vec<Arc<dyn QuoteSource>> {
    definitions
        .into_iter()
        .map(|definition| {
            Arc::new(HttpQuoteSource::new(definition, client.clone(), timeout))
                as Arc<dyn QuoteSource>
        })
        .collect()
}
