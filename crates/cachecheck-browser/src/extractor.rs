use crate::script::ScriptInjector;
use crate::surface::{ScriptValue, Surface};
use crate::{Error, Result};
use cachecheck_core::{urls, LogRecord};

/// Reads the "found it" logs from a geocache listing page
pub struct LogExtractor;

impl LogExtractor {
    /// Extract the found logs of the listing currently loaded on `surface`.
    ///
    /// Returns an empty list without touching the page when the surface isn't
    /// showing a listing. Records keep the order of the log table.
    pub async fn extract(surface: &dyn Surface) -> Result<Vec<LogRecord>> {
        let url = surface.current_url().await?.unwrap_or_default();
        if !urls::is_listing_page(&url) {
            tracing::debug!("Not a geocache listing, skipping log extraction: {}", url);
            return Ok(Vec::new());
        }

        let value = ScriptInjector::evaluate(surface, ScriptInjector::log_table_script()).await?;
        let records = Self::decode(&value)?;

        tracing::info!("Extracted {} found logs from {}", records.len(), url);
        Ok(records)
    }

    /// Decode the log table script's result and keep only found logs
    pub fn decode(value: &ScriptValue) -> Result<Vec<LogRecord>> {
        let json = value.as_str().ok_or_else(|| {
            Error::Extract(format!("expected a JSON string from the log table, got {:?}", value))
        })?;

        let records: Vec<LogRecord> =
            serde_json::from_str(json).map_err(|e| Error::Extract(e.to_string()))?;

        let total = records.len();
        let found: Vec<LogRecord> = records.into_iter().filter(LogRecord::is_found).collect();
        tracing::debug!("Log table had {} rows, {} found logs", total, found.len());

        Ok(found)
    }
}
