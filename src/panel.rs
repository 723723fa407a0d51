use std::path::Path;
use std::sync::Arc;

use crate::aliases::AliasTable;
use crate::catalog::ReferenceCatalog;
use crate::classify::{classify, Status};
use crate::error::{AnalysisError, CatalogError, LabResult};
use crate::extract::ValueExtractor;
use crate::models::ExtractedValue;

/// Join the page texts produced by document conversion into one body.
pub fn join_segments<I, S>(segments: I) -> Result<String, AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.trim().is_empty() {
            continue;
        }
        text.push_str(segment);
        text.push('\n');
    }

    if text.trim().is_empty() {
        return Err(AnalysisError::ExtractionFailed);
    }
    Ok(text)
}

/// Runs extraction and classification for every catalog entry.
#[derive(Debug, Clone)]
pub struct PanelParser {
    catalog: Arc<ReferenceCatalog>,
    extractor: ValueExtractor,
}

impl PanelParser {
    /// Compiles the value matchers for every catalog entry.
    pub fn new(catalog: Arc<ReferenceCatalog>, aliases: &AliasTable) -> Result<Self, CatalogError> {
        let extractor =
            ValueExtractor::build(aliases, catalog.iter().map(|entry| entry.name.as_str()))?;
        tracing::debug!(tests = extractor.len(), "compiled value matchers");
        Ok(Self { catalog, extractor })
    }

    /// Load the catalog at `path` and prepare a parser for it.
    pub fn load(path: &Path, aliases: &AliasTable) -> LabResult<Self> {
        let catalog = ReferenceCatalog::load(path)?;
        Ok(Self::new(Arc::new(catalog), aliases)?)
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Results come back in catalog order. Fails only when the text is blank
    /// or no catalog entry could be found in it.
    pub fn parse(&self, text: &str) -> Result<Vec<ExtractedValue>, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::ExtractionFailed);
        }

        let mut results = Vec::new();

        for reference in self.catalog.iter() {
            let Some(value) = self.extractor.extract(text, &reference.name) else {
                tracing::warn!(test = %reference.name, "could not find value for test");
                continue;
            };
            let (status, message) = classify(&reference.name, value, reference);
            results.push(ExtractedValue {
                test: reference.name.clone(),
                value,
                unit: reference.unit.clone(),
                range_low: reference.low,
                range_high: reference.high,
                range: reference.range_label(),
                status_short: status,
                status_message: message.to_string(),
            });
        }

        tracing::info!(
            found = results.len(),
            available = self.catalog.len(),
            "parsed lab panel"
        );

        if results.is_empty() {
            return Err(AnalysisError::NoMeasurementsFound {
                catalog_size: self.catalog.len(),
            });
        }
        Ok(results)
    }
}

pub fn summary_message(results: &[ExtractedValue]) -> String {
    if !results.iter().any(|r| r.status_short.is_abnormal()) {
        return "All test results are within normal ranges.".to_string();
    }

    let high = results
        .iter()
        .filter(|r| r.status_short == Status::High)
        .count();
    let low = results
        .iter()
        .filter(|r| r.status_short == Status::Low)
        .count();

    let mut parts = Vec::new();
    if high > 0 {
        parts.push(format!("{high} result(s) above normal range"));
    }
    if low > 0 {
        parts.push(format!("{low} result(s) below normal range"));
    }

    let mut message = parts.join(" and ");
    message.push_str(". Consider consulting with a healthcare provider for interpretation.");
    message
}
