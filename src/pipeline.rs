use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::compare::compare_latest_two;
use crate::error::LabResult;
use crate::history::HistoryStore;
use crate::models::{ComparisonReport, ExtractedValue, UserStats};
use crate::panel::{join_segments, summary_message, PanelParser};

/// Everything produced by analyzing one submitted document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub message: String,
    pub total_tests_found: usize,
    pub total_tests_available: usize,
    pub results: Vec<ExtractedValue>,
    pub document_label: String,
    pub session_id: Uuid,
    pub comparison: ComparisonReport,
    pub user_stats: UserStats,
    pub timestamp: DateTime<Utc>,
}

/// Parse the document text, record the session, then compare it with the
/// previous one. Nothing is stored when parsing fails.
pub async fn analyze_document<S, I, T>(
    parser: &PanelParser,
    store: &S,
    user_id: &str,
    document_label: &str,
    segments: I,
) -> LabResult<AnalysisOutcome>
where
    S: HistoryStore + ?Sized,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let text = join_segments(segments)?;
    tracing::info!(document_label, chars = text.len(), "analyzing document");

    let results = parser.parse(&text)?;
    let message = summary_message(&results);

    let session_id = store
        .append_session(user_id, document_label, &results, &message)
        .await?;
    let comparison = compare_latest_two(store, user_id).await?;
    let user_stats = store.user_stats(user_id).await?;

    tracing::info!(
        document_label,
        found = results.len(),
        "analysis complete"
    );

    Ok(AnalysisOutcome {
        message,
        total_tests_found: results.len(),
        total_tests_available: parser.catalog().len(),
        results,
        document_label: document_label.to_string(),
        session_id,
        comparison,
        user_stats,
        timestamp: Utc::now(),
    })
}
