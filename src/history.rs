use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{ExtractedValue, SessionWithResults, TestResult, TestSession, UserStats};
use crate::stats;

/// Append-only per-user history of analyzed documents.
///
/// Implementations must make `latest_two_sessions_with_results` a consistent
/// read: both sessions and their results come from the same snapshot.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Store a session and all of its results atomically.
    async fn append_session(
        &self,
        user_id: &str,
        document_label: &str,
        results: &[ExtractedValue],
        summary_message: &str,
    ) -> Result<Uuid, StoreError>;

    /// Most recent first.
    async fn list_sessions(&self, user_id: &str, limit: usize)
        -> Result<Vec<TestSession>, StoreError>;

    /// Oldest first.
    async fn list_results(
        &self,
        user_id: &str,
        test_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TestResult>, StoreError>;

    /// Up to two sessions, most recent first.
    async fn latest_two_sessions_with_results(
        &self,
        user_id: &str,
    ) -> Result<Vec<SessionWithResults>, StoreError>;

    async fn user_stats(&self, user_id: &str) -> Result<UserStats, StoreError>;
}

/// Build the rows for a new session. Every result shares the session's id
/// and timestamp.
pub fn new_session(
    user_id: &str,
    document_label: &str,
    results: &[ExtractedValue],
    summary_message: &str,
    created_at: DateTime<Utc>,
) -> SessionWithResults {
    let session_id = Uuid::new_v4();
    let abnormal_count = results
        .iter()
        .filter(|r| r.status_short.is_abnormal())
        .count();

    let session = TestSession {
        id: session_id,
        user_id: user_id.to_string(),
        document_label: document_label.to_string(),
        total_tests: results.len() as i32,
        normal_count: (results.len() - abnormal_count) as i32,
        abnormal_count: abnormal_count as i32,
        summary_message: summary_message.to_string(),
        created_at,
    };

    let results = results
        .iter()
        .map(|r| TestResult {
            id: Uuid::new_v4(),
            session_id,
            user_id: user_id.to_string(),
            test_name: r.test.clone(),
            value: r.value,
            unit: r.unit.clone(),
            reference_low: r.range_low,
            reference_high: r.range_high,
            status: r.status_short,
            created_at,
        })
        .collect();

    SessionWithResults { session, results }
}

/// Process-local store; each user's history is kept oldest first.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    users: RwLock<HashMap<String, Vec<SessionWithResults>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append with an explicit timestamp; used to replay dated reports.
    pub async fn append_session_at(
        &self,
        user_id: &str,
        document_label: &str,
        results: &[ExtractedValue],
        summary_message: &str,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let record = new_session(user_id, document_label, results, summary_message, created_at);
        let id = record.session.id;

        let mut users = self.users.write().await;
        let history = users.entry(user_id.to_string()).or_default();
        // Keep chronological order even when replaying out of order.
        let position = history.partition_point(|s| s.session.created_at <= created_at);
        history.insert(position, record);
        id
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn append_session(
        &self,
        user_id: &str,
        document_label: &str,
        results: &[ExtractedValue],
        summary_message: &str,
    ) -> Result<Uuid, StoreError> {
        let id = self
            .append_session_at(user_id, document_label, results, summary_message, Utc::now())
            .await;
        tracing::info!(user_id, session_id = %id, tests = results.len(), "stored test session");
        Ok(id)
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TestSession>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|history| {
                history
                    .iter()
                    .rev()
                    .take(limit)
                    .map(|s| s.session.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_results(
        &self,
        user_id: &str,
        test_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TestResult>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|history| {
                history
                    .iter()
                    .flat_map(|s| s.results.iter())
                    .filter(|r| r.test_name == test_name && r.created_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn latest_two_sessions_with_results(
        &self,
        user_id: &str,
    ) -> Result<Vec<SessionWithResults>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|history| history.iter().rev().take(2).cloned().collect())
            .unwrap_or_default())
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserStats, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|history| stats::summarize(history))
            .unwrap_or_else(UserStats::empty))
    }
}
