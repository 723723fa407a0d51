use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::classify::Status;
use crate::error::StoreError;
use crate::history::{new_session, HistoryStore};
use crate::models::{ExtractedValue, SessionWithResults, TestResult, TestSession, UserStats};
use crate::stats;

const SESSION_COLUMNS: &str = "id, user_id, document_label, total_tests, normal_count, \
     abnormal_count, summary_message, created_at";

const RESULT_COLUMNS: &str = "id, session_id, user_id, test_name, value, unit, \
     reference_low, reference_high, status, created_at";

/// Postgres-backed history in the `lab_history` schema.
#[derive(Debug, Clone)]
pub struct PgHistory {
    pool: PgPool,
}

impl PgHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn init_db(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn results_for_session(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
    ) -> Result<Vec<TestResult>, StoreError> {
        let query = format!(
            "SELECT {RESULT_COLUMNS} FROM lab_history.test_results \
             WHERE session_id = $1 ORDER BY position"
        );
        let rows = sqlx::query(&query)
            .bind(session_id)
            .fetch_all(&mut **tx)
            .await?;
        rows.iter().map(result_from_row).collect()
    }
}

fn session_from_row(row: &PgRow) -> Result<TestSession, StoreError> {
    Ok(TestSession {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        document_label: row.try_get("document_label")?,
        total_tests: row.try_get("total_tests")?,
        normal_count: row.try_get("normal_count")?,
        abnormal_count: row.try_get("abnormal_count")?,
        summary_message: row.try_get("summary_message")?,
        created_at: row.try_get("created_at")?,
    })
}

fn result_from_row(row: &PgRow) -> Result<TestResult, StoreError> {
    let status: String = row.try_get("status")?;
    let id: Uuid = row.try_get("id")?;
    let status = status
        .parse::<Status>()
        .map_err(|e| StoreError::CorruptRecord(format!("result {id}: {e}")))?;

    Ok(TestResult {
        id,
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        test_name: row.try_get("test_name")?,
        value: row.try_get("value")?,
        unit: row.try_get("unit")?,
        reference_low: row.try_get("reference_low")?,
        reference_high: row.try_get("reference_high")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl HistoryStore for PgHistory {
    async fn append_session(
        &self,
        user_id: &str,
        document_label: &str,
        results: &[ExtractedValue],
        summary_message: &str,
    ) -> Result<Uuid, StoreError> {
        let record = new_session(user_id, document_label, results, summary_message, Utc::now());
        let session = &record.session;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO lab_history.test_sessions
            (id, user_id, document_label, total_tests, normal_count, abnormal_count,
             summary_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id)
        .bind(&session.user_id)
        .bind(&session.document_label)
        .bind(session.total_tests)
        .bind(session.normal_count)
        .bind(session.abnormal_count)
        .bind(&session.summary_message)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, result) in record.results.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO lab_history.test_results
                (id, session_id, user_id, test_name, value, unit, reference_low,
                 reference_high, status, created_at, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(result.id)
            .bind(result.session_id)
            .bind(&result.user_id)
            .bind(&result.test_name)
            .bind(result.value)
            .bind(&result.unit)
            .bind(result.reference_low)
            .bind(result.reference_high)
            .bind(result.status.as_str())
            .bind(result.created_at)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            user_id,
            session_id = %session.id,
            tests = record.results.len(),
            "stored test session"
        );
        Ok(session.id)
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<TestSession>, StoreError> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM lab_history.test_sessions \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(session_from_row).collect()
    }

    async fn list_results(
        &self,
        user_id: &str,
        test_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TestResult>, StoreError> {
        let query = format!(
            "SELECT {RESULT_COLUMNS} FROM lab_history.test_results \
             WHERE user_id = $1 AND test_name = $2 AND created_at >= $3 \
             ORDER BY created_at ASC, position ASC"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(test_name)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(result_from_row).collect()
    }

    async fn latest_two_sessions_with_results(
        &self,
        user_id: &str,
    ) -> Result<Vec<SessionWithResults>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Both sessions and their results must come from one snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM lab_history.test_sessions \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT 2"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session = session_from_row(row)?;
            let results = Self::results_for_session(&mut tx, session.id).await?;
            sessions.push(SessionWithResults { session, results });
        }

        tx.commit().await?;
        Ok(sessions)
    }

    async fn user_stats(&self, user_id: &str) -> Result<UserStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM lab_history.test_sessions WHERE user_id = $1) AS session_count,
                (SELECT MIN(created_at) FROM lab_history.test_sessions WHERE user_id = $1) AS first_at,
                (SELECT MAX(created_at) FROM lab_history.test_sessions WHERE user_id = $1) AS latest_at,
                (SELECT COUNT(*) FROM lab_history.test_results WHERE user_id = $1) AS total_tests,
                (SELECT COUNT(DISTINCT test_name) FROM lab_history.test_results WHERE user_id = $1) AS unique_tests
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let session_count: i64 = row.try_get("session_count")?;
        let total_tests: i64 = row.try_get("total_tests")?;
        let unique_tests: i64 = row.try_get("unique_tests")?;
        let first_at: Option<DateTime<Utc>> = row.try_get("first_at")?;
        let latest_at: Option<DateTime<Utc>> = row.try_get("latest_at")?;

        Ok(stats::from_aggregates(
            session_count.max(0) as usize,
            total_tests.max(0) as usize,
            unique_tests.max(0) as usize,
            first_at,
            latest_at,
        ))
    }
}
