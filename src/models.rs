use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{Outcome, Status};

/// One measurement found in a document and classified against its band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedValue {
    pub test: String,
    pub value: f64,
    pub unit: String,
    pub range_low: f64,
    pub range_high: f64,
    /// `"{low} - {high} {unit}"` as shown to the user.
    pub range: String,
    pub status_short: Status,
    pub status_message: String,
}

/// One stored document's worth of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub id: Uuid,
    pub user_id: String,
    pub document_label: String,
    pub total_tests: i32,
    pub normal_count: i32,
    pub abnormal_count: i32,
    pub summary_message: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted form of an [`ExtractedValue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: String,
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub reference_low: f64,
    pub reference_high: f64,
    pub status: Status,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionWithResults {
    pub session: TestSession,
    pub results: Vec<TestResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBand {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    NoData,
    InsufficientData,
    Stable,
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub test_name: String,
    pub trend: Trend,
    pub trend_message: String,
    pub improvement_context: Option<Outcome>,
    pub latest_value: Option<f64>,
    pub previous_value: Option<f64>,
    pub change_absolute: Option<f64>,
    pub change_percent: Option<f64>,
    pub series: Vec<TrendPoint>,
    pub unit: Option<String>,
    pub reference_range: Option<ReferenceBand>,
    pub measurement_count: usize,
    pub window_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Stable,
    Increased,
    Decreased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallTrend {
    Improving,
    Concerning,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDiff {
    pub test_name: String,
    pub latest_value: f64,
    pub previous_value: f64,
    pub change: f64,
    pub percent_change: f64,
    pub change_type: ChangeType,
    /// `None` for stable changes and for tests without a preferred direction.
    pub outcome: Option<Outcome>,
    pub unit: String,
    pub latest_status: Status,
    pub previous_status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub has_comparison: bool,
    pub summary: String,
    pub latest_date: Option<DateTime<Utc>>,
    pub previous_date: Option<DateTime<Utc>>,
    pub days_between: i64,
    pub overall_trend: Option<OverallTrend>,
    pub improvements: usize,
    pub deteriorations: usize,
    pub stable: usize,
    pub total_compared: usize,
    pub comparisons: Vec<TestDiff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub has_data: bool,
    pub session_count: usize,
    pub total_tests: usize,
    pub unique_test_types: usize,
    pub tracking_days: i64,
    pub first_test_date: Option<DateTime<Utc>>,
    pub latest_test_date: Option<DateTime<Utc>>,
}

impl UserStats {
    pub fn empty() -> Self {
        Self {
            has_data: false,
            session_count: 0,
            total_tests: 0,
            unique_test_types: 0,
            tracking_days: 0,
            first_test_date: None,
            latest_test_date: None,
        }
    }
}
