use chrono::{DateTime, Duration, Utc};

use crate::catalog::ReferenceCatalog;
use crate::classify::{judge_change, Outcome};
use crate::error::{AnalysisError, LabResult};
use crate::history::HistoryStore;
use crate::models::{ReferenceBand, TestResult, Trend, TrendPoint, TrendReport};

/// Changes smaller than this (in percent, either sign) are stable.
pub const STABLE_THRESHOLD_PERCENT: f64 = 5.0;

/// Relative change from `previous` to `latest`; zero when `previous` is zero.
pub fn percent_change(previous: f64, latest: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (latest - previous) / previous * 100.0
    }
}

pub fn is_stable(percent: f64) -> bool {
    percent.abs() < STABLE_THRESHOLD_PERCENT
}

/// Start of a trend window. A month is counted as 30 days.
pub fn cutoff_for_months(window_months: u32) -> DateTime<Utc> {
    Utc::now() - Duration::days(i64::from(window_months) * 30)
}

fn empty_report(test_name: &str, window_months: u32, trend: Trend, message: &str) -> TrendReport {
    TrendReport {
        test_name: test_name.to_string(),
        trend,
        trend_message: message.to_string(),
        improvement_context: None,
        latest_value: None,
        previous_value: None,
        change_absolute: None,
        change_percent: None,
        series: Vec::new(),
        unit: None,
        reference_range: None,
        measurement_count: 0,
        window_months,
    }
}

/// Trend over `results`, which must be ordered oldest first. Only the two
/// most recent readings decide the direction.
pub fn build_trend_report(test_name: &str, window_months: u32, results: &[TestResult]) -> TrendReport {
    let (latest, earlier) = match results.split_last() {
        Some(split) => split,
        None => {
            return empty_report(
                test_name,
                window_months,
                Trend::NoData,
                "No historical data available",
            )
        }
    };

    let series: Vec<TrendPoint> = results
        .iter()
        .map(|r| TrendPoint {
            value: r.value,
            recorded_at: r.created_at,
        })
        .collect();

    let mut report = empty_report(
        test_name,
        window_months,
        Trend::InsufficientData,
        "Need at least 2 data points for trend analysis",
    );
    report.latest_value = Some(latest.value);
    report.unit = Some(results[0].unit.clone());
    report.reference_range = Some(ReferenceBand {
        low: latest.reference_low,
        high: latest.reference_high,
    });
    report.measurement_count = results.len();
    report.series = series;

    let Some(previous) = earlier.last() else {
        return report;
    };

    let change = latest.value - previous.value;
    let percent = percent_change(previous.value, latest.value);

    let (trend, mut message) = if is_stable(percent) {
        (Trend::Stable, format!("Stable (±{:.1}%)", percent.abs()))
    } else if change > 0.0 {
        (Trend::Increasing, format!("Increasing (+{percent:.1}%)"))
    } else {
        (Trend::Decreasing, format!("Decreasing ({percent:.1}%)"))
    };

    let context = match trend {
        Trend::Increasing | Trend::Decreasing => judge_change(test_name, change),
        _ => None,
    };
    match context {
        Some(Outcome::Favorable) => message.push_str(" Good trend"),
        Some(Outcome::Unfavorable) => message.push_str(" Monitor closely"),
        None => {}
    }

    report.trend = trend;
    report.trend_message = message;
    report.improvement_context = context;
    report.previous_value = Some(previous.value);
    report.change_absolute = Some(change);
    report.change_percent = Some(percent);
    report
}

/// Trend for one user's test over the last `window_months`.
pub async fn analyze_trend<S>(
    store: &S,
    catalog: &ReferenceCatalog,
    user_id: &str,
    test_name: &str,
    window_months: u32,
) -> LabResult<TrendReport>
where
    S: HistoryStore + ?Sized,
{
    if !catalog.contains(test_name) {
        return Err(AnalysisError::UnknownTest(test_name.to_string()).into());
    }

    let since = cutoff_for_months(window_months);
    let results = store.list_results(user_id, test_name, since).await?;
    Ok(build_trend_report(test_name, window_months, &results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Status;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn reading(test: &str, value: f64, day: i64) -> TestResult {
        TestResult {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            user_id: "user_a".to_string(),
            test_name: test.to_string(),
            value,
            unit: "mg/dL".to_string(),
            reference_low: 125.0,
            reference_high: 200.0,
            status: Status::Normal,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::days(day),
        }
    }

    #[test]
    fn no_points_is_no_data() {
        let report = build_trend_report("Glucose", 12, &[]);
        assert_eq!(report.trend, Trend::NoData);
        assert_eq!(report.measurement_count, 0);
        assert!(report.latest_value.is_none());
    }

    #[test]
    fn single_point_is_insufficient() {
        let report = build_trend_report("Glucose", 12, &[reading("Glucose", 92.0, 0)]);
        assert_eq!(report.trend, Trend::InsufficientData);
        assert_eq!(report.latest_value, Some(92.0));
        assert!(report.previous_value.is_none());
        assert_eq!(report.unit.as_deref(), Some("mg/dL"));
    }

    #[test]
    fn falling_cholesterol_is_a_good_trend() {
        let results = [
            reading("Total Cholesterol", 220.0, 0),
            reading("Total Cholesterol", 200.0, 60),
        ];
        let report = build_trend_report("Total Cholesterol", 12, &results);
        assert_eq!(report.trend, Trend::Decreasing);
        assert_eq!(report.improvement_context, Some(Outcome::Favorable));
        assert_eq!(report.change_absolute, Some(-20.0));
        assert!((report.change_percent.unwrap() + 9.0909).abs() < 0.001);
        assert_eq!(report.trend_message, "Decreasing (-9.1%) Good trend");
    }

    #[test]
    fn rising_hdl_is_a_good_trend() {
        let results = [reading("HDL", 40.0, 0), reading("HDL", 50.0, 30)];
        let report = build_trend_report("HDL", 12, &results);
        assert_eq!(report.trend, Trend::Increasing);
        assert_eq!(report.improvement_context, Some(Outcome::Favorable));
    }

    #[test]
    fn rising_glucose_needs_monitoring() {
        let results = [reading("Glucose", 90.0, 0), reading("Glucose", 120.0, 30)];
        let report = build_trend_report("Glucose", 12, &results);
        assert_eq!(report.improvement_context, Some(Outcome::Unfavorable));
        assert_eq!(report.trend_message, "Increasing (+33.3%) Monitor closely");
    }

    #[test]
    fn small_changes_are_stable_either_way() {
        for latest in [104.9, 95.1] {
            let results = [reading("Glucose", 100.0, 0), reading("Glucose", latest, 10)];
            let report = build_trend_report("Glucose", 12, &results);
            assert_eq!(report.trend, Trend::Stable, "latest {latest}");
            assert!(report.improvement_context.is_none());
        }
    }

    #[test]
    fn only_the_last_two_points_matter() {
        let results = [
            reading("Glucose", 50.0, 0),
            reading("Glucose", 100.0, 10),
            reading("Glucose", 101.0, 20),
        ];
        let report = build_trend_report("Glucose", 12, &results);
        assert_eq!(report.trend, Trend::Stable);
        assert_eq!(report.previous_value, Some(100.0));
        assert_eq!(report.series.len(), 3);
        assert_eq!(report.measurement_count, 3);
    }

    #[test]
    fn zero_previous_value_is_stable() {
        let results = [reading("CRP", 0.0, 0), reading("CRP", 3.0, 10)];
        let report = build_trend_report("CRP", 12, &results);
        assert_eq!(report.change_percent, Some(0.0));
        assert_eq!(report.trend, Trend::Stable);
        assert_eq!(percent_change(0.0, 42.0), 0.0);
    }

    #[test]
    fn neutral_tests_get_no_context() {
        let results = [reading("TSH", 2.0, 0), reading("TSH", 3.0, 10)];
        let report = build_trend_report("TSH", 12, &results);
        assert_eq!(report.trend, Trend::Increasing);
        assert!(report.improvement_context.is_none());
        assert_eq!(report.trend_message, "Increasing (+50.0%)");
    }

    #[test]
    fn window_is_thirty_days_per_month() {
        let cutoff = cutoff_for_months(2);
        let expected = Utc::now() - Duration::days(60);
        assert!((cutoff - expected).num_seconds().abs() < 5);
    }
}
