use std::collections::HashMap;

use crate::classify::{judge_change, Outcome};
use crate::error::StoreError;
use crate::history::HistoryStore;
use crate::models::{ChangeType, ComparisonReport, OverallTrend, SessionWithResults, TestDiff, TestResult};
use crate::trend::{is_stable, percent_change};

pub fn no_comparison() -> ComparisonReport {
    ComparisonReport {
        has_comparison: false,
        summary: "Need at least 2 test sessions for comparison".to_string(),
        latest_date: None,
        previous_date: None,
        days_between: 0,
        overall_trend: None,
        improvements: 0,
        deteriorations: 0,
        stable: 0,
        total_compared: 0,
        comparisons: Vec::new(),
    }
}

fn diff(latest: &TestResult, previous: &TestResult) -> TestDiff {
    let change = latest.value - previous.value;
    let percent = percent_change(previous.value, latest.value);
    let change_type = if is_stable(percent) {
        ChangeType::Stable
    } else if change > 0.0 {
        ChangeType::Increased
    } else {
        ChangeType::Decreased
    };
    let outcome = match change_type {
        ChangeType::Stable => None,
        ChangeType::Increased | ChangeType::Decreased => judge_change(&latest.test_name, change),
    };

    TestDiff {
        test_name: latest.test_name.clone(),
        latest_value: latest.value,
        previous_value: previous.value,
        change,
        percent_change: percent,
        change_type,
        outcome,
        unit: latest.unit.clone(),
        latest_status: latest.status,
        previous_status: previous.status,
    }
}

/// Diff every test present in both sessions, largest relative change first.
pub fn compare_sessions(latest: &SessionWithResults, previous: &SessionWithResults) -> ComparisonReport {
    let earlier: HashMap<&str, &TestResult> = previous
        .results
        .iter()
        .map(|r| (r.test_name.as_str(), r))
        .collect();

    let mut comparisons: Vec<TestDiff> = latest
        .results
        .iter()
        .filter_map(|r| earlier.get(r.test_name.as_str()).map(|p| diff(r, p)))
        .collect();

    comparisons.sort_by(|a, b| {
        b.percent_change
            .abs()
            .total_cmp(&a.percent_change.abs())
            .then_with(|| a.test_name.cmp(&b.test_name))
    });

    let mut improvements = 0;
    let mut deteriorations = 0;
    let mut stable = 0;
    for diff in &comparisons {
        if diff.change_type == ChangeType::Stable {
            stable += 1;
            continue;
        }
        // Only a favorable move counts as progress; anything else that moved
        // past the stable band is something to watch.
        if diff.outcome == Some(Outcome::Favorable) {
            improvements += 1;
        } else {
            deteriorations += 1;
        }
    }

    let (overall_trend, summary) = if improvements > deteriorations {
        (
            OverallTrend::Improving,
            format!("Great progress! {improvements} tests improved, {deteriorations} need attention."),
        )
    } else if deteriorations > improvements {
        (
            OverallTrend::Concerning,
            format!("Monitor closely. {deteriorations} tests worsened, {improvements} improved."),
        )
    } else {
        (
            OverallTrend::Mixed,
            format!(
                "Mixed results. {improvements} improved, {deteriorations} worsened, {stable} stable."
            ),
        )
    };

    ComparisonReport {
        has_comparison: true,
        summary,
        latest_date: Some(latest.session.created_at),
        previous_date: Some(previous.session.created_at),
        days_between: (latest.session.created_at - previous.session.created_at).num_days(),
        overall_trend: Some(overall_trend),
        improvements,
        deteriorations,
        stable,
        total_compared: comparisons.len(),
        comparisons,
    }
}

/// Compare a user's two most recent sessions.
pub async fn compare_latest_two<S>(store: &S, user_id: &str) -> Result<ComparisonReport, StoreError>
where
    S: HistoryStore + ?Sized,
{
    let sessions = store.latest_two_sessions_with_results(user_id).await?;
    match sessions.as_slice() {
        [latest, previous, ..] => Ok(compare_sessions(latest, previous)),
        _ => Ok(no_comparison()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Status;
    use crate::history::new_session;
    use crate::models::ExtractedValue;
    use chrono::{Duration, TimeZone, Utc};

    fn value(test: &str, value: f64) -> ExtractedValue {
        ExtractedValue {
            test: test.to_string(),
            value,
            unit: "mg/dL".to_string(),
            range_low: 0.0,
            range_high: 1000.0,
            range: String::new(),
            status_short: Status::Normal,
            status_message: String::new(),
        }
    }

    fn session(values: &[(&str, f64)], day: i64) -> SessionWithResults {
        let at = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap() + Duration::days(day);
        let values: Vec<_> = values.iter().map(|(t, v)| value(t, *v)).collect();
        new_session("user_a", "doc.pdf", &values, "", at)
    }

    #[test]
    fn compares_only_shared_tests() {
        let previous = session(&[("Glucose", 100.0), ("Iron", 60.0)], 0);
        let latest = session(&[("Glucose", 120.0), ("Calcium", 9.0)], 21);
        let report = compare_sessions(&latest, &previous);
        assert!(report.has_comparison);
        assert_eq!(report.total_compared, 1);
        assert_eq!(report.comparisons[0].test_name, "Glucose");
        assert_eq!(report.days_between, 21);
    }

    #[test]
    fn counts_improvements_and_deteriorations() {
        let previous = session(
            &[("Total Cholesterol", 220.0), ("HDL", 40.0), ("Glucose", 90.0), ("LDL", 100.0)],
            0,
        );
        let latest = session(
            &[("Total Cholesterol", 200.0), ("HDL", 48.0), ("Glucose", 91.0), ("LDL", 130.0)],
            30,
        );
        let report = compare_sessions(&latest, &previous);
        assert_eq!(report.improvements, 2);
        assert_eq!(report.deteriorations, 1);
        assert_eq!(report.stable, 1);
        assert_eq!(report.overall_trend, Some(OverallTrend::Improving));
        assert_eq!(
            report.summary,
            "Great progress! 2 tests improved, 1 need attention."
        );
    }

    #[test]
    fn diffs_sorted_by_magnitude() {
        let previous = session(&[("A", 100.0), ("B", 100.0), ("C", 100.0), ("D", 100.0)], 0);
        let latest = session(&[("A", 101.0), ("B", 50.0), ("C", 130.0), ("D", 70.0)], 7);
        let report = compare_sessions(&latest, &previous);
        let order: Vec<_> = report
            .comparisons
            .iter()
            .map(|d| d.test_name.as_str())
            .collect();
        // C and D tie at 30%; names break the tie.
        assert_eq!(order, vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn changes_without_preferred_direction_need_attention() {
        let previous = session(&[("TSH", 2.0), ("Iron", 80.0)], 0);
        let latest = session(&[("TSH", 3.0), ("Iron", 60.0)], 7);
        let report = compare_sessions(&latest, &previous);
        assert_eq!(report.improvements, 0);
        assert_eq!(report.deteriorations, 2);
        assert_eq!(report.stable, 0);
        assert_eq!(report.overall_trend, Some(OverallTrend::Concerning));
        assert!(report.comparisons.iter().all(|d| d.outcome.is_none()));
    }

    #[test]
    fn rising_vitamin_d_is_not_an_improvement() {
        let previous = session(&[("Vitamin D", 20.0)], 0);
        let latest = session(&[("Vitamin D", 40.0)], 30);
        let report = compare_sessions(&latest, &previous);
        assert_eq!(report.comparisons[0].change_type, ChangeType::Increased);
        assert_eq!(report.improvements, 0);
        assert_eq!(report.deteriorations, 1);
        assert_eq!(
            report.summary,
            "Monitor closely. 1 tests worsened, 0 improved."
        );
    }

    #[test]
    fn zero_previous_value_is_stable() {
        let previous = session(&[("CRP", 0.0)], 0);
        let latest = session(&[("CRP", 4.0)], 7);
        let report = compare_sessions(&latest, &previous);
        assert_eq!(report.comparisons[0].percent_change, 0.0);
        assert_eq!(report.comparisons[0].change_type, ChangeType::Stable);
        assert_eq!(report.stable, 1);
    }

    #[test]
    fn swapping_sessions_inverts_direction() {
        let a = session(&[("Glucose", 100.0), ("HDL", 50.0), ("Calcium", 9.0)], 0);
        let b = session(&[("Glucose", 130.0), ("HDL", 40.0), ("Calcium", 9.1)], 10);
        let forward = compare_sessions(&b, &a);
        let backward = compare_sessions(&a, &b);

        for diff in &forward.comparisons {
            let other = backward
                .comparisons
                .iter()
                .find(|d| d.test_name == diff.test_name)
                .unwrap();
            assert_eq!(diff.change, -other.change);
            assert!(diff.percent_change.signum() == -other.percent_change.signum());
            let flipped = match diff.change_type {
                ChangeType::Increased => ChangeType::Decreased,
                ChangeType::Decreased => ChangeType::Increased,
                ChangeType::Stable => ChangeType::Stable,
            };
            assert_eq!(other.change_type, flipped);
        }
        assert_eq!(forward.overall_trend, Some(OverallTrend::Concerning));
        assert_eq!(backward.overall_trend, Some(OverallTrend::Improving));
    }

    #[tokio::test]
    async fn single_session_has_no_comparison() {
        let store = crate::history::InMemoryHistory::new();
        store
            .append_session("user_a", "one.pdf", &[value("Glucose", 90.0)], "")
            .await
            .unwrap();
        let report = compare_latest_two(&store, "user_a").await.unwrap();
        assert!(!report.has_comparison);
        assert!(report.comparisons.is_empty());
    }
}
