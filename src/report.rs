use std::fmt::Write;

use crate::classify::Outcome;
use crate::models::{ChangeType, ComparisonReport, TestSession, UserStats};

fn outcome_label(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(Outcome::Favorable) => "improved",
        Some(Outcome::Unfavorable) => "needs attention",
        None => "no preferred direction",
    }
}

/// Render a user's history and latest comparison as markdown.
pub fn build_report(
    user_id: &str,
    stats: &UserStats,
    sessions: &[TestSession],
    comparison: &ComparisonReport,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Lab Results Report");
    let _ = writeln!(output, "Generated for {user_id}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    match (stats.has_data, stats.first_test_date, stats.latest_test_date) {
        (true, Some(first), Some(latest)) => {
            let _ = writeln!(
                output,
                "- {} sessions, {} results across {} test types",
                stats.session_count, stats.total_tests, stats.unique_test_types
            );
            let _ = writeln!(
                output,
                "- Tracking {} days ({} to {})",
                stats.tracking_days,
                first.format("%B %d, %Y"),
                latest.format("%B %d, %Y")
            );
        }
        _ => {
            let _ = writeln!(output, "No sessions recorded yet.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Sessions");

    if sessions.is_empty() {
        let _ = writeln!(output, "No sessions recorded yet.");
    } else {
        for session in sessions {
            let _ = writeln!(
                output,
                "- {} ({}): {} tests, {} abnormal. {}",
                session.created_at.format("%B %d, %Y at %I:%M %p"),
                session.document_label,
                session.total_tests,
                session.abnormal_count,
                session.summary_message
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Comparison");

    if !comparison.has_comparison {
        let _ = writeln!(output, "{}.", comparison.summary);
        return output;
    }

    if let (Some(latest), Some(previous)) = (comparison.latest_date, comparison.previous_date) {
        let _ = writeln!(
            output,
            "{} vs {} ({} days apart)",
            latest.format("%B %d, %Y"),
            previous.format("%B %d, %Y"),
            comparison.days_between
        );
    }
    let _ = writeln!(output, "{}", comparison.summary);
    let _ = writeln!(output);

    for diff in &comparison.comparisons {
        if diff.change_type == ChangeType::Stable {
            let _ = writeln!(
                output,
                "- {}: {} {} (stable, {:+.1}%)",
                diff.test_name, diff.latest_value, diff.unit, diff.percent_change
            );
        } else {
            let _ = writeln!(
                output,
                "- {}: {} -> {} {} ({:+.1}%, {})",
                diff.test_name,
                diff.previous_value,
                diff.latest_value,
                diff.unit,
                diff.percent_change,
                outcome_label(diff.outcome)
            );
        }
    }

    output
}
