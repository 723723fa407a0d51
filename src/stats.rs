use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{SessionWithResults, UserStats};

/// Build stats from already aggregated counts. `first`/`latest` are the
/// oldest and newest session timestamps.
pub fn from_aggregates(
    session_count: usize,
    total_tests: usize,
    unique_test_types: usize,
    first: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
) -> UserStats {
    let (Some(first), Some(latest)) = (first, latest) else {
        return UserStats::empty();
    };
    if session_count == 0 {
        return UserStats::empty();
    }

    UserStats {
        has_data: true,
        session_count,
        total_tests,
        unique_test_types,
        tracking_days: (latest - first).num_days(),
        first_test_date: Some(first),
        latest_test_date: Some(latest),
    }
}

pub fn summarize(sessions: &[SessionWithResults]) -> UserStats {
    let first = sessions.iter().map(|s| s.session.created_at).min();
    let latest = sessions.iter().map(|s| s.session.created_at).max();
    let total_tests = sessions.iter().map(|s| s.results.len()).sum();
    let unique: HashSet<&str> = sessions
        .iter()
        .flat_map(|s| s.results.iter().map(|r| r.test_name.as_str()))
        .collect();

    from_aggregates(sessions.len(), total_tests, unique.len(), first, latest)
}
