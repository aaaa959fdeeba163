// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the format written to `created_at`/`updated_at` columns.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Human-friendly relative time ("Just now", "3 hours ago", "1 day ago").
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = now.signed_duration_since(then).num_hours();

    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{} {} ago", hours, if hours == 1 { "hour" } else { "hours" })
    } else {
        let days = hours / 24;
        format!("{} {} ago", days, if days == 1 { "day" } else { "days" })
    }
}
