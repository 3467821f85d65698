use chrono::{DateTime, Datelike, Utc};

/// Minimum balance required to admit a new generation task.
pub const MIN_CREDIT_FOR_TASK: i32 = 30;

/// Credits charged for one narrated segment, by measured clip duration.
///
/// The schedule is banded, not linear: > 60s costs 45, 45-60s costs 40,
/// 30-44s costs 35, anything shorter costs 30.
pub fn segment_credit_cost(duration_seconds: i64) -> i32 {
    if duration_seconds > 60 {
        45
    } else if duration_seconds >= 45 {
        40
    } else if duration_seconds >= 30 {
        35
    } else {
        30
    }
}

/// Total cost of a task: sum of per-segment costs.
pub fn task_credit_cost(segment_durations: &[i64]) -> i32 {
    segment_durations
        .iter()
        .map(|duration| segment_credit_cost(*duration))
        .sum()
}

/// Whether a monthly grant already happened in the current calendar month.
/// The grant sweep is idempotent per (year, month).
pub fn granted_this_month(last_grant: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_grant {
        Some(last) => last.year() == now.year() && last.month() == now.month(),
        None => false,
    }
}

/// Credits to reclaim before a fresh monthly grant: the prior grant amount,
/// capped at what the user still holds. Never negative.
pub fn monthly_reclaim_amount(prior_grant_amount: i32, current_balance: i32) -> i32 {
    prior_grant_amount.min(current_balance).max(0)
}
