use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

/// Computes the next entitlement period for a user. A prior active period
/// that has not yet expired is stacked onto, never overlapped; otherwise the
/// new period starts at `now`.
pub fn next_entitlement_period(
    prior_ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    duration_days: i32,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let starts_at = match prior_ends_at {
        Some(ends_at) if ends_at > now => ends_at,
        _ => now,
    };

    let ends_at = starts_at
        .checked_add_signed(Duration::days(duration_days.into()))
        .context("failed to compute subscription end date")?;

    Ok((starts_at, ends_at))
}
