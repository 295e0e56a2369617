//! Timestamp and ID helpers
//!
//! All persisted timestamps are `i64` Unix millis; conversion from
//! calendar dates happens at the caller, never in the repository layer.

use chrono::{Duration, Months, Utc};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp `months` calendar months from now (clamped to month end)
pub fn months_from_now_millis(months: u32) -> i64 {
    let now = Utc::now();
    now.checked_add_months(Months::new(months))
        .unwrap_or(now)
        .timestamp_millis()
}

/// Timestamp `days` days from now
pub fn days_from_now_millis(days: i64) -> i64 {
    (Utc::now() + Duration::days(days)).timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Used for every row this service owns (transactions, redemptions,
/// inventory items, catalog entries). Donor IDs come from the external
/// user store and stay opaque strings.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_from_now_is_in_future() {
        assert!(months_from_now_millis(1) > now_millis());
    }

    #[test]
    fn test_days_from_now_is_about_right() {
        let delta = days_from_now_millis(30) - now_millis();
        let thirty_days_ms = 30 * 24 * 3600 * 1000;
        assert!((delta - thirty_days_ms).abs() < 5_000);
    }

    #[test]
    fn test_snowflake_ids_are_positive_and_distinct() {
        let a = snowflake_id();
        let b = snowflake_id();
        assert!(a > 0);
        assert!(b > 0);
        // Same millisecond collisions are possible but vanishingly rare
        // with 12 random bits; distinct timestamps guarantee ordering.
        assert!(a <= i64::pow(2, 53));
        assert!(b <= i64::pow(2, 53));
    }
}
