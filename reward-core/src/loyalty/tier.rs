//! Tier derivation and milestone bonuses
//!
//! Pure functions over the lifetime donation count. The tier is never
//! stored independently; the ledger recomputes it on every donation
//! award.

use shared::models::DonorTier;

/// Points credited for one completed donation
pub const POINTS_PER_DONATION: i64 = 100;

/// Points credited for one successful referral
pub const POINTS_PER_REFERRAL: i64 = 50;

// Tier thresholds (lifetime donations)
pub const CERTIFIED_THRESHOLD: i64 = 1;
pub const BRONZE_THRESHOLD: i64 = 5;
pub const SILVER_THRESHOLD: i64 = 10;
pub const GOLD_THRESHOLD: i64 = 25;

// One-time bonuses when a threshold is reached exactly
pub const BRONZE_MILESTONE_BONUS: i64 = 100;
pub const SILVER_MILESTONE_BONUS: i64 = 200;
pub const GOLD_MILESTONE_BONUS: i64 = 500;

/// Tier for a lifetime donation count, highest threshold met wins
pub fn tier_of(total_donations: i64) -> DonorTier {
    if total_donations >= GOLD_THRESHOLD {
        DonorTier::Gold
    } else if total_donations >= SILVER_THRESHOLD {
        DonorTier::Silver
    } else if total_donations >= BRONZE_THRESHOLD {
        DonorTier::Bronze
    } else if total_donations >= CERTIFIED_THRESHOLD {
        DonorTier::Certified
    } else {
        DonorTier::New
    }
}

/// Milestone bonus for a post-increment donation count.
///
/// Fires only when the count **equals** a threshold (a `>=` check would
/// re-award the bonus on every later donation).
pub fn milestone_bonus(total_donations: i64) -> i64 {
    if total_donations == GOLD_THRESHOLD {
        GOLD_MILESTONE_BONUS
    } else if total_donations == SILVER_THRESHOLD {
        SILVER_MILESTONE_BONUS
    } else if total_donations == BRONZE_THRESHOLD {
        BRONZE_MILESTONE_BONUS
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table() {
        assert_eq!(tier_of(0), DonorTier::New);
        assert_eq!(tier_of(1), DonorTier::Certified);
        assert_eq!(tier_of(4), DonorTier::Certified);
        assert_eq!(tier_of(5), DonorTier::Bronze);
        assert_eq!(tier_of(9), DonorTier::Bronze);
        assert_eq!(tier_of(10), DonorTier::Silver);
        assert_eq!(tier_of(24), DonorTier::Silver);
        assert_eq!(tier_of(25), DonorTier::Gold);
        assert_eq!(tier_of(100), DonorTier::Gold);
    }

    #[test]
    fn test_milestone_fires_exactly_at_threshold() {
        assert_eq!(milestone_bonus(5), BRONZE_MILESTONE_BONUS);
        assert_eq!(milestone_bonus(10), SILVER_MILESTONE_BONUS);
        assert_eq!(milestone_bonus(25), GOLD_MILESTONE_BONUS);
    }

    #[test]
    fn test_no_milestone_between_thresholds() {
        for count in [0, 1, 4, 6, 9, 11, 24, 26, 100] {
            assert_eq!(milestone_bonus(count), 0, "count {count}");
        }
    }
}
