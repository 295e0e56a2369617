//! Donor Rewards Model

use serde::{Deserialize, Serialize};

/// Donor loyalty tier, derived purely from lifetime donation count.
///
/// Thresholds: CERTIFIED at 1 donation, BRONZE at 5, SILVER at 10,
/// GOLD at 25. Never set independently of `total_donations`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum DonorTier {
    New,
    Certified,
    Bronze,
    Silver,
    Gold,
}

impl DonorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonorTier::New => "NEW",
            DonorTier::Certified => "CERTIFIED",
            DonorTier::Bronze => "BRONZE",
            DonorTier::Silver => "SILVER",
            DonorTier::Gold => "GOLD",
        }
    }
}

impl std::fmt::Display for DonorTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Donor rewards row: a materialized view of the transaction log.
///
/// The donor account itself lives in the external user store; this row
/// caches the balance, lifetime donation count and derived tier. It is
/// created lazily with defaults (0, 0, NEW) the first time any ledger
/// operation touches a donor, and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DonorRewards {
    pub donor_id: String,
    pub reward_points: i64,
    pub total_donations: i64,
    pub donor_tier: DonorTier,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&DonorTier::Certified).unwrap(),
            "\"CERTIFIED\""
        );
        assert_eq!(serde_json::to_string(&DonorTier::New).unwrap(), "\"NEW\"");
    }

    #[test]
    fn test_tier_display_matches_wire_form() {
        assert_eq!(DonorTier::Gold.to_string(), "GOLD");
    }
}
