//! Reward Redemption Model

use serde::{Deserialize, Serialize};

use super::DonorTier;

/// Reward kinds a donor can redeem points for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RewardType {
    Badge,
    MedicalService,
    GiftCard,
    PriorityBooking,
    BloodBagVoucher,
}

impl RewardType {
    /// Reward kinds that carry a voucher code when redeemed
    pub fn has_voucher_code(&self) -> bool {
        matches!(
            self,
            RewardType::BloodBagVoucher | RewardType::GiftCard | RewardType::MedicalService
        )
    }
}

/// Location class a redemption may be honored at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RedeemableAt {
    Hospital,
    Bloodbank,
    Both,
}

/// Concrete location kind presenting a voucher for validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherLocation {
    Hospital,
    Bloodbank,
}

impl RedeemableAt {
    /// Whether a voucher with this scope may be honored at `location`
    pub fn permits(&self, location: &VoucherLocation) -> bool {
        match self {
            RedeemableAt::Both => true,
            RedeemableAt::Hospital => *location == VoucherLocation::Hospital,
            RedeemableAt::Bloodbank => *location == VoucherLocation::Bloodbank,
        }
    }
}

/// Redemption lifecycle state.
///
/// PENDING → PROCESSING → COMPLETED, or PENDING → CANCELLED (with
/// refund). Terminal states are immutable except notes/audit fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum RedemptionStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl RedemptionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RedemptionStatus::Completed | RedemptionStatus::Cancelled)
    }
}

/// Reward redemption entity: a donor's claim on a reward.
///
/// Created in PENDING at redemption time; transitions are owned
/// exclusively by the redemption engine; never physically deleted
/// (cancellation is a terminal state, not a delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RewardRedemption {
    pub id: i64,
    pub donor_id: String,
    pub reward_title: String,
    pub reward_type: RewardType,
    pub tier: DonorTier,
    pub redeemable_at: RedeemableAt,
    pub points_cost: i64,
    pub status: RedemptionStatus,
    pub redeemed_date: i64,
    /// Acceptance timestamp while PROCESSING, final handoff once COMPLETED
    pub delivered_date: Option<i64>,
    /// `RDS-XXXXXXXX`, unique when present
    pub voucher_code: Option<String>,
    pub expiry_date: Option<i64>,
    pub notes: Option<String>,
    pub validated_by_blood_bank_id: Option<String>,
    pub validated_by_hospital_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Redeem request payload (donor-facing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub reward_title: String,
    pub reward_type: RewardType,
    pub points_cost: i64,
    pub tier: DonorTier,
    pub redeemable_at: RedeemableAt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redeemable_scope_permits() {
        assert!(RedeemableAt::Both.permits(&VoucherLocation::Hospital));
        assert!(RedeemableAt::Both.permits(&VoucherLocation::Bloodbank));
        assert!(RedeemableAt::Hospital.permits(&VoucherLocation::Hospital));
        assert!(!RedeemableAt::Hospital.permits(&VoucherLocation::Bloodbank));
        assert!(!RedeemableAt::Bloodbank.permits(&VoucherLocation::Hospital));
    }

    #[test]
    fn test_voucher_code_kinds() {
        assert!(RewardType::BloodBagVoucher.has_voucher_code());
        assert!(RewardType::GiftCard.has_voucher_code());
        assert!(RewardType::MedicalService.has_voucher_code());
        assert!(!RewardType::Badge.has_voucher_code());
        assert!(!RewardType::PriorityBooking.has_voucher_code());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&RedemptionStatus::Processing).unwrap(),
            "\"PROCESSING\""
        );
        assert_eq!(
            serde_json::to_string(&RewardType::BloodBagVoucher).unwrap(),
            "\"BLOOD_BAG_VOUCHER\""
        );
    }
}
