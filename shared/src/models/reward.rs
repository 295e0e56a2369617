//! Reward Catalog Model

use serde::{Deserialize, Serialize};

use super::{DonorTier, RedeemableAt, RewardType};

/// Catalog entry describing a reward donors can redeem points for
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reward {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub reward_type: RewardType,
    pub tier: DonorTier,
    pub redeemable_at: RedeemableAt,
    /// Granted automatically when the tier is reached (badges)
    pub auto_unlock: bool,
    pub unlock_condition: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create reward payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardCreate {
    pub title: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub reward_type: RewardType,
    pub tier: DonorTier,
    pub redeemable_at: RedeemableAt,
    pub auto_unlock: Option<bool>,
    pub unlock_condition: Option<String>,
}

/// Update reward payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub points_cost: Option<i64>,
    pub tier: Option<DonorTier>,
    pub redeemable_at: Option<RedeemableAt>,
    pub auto_unlock: Option<bool>,
    pub unlock_condition: Option<String>,
    pub is_active: Option<bool>,
}
