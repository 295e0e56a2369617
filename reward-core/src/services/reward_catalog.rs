//! Reward Catalog Service
//!
//! CRUD over the catalog of redeemable rewards. No state machine here;
//! redemption of a catalog entry goes through the redemption engine.

use sqlx::SqlitePool;

use crate::db::repository::reward;
use crate::utils::{AppError, AppResult};
use shared::models::{RedeemableAt, Reward, RewardCreate, RewardUpdate};

/// Reward catalog management
#[derive(Clone)]
pub struct RewardCatalog {
    pool: SqlitePool,
}

impl RewardCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Reward>> {
        let mut conn = self.pool.acquire().await?;
        Ok(reward::find_all(&mut conn).await?)
    }

    pub async fn list_active(&self) -> AppResult<Vec<Reward>> {
        let mut conn = self.pool.acquire().await?;
        Ok(reward::find_active(&mut conn).await?)
    }

    /// Active rewards honored at a location class (BOTH always included)
    pub async fn list_by_redeemable_at(
        &self,
        redeemable_at: RedeemableAt,
    ) -> AppResult<Vec<Reward>> {
        let mut conn = self.pool.acquire().await?;
        Ok(reward::find_by_redeemable_at(&mut conn, &redeemable_at).await?)
    }

    pub async fn get(&self, id: i64) -> AppResult<Reward> {
        let mut conn = self.pool.acquire().await?;
        reward::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reward {id} not found")))
    }

    pub async fn create(&self, data: RewardCreate) -> AppResult<Reward> {
        if data.points_cost <= 0 {
            return Err(AppError::Validation(format!(
                "Points cost must be positive, got {}",
                data.points_cost
            )));
        }
        let mut conn = self.pool.acquire().await?;
        let created = reward::create(&mut conn, data).await?;
        tracing::info!(reward_id = created.id, title = %created.title, "Reward created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, data: RewardUpdate) -> AppResult<Reward> {
        if let Some(points_cost) = data.points_cost
            && points_cost <= 0
        {
            return Err(AppError::Validation(format!(
                "Points cost must be positive, got {points_cost}"
            )));
        }
        let mut conn = self.pool.acquire().await?;
        Ok(reward::update(&mut conn, id, data).await?)
    }

    pub async fn toggle_active(&self, id: i64) -> AppResult<Reward> {
        let mut conn = self.pool.acquire().await?;
        let toggled = reward::toggle_active(&mut conn, id).await?;
        tracing::info!(reward_id = id, is_active = toggled.is_active, "Reward active flag toggled");
        Ok(toggled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{DonorTier, RewardType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::DbService::migrate(&pool).await.unwrap();
        pool
    }

    fn make_reward(title: &str, redeemable_at: RedeemableAt) -> RewardCreate {
        RewardCreate {
            title: title.to_string(),
            description: None,
            points_cost: 100,
            reward_type: RewardType::GiftCard,
            tier: DonorTier::Certified,
            redeemable_at,
            auto_unlock: None,
            unlock_condition: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let catalog = RewardCatalog::new(test_pool().await);
        let created = catalog
            .create(make_reward("Pharmacy Gift Card", RedeemableAt::Both))
            .await
            .unwrap();
        assert!(created.is_active);
        assert!(!created.auto_unlock);

        let fetched = catalog.get(created.id).await.unwrap();
        assert_eq!(fetched.title, "Pharmacy Gift Card");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let catalog = RewardCatalog::new(test_pool().await);
        let err = catalog.get(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_cost() {
        let catalog = RewardCatalog::new(test_pool().await);
        let mut data = make_reward("Free Badge", RedeemableAt::Both);
        data.points_cost = 0;
        let err = catalog.create(data).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_location_listing_includes_both() {
        let catalog = RewardCatalog::new(test_pool().await);
        catalog
            .create(make_reward("Hospital Only", RedeemableAt::Hospital))
            .await
            .unwrap();
        catalog
            .create(make_reward("Bank Only", RedeemableAt::Bloodbank))
            .await
            .unwrap();
        catalog
            .create(make_reward("Anywhere", RedeemableAt::Both))
            .await
            .unwrap();

        let at_hospital = catalog
            .list_by_redeemable_at(RedeemableAt::Hospital)
            .await
            .unwrap();
        let titles: Vec<_> = at_hospital.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Hospital Only"));
        assert!(titles.contains(&"Anywhere"));
    }

    #[tokio::test]
    async fn test_toggle_active_hides_from_active_list() {
        let catalog = RewardCatalog::new(test_pool().await);
        let created = catalog
            .create(make_reward("Gift Card", RedeemableAt::Both))
            .await
            .unwrap();
        assert_eq!(catalog.list_active().await.unwrap().len(), 1);

        let toggled = catalog.toggle_active(created.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(catalog.list_active().await.unwrap().is_empty());
        assert_eq!(catalog.list_all().await.unwrap().len(), 1);

        let toggled = catalog.toggle_active(created.id).await.unwrap();
        assert!(toggled.is_active);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let catalog = RewardCatalog::new(test_pool().await);
        let created = catalog
            .create(make_reward("Gift Card", RedeemableAt::Both))
            .await
            .unwrap();

        let updated = catalog
            .update(
                created.id,
                RewardUpdate {
                    title: None,
                    description: Some("50€ pharmacy credit".to_string()),
                    points_cost: Some(250),
                    tier: Some(DonorTier::Silver),
                    redeemable_at: None,
                    auto_unlock: None,
                    unlock_condition: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Gift Card");
        assert_eq!(updated.points_cost, 250);
        assert_eq!(updated.tier, DonorTier::Silver);
        assert_eq!(updated.description.as_deref(), Some("50€ pharmacy credit"));
    }
}
