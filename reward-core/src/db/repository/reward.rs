//! Reward Catalog Repository

use super::{RepoError, RepoResult};
use shared::models::{RedeemableAt, Reward, RewardCreate, RewardUpdate};
use sqlx::SqliteConnection;

const REWARD_SELECT: &str =
    "SELECT id, title, description, points_cost, reward_type, tier, redeemable_at, \
     auto_unlock, unlock_condition, is_active, created_at, updated_at FROM rewards";

pub async fn find_all(conn: &mut SqliteConnection) -> RepoResult<Vec<Reward>> {
    let sql = format!("{REWARD_SELECT} ORDER BY points_cost, id");
    let rows = sqlx::query_as::<_, Reward>(&sql).fetch_all(conn).await?;
    Ok(rows)
}

pub async fn find_active(conn: &mut SqliteConnection) -> RepoResult<Vec<Reward>> {
    let sql = format!("{REWARD_SELECT} WHERE is_active = 1 ORDER BY points_cost, id");
    let rows = sqlx::query_as::<_, Reward>(&sql).fetch_all(conn).await?;
    Ok(rows)
}

pub async fn find_by_redeemable_at(
    conn: &mut SqliteConnection,
    redeemable_at: &RedeemableAt,
) -> RepoResult<Vec<Reward>> {
    let sql = format!(
        "{REWARD_SELECT} WHERE is_active = 1 AND (redeemable_at = ? OR redeemable_at = 'BOTH') \
         ORDER BY points_cost, id"
    );
    let rows = sqlx::query_as::<_, Reward>(&sql)
        .bind(redeemable_at)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Reward>> {
    let sql = format!("{REWARD_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Reward>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(conn: &mut SqliteConnection, data: RewardCreate) -> RepoResult<Reward> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO rewards \
         (id, title, description, points_cost, reward_type, tier, redeemable_at, \
          auto_unlock, unlock_condition, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
    )
    .bind(id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.points_cost)
    .bind(&data.reward_type)
    .bind(&data.tier)
    .bind(&data.redeemable_at)
    .bind(data.auto_unlock.unwrap_or(false))
    .bind(&data.unlock_condition)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create reward".into()))
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    data: RewardUpdate,
) -> RepoResult<Reward> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE rewards SET title = COALESCE(?1, title), \
         description = COALESCE(?2, description), \
         points_cost = COALESCE(?3, points_cost), \
         tier = COALESCE(?4, tier), \
         redeemable_at = COALESCE(?5, redeemable_at), \
         auto_unlock = COALESCE(?6, auto_unlock), \
         unlock_condition = COALESCE(?7, unlock_condition), \
         is_active = COALESCE(?8, is_active), \
         updated_at = ?9 WHERE id = ?10",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.points_cost)
    .bind(&data.tier)
    .bind(&data.redeemable_at)
    .bind(data.auto_unlock)
    .bind(&data.unlock_condition)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Reward {id} not found")));
    }
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Reward {id} not found")))
}

/// Flip the active flag, returning the new state
pub async fn toggle_active(conn: &mut SqliteConnection, id: i64) -> RepoResult<Reward> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE rewards SET is_active = NOT is_active, updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Reward {id} not found")));
    }
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Reward {id} not found")))
}
