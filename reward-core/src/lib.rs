//! Reward Core - 献血者积分与兑换核心
//!
//! # 架构概述
//!
//! Service layer for the donor rewards platform: the points ledger, the
//! redemption state machine, and the coordination contract with the
//! blood inventory store. Consumed by request handlers; exposes no wire
//! protocol of its own.
//!
//! - **Ledger** (`services/points_ledger`): balance, tier, and the
//!   append-only transaction log (`reward_points` is always the sum of
//!   the log)
//! - **Redemption** (`services/redemption`): PENDING → PROCESSING →
//!   COMPLETED / CANCELLED with refund-on-cancel
//! - **Inventory** (`services/inventory`): check/reserve/decrement
//!   contract for blood-bag vouchers
//! - **Catalog** (`services/reward_catalog`): redeemable rewards CRUD
//!
//! # 模块结构
//!
//! ```text
//! reward-core/src/
//! ├── db/            # SQLite pool, migrations, repositories
//! ├── loyalty/       # 纯函数: tier 阈值、里程碑奖励、voucher 解析
//! ├── services/      # 服务层
//! └── utils/         # 错误类型、日志、per-donor 锁
//! ```

pub mod db;
pub mod loyalty;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use db::DbService;
pub use services::{InventoryCoordinator, PointsLedger, RedemptionEngine, RewardCatalog};
pub use utils::{AppError, AppResult, DonorLocks};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
