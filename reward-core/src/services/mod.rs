//! Service layer - ledger, redemption lifecycle, inventory contract
//!
//! # Services
//!
//! - [`PointsLedger`] - sole mutator of donor balances; every mutation
//!   is one transaction over the log and the donor row
//! - [`RedemptionEngine`] - redemption state machine and voucher
//!   issuance/validation
//! - [`InventoryCoordinator`] - contract wrapper over the blood bank
//!   inventory store
//! - [`RewardCatalog`] - reward catalog CRUD

pub mod inventory;
pub mod points_ledger;
pub mod redemption;
pub mod reward_catalog;

pub use inventory::InventoryCoordinator;
pub use points_ledger::PointsLedger;
pub use redemption::RedemptionEngine;
pub use reward_catalog::RewardCatalog;
