//! Loyalty rules
//!
//! Pure functions for tier derivation, milestone bonuses, and voucher
//! codes. No I/O here; the services layer applies these against the
//! database.

pub mod tier;
pub mod voucher;

pub use tier::{milestone_bonus, tier_of, POINTS_PER_DONATION, POINTS_PER_REFERRAL};
pub use voucher::{blood_type_from_title, generate_voucher_code, hospital_id_from_reason};
