//! Voucher code generation and title parsing

use uuid::Uuid;

/// Voucher code prefix
pub const VOUCHER_PREFIX: &str = "RDS-";

/// Generate a candidate voucher code: `RDS-` + 8 uppercase hex chars.
///
/// Uniqueness is not guaranteed here; the redemption engine checks the
/// candidate against existing codes inside its transaction and retries
/// on collision.
pub fn generate_voucher_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{VOUCHER_PREFIX}{}", hex[..8].to_uppercase())
}

/// Extract the blood type from a blood-bag voucher title.
///
/// Title format: `"Blood Bag Voucher - A+"`. Returns the segment after
/// the first `" - "`, trimmed, or None when the title carries no type.
pub fn blood_type_from_title(reward_title: &str) -> Option<String> {
    let mut parts = reward_title.split(" - ");
    parts.next()?;
    let blood_type = parts.next()?.trim();
    if blood_type.is_empty() {
        None
    } else {
        Some(blood_type.to_string())
    }
}

/// Extract a hospital ID tagged into a cancellation reason.
///
/// Hospitals cancelling a medical-service voucher identify themselves
/// with `"... [Hospital ID: <id>]"` in the reason text.
pub fn hospital_id_from_reason(reason: &str) -> Option<String> {
    let start = reason.find("[Hospital ID: ")? + "[Hospital ID: ".len();
    let end = reason[start..].find(']')? + start;
    let id = reason[start..end].trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
