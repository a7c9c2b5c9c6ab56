//! Human-readable addresses and short codes for parcels.

use crate::types::{AdminBlock, Parcel};

/// Returned when a parcel has no address component at all.
pub const ADDRESS_NOT_AVAILABLE: &str = "Address not available";

const SHORT_CODE_PREFIX: &str = "KE-";
const SHORT_CODE_DIGITS: usize = 8;

/// Join the address components that are present:
/// `EP-<label>, <lr_no>, off <road>, <block>, <constituency>, <county>`.
pub fn physical_address(
    parcel: &Parcel,
    block: Option<&AdminBlock>,
    access_road: Option<&str>,
    entry_label: Option<i32>,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(6);
    if let Some(label) = entry_label {
        parts.push(format!("EP-{label}"));
    }
    parts.push(parcel.lr_no.trim().to_string());
    if let Some(road) = access_road.map(str::trim).filter(|r| !r.is_empty()) {
        parts.push(format!("off {road}"));
    }
    if let Some(block) = block {
        parts.extend([&block.name, &block.constituency, &block.county].map(|s| s.trim().to_string()));
    }
    parts.retain(|p| !p.is_empty());

    if parts.is_empty() {
        ADDRESS_NOT_AVAILABLE.to_string()
    } else {
        parts.join(", ")
    }
}

/// Rolling `h * 31 + c` hash over 32-bit signed integers, wrapping on overflow.
fn rolling_hash(s: &str) -> i32 {
    s.bytes().fold(0i32, |h, b| h.wrapping_mul(31).wrapping_add(b as i32))
}

fn base36_upper(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.iter().rev().map(|&d| d as char).collect()
}

/// Short code of a registration code: `KE-` followed by at most 8 base-36
/// digits of the hash of its ASCII alphanumeric characters.
pub fn short_code_for(lr_no: &str) -> String {
    let stripped: String = lr_no.chars().filter(char::is_ascii_alphanumeric).collect();
    let hash = i64::from(rolling_hash(&stripped)).unsigned_abs();
    let mut digits = base36_upper(hash);
    digits.truncate(SHORT_CODE_DIGITS);
    format!("{SHORT_CODE_PREFIX}{digits}")
}

#[inline]
pub fn short_code(parcel: &Parcel) -> String { short_code_for(&parcel.lr_no) }
