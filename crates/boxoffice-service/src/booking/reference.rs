//! Human-readable booking references.
//!
//! Format: `{prefix}{base36 millis}{4 random chars}`, all uppercase, e.g.
//! `EVTM2K9Q1X4A7F3`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 4;

/// Generate a reference for a booking made at `now`.
pub fn generate(prefix: &str, now: DateTime<Utc>) -> String {
    let mut reference = String::with_capacity(prefix.len() + 13 + SUFFIX_LEN);
    reference.push_str(&prefix.to_ascii_uppercase());
    reference.push_str(&base36(now.timestamp_millis().max(0) as u64));

    let entropy = Uuid::new_v4().as_u128();
    for i in 0..SUFFIX_LEN {
        let digit = ((entropy >> (i * 6)) % 36) as usize;
        reference.push(ALPHABET[digit] as char);
    }
    reference
}

fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
