//! Account code generation.
//!
//! A candidate code is `"1"` + the last six digits of the unix millisecond
//! timestamp + three random digits, ten characters total. The caller checks
//! each candidate against existing rows and retries; the `(user_id, code)`
//! unique index is the final guarantee.

use chrono::Utc;
use rand::Rng;

/// Number of candidates tried before giving up.
pub(crate) const MAX_ATTEMPTS: u32 = 10;

pub(crate) fn candidate() -> String {
    let millis = Utc::now().timestamp_millis();
    let tail = millis.rem_euclid(1_000_000);
    let random: u32 = rand::thread_rng().gen_range(0..1_000);
    format!("1{tail:06}{random:03}")
}
