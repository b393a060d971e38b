//! Exponential backoff arithmetic.

use crate::Timestamp;

/// Delay before an operation that has failed `retry_count` times is retried.
///
/// `base * 2^retry_count`, saturating at `u64::MAX`.
pub fn delay_ms(base_delay_ms: u64, retry_count: u32) -> u64 {
    match 1u64.checked_shl(retry_count) {
        Some(factor) => base_delay_ms.saturating_mul(factor),
        None => u64::MAX,
    }
}

/// Earliest time a failed operation may be attempted again.
pub fn ready_at(base_delay_ms: u64, last_retry_at: Timestamp, retry_count: u32) -> Timestamp {
    last_retry_at.saturating_add(delay_ms(base_delay_ms, retry_count))
}
