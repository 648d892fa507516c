//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Delay before poll `attempt` (1-based): `base * 2^(attempt-1)`, capped at
/// `max`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u32.saturating_pow(attempt - 1);
    let capped = base.saturating_mul(exponential).min(max);

    let jitter_range_ms = (capped.as_millis() / 10) as u64;
    let jitter_ms = if jitter_range_ms > 0 {
        rand::thread_rng().gen_range(0..jitter_range_ms)
    } else {
        0
    };

    capped + Duration::from_millis(jitter_ms)
}
