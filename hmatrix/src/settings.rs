//! Process-wide tuning flags and counters
//!
//! A small string-keyed store consulted by the core at runtime. Known
//! keys:
//!
//! | key                   | values | effect                                  |
//! |-----------------------|--------|-----------------------------------------|
//! | `LRA`                 | 0,1,2  | low-rank addition strategy, see [LraStrategy] |
//! | `LR_ADDITION_COUNTER` | 0,1    | count recompressions under `lr-addition` |
//! | `FRANK_DISABLE_TIMER` | 0,1    | parked for timing front-ends; the core carries no timer |

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

pub const LRA: &str = "LRA";
pub const LR_ADDITION_COUNTER: &str = "LR_ADDITION_COUNTER";
pub const FRANK_DISABLE_TIMER: &str = "FRANK_DISABLE_TIMER";

/// Counter bumped on every low-rank recompression when
/// `LR_ADDITION_COUNTER` is set.
pub const LR_ADDITION: &str = "lr-addition";

fn flags() -> &'static Mutex<HashMap<String, i64>> {
    static FLAGS: OnceLock<Mutex<HashMap<String, i64>>> = OnceLock::new();
    FLAGS.get_or_init(|| Mutex::new(HashMap::new()))
}

fn counters() -> &'static Mutex<HashMap<String, u64>> {
    static COUNTERS: OnceLock<Mutex<HashMap<String, u64>>> = OnceLock::new();
    COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn set_flag(key: &str, value: i64) {
    flags().lock().unwrap().insert(key.to_string(), value);
}

/// Current value of a flag; unset flags read as 0.
pub fn flag(key: &str) -> i64 {
    flags().lock().unwrap().get(key).copied().unwrap_or(0)
}

pub fn increment_counter(name: &str) {
    *counters().lock().unwrap().entry(name.to_string()).or_insert(0) += 1;
}

pub fn counter(name: &str) -> u64 {
    counters().lock().unwrap().get(name).copied().unwrap_or(0)
}

pub fn reset_counter(name: &str) {
    counters().lock().unwrap().remove(name);
}

/// How `LowRank += LowRank` recompresses, selected by the `LRA` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LraStrategy {
    /// Densify both addends and recompress to the left rank.
    Naive,
    /// Merge the factors, re-orthogonalize with QR/RQ and truncate the
    /// small inner SVD.
    Orthogonal,
    /// Merge-add while the summed rank fits, densify otherwise.
    Default,
}

/// Unset reads as [LraStrategy::Default].
pub fn lra_strategy() -> LraStrategy {
    match flags().lock().unwrap().get(LRA) {
        Some(0) => LraStrategy::Naive,
        Some(1) => LraStrategy::Orthogonal,
        _ => LraStrategy::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flag_reads_zero() {
        assert_eq!(flag("NO_SUCH_FLAG"), 0);
    }

    #[test]
    fn counters_accumulate_and_reset() {
        reset_counter("test-counter");
        increment_counter("test-counter");
        increment_counter("test-counter");
        assert_eq!(counter("test-counter"), 2);
        reset_counter("test-counter");
        assert_eq!(counter("test-counter"), 0);
    }
}
