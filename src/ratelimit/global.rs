//! Global sanity check over aggregated counters.

use std::collections::HashMap;

use super::window::{WindowCounters, WindowIndex};
use crate::error::Result;

/// Lowest counter value still considered plausible.
///
/// Legitimate counts are never negative; -1 tolerates a single stray
/// decrement from the aggregator.
pub const GLOBAL_FLOOR: i64 = -1;

/// Returns `false` if the total or any single window is below [`GLOBAL_FLOOR`].
pub fn check_global(counters: &WindowCounters) -> bool {
    if counters.sum() < i128::from(GLOBAL_FLOOR) {
        return false;
    }
    counters.iter().all(|(_, value)| value >= GLOBAL_FLOOR)
}

/// [`check_global`] over a window-keyed mapping.
///
/// Fails with `MissingWindow` if any of the five windows is absent.
pub fn check_global_map(map: &HashMap<WindowIndex, i64>) -> Result<bool> {
    let counters = WindowCounters::from_map(map)?;
    Ok(check_global(&counters))
}
