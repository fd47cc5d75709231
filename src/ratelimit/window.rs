//! Time windows and the per-window counter record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::time::Duration;

use crate::error::{RatecheckError, Result};

/// One of the five fixed aggregation windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowIndex {
    /// Last 1 minute
    Min1,
    /// Last 2 minutes
    Min2,
    /// Last 5 minutes
    Min5,
    /// Last 15 minutes
    Min15,
    /// Last 30 minutes
    Min30,
}

impl WindowIndex {
    /// All windows in positional order.
    pub const ALL: [WindowIndex; 5] = [
        WindowIndex::Min1,
        WindowIndex::Min2,
        WindowIndex::Min5,
        WindowIndex::Min15,
        WindowIndex::Min30,
    ];

    /// Position of this window in a positional counter array.
    pub fn offset(&self) -> usize {
        match self {
            WindowIndex::Min1 => 0,
            WindowIndex::Min2 => 1,
            WindowIndex::Min5 => 2,
            WindowIndex::Min15 => 3,
            WindowIndex::Min30 => 4,
        }
    }

    /// Length of the window in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            WindowIndex::Min1 => 1,
            WindowIndex::Min2 => 2,
            WindowIndex::Min5 => 5,
            WindowIndex::Min15 => 15,
            WindowIndex::Min30 => 30,
        }
    }

    /// Get the duration of this time window.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.minutes()) * 60)
    }

    /// Look up a window by its positional offset.
    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.get(offset).copied()
    }

    /// Look up a window by its length in minutes.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|w| w.minutes() == minutes)
    }
}

impl fmt::Display for WindowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min{}", self.minutes())
    }
}

/// Counter values for each of the five windows.
///
/// Values are signed: the upstream aggregator can emit small negative
/// counts after decrements, which the global check tolerates down to -1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowCounters {
    pub min1: i64,
    pub min2: i64,
    pub min5: i64,
    pub min15: i64,
    pub min30: i64,
}

impl WindowCounters {
    /// Create a counter record from the five window values.
    pub fn new(min1: i64, min2: i64, min5: i64, min15: i64, min30: i64) -> Self {
        Self {
            min1,
            min2,
            min5,
            min15,
            min30,
        }
    }

    /// Build a counter record from a window-keyed mapping.
    ///
    /// Every window must be present; the first missing one (in offset
    /// order) is reported.
    pub fn from_map(map: &HashMap<WindowIndex, i64>) -> Result<Self> {
        let get = |w: WindowIndex| map.get(&w).copied().ok_or(RatecheckError::MissingWindow(w));

        Ok(Self {
            min1: get(WindowIndex::Min1)?,
            min2: get(WindowIndex::Min2)?,
            min5: get(WindowIndex::Min5)?,
            min15: get(WindowIndex::Min15)?,
            min30: get(WindowIndex::Min30)?,
        })
    }

    /// Get the value for a window.
    pub fn get(&self, window: WindowIndex) -> i64 {
        match window {
            WindowIndex::Min1 => self.min1,
            WindowIndex::Min2 => self.min2,
            WindowIndex::Min5 => self.min5,
            WindowIndex::Min15 => self.min15,
            WindowIndex::Min30 => self.min30,
        }
    }

    /// Iterate over `(window, value)` pairs in offset order.
    pub fn iter(&self) -> impl Iterator<Item = (WindowIndex, i64)> + '_ {
        WindowIndex::ALL.iter().map(move |&w| (w, self.get(w)))
    }

    /// Sum of all window values, widened so it cannot overflow.
    pub fn sum(&self) -> i128 {
        self.iter().map(|(_, v)| i128::from(v)).sum()
    }

    /// Values in positional order.
    pub fn to_array(&self) -> [i64; 5] {
        [self.min1, self.min2, self.min5, self.min15, self.min30]
    }
}

impl Index<WindowIndex> for WindowCounters {
    type Output = i64;

    fn index(&self, window: WindowIndex) -> &i64 {
        match window {
            WindowIndex::Min1 => &self.min1,
            WindowIndex::Min2 => &self.min2,
            WindowIndex::Min5 => &self.min5,
            WindowIndex::Min15 => &self.min15,
            WindowIndex::Min30 => &self.min30,
        }
    }
}

impl TryFrom<&[i64]> for WindowCounters {
    type Error = RatecheckError;

    fn try_from(values: &[i64]) -> Result<Self> {
        match values {
            &[min1, min2, min5, min15, min30] => Ok(Self::new(min1, min2, min5, min15, min30)),
            _ => Err(RatecheckError::InvalidInput(format!(
                "expected {} window counters, got {}",
                WindowIndex::ALL.len(),
                values.len()
            ))),
        }
    }
}

impl TryFrom<Vec<i64>> for WindowCounters {
    type Error = RatecheckError;

    fn try_from(values: Vec<i64>) -> Result<Self> {
        Self::try_from(values.as_slice())
    }
}

impl From<WindowCounters> for Vec<i64> {
    fn from(counters: WindowCounters) -> Self {
        counters.to_array().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_offsets_are_positional() {
        for (i, w) in WindowIndex::ALL.iter().enumerate() {
            assert_eq!(w.offset(), i);
            assert_eq!(WindowIndex::from_offset(i), Some(*w));
        }
        assert_eq!(WindowIndex::from_offset(5), None);
    }

    #[test]
    fn test_window_minutes_and_duration() {
        assert_eq!(WindowIndex::Min1.duration(), Duration::from_secs(60));
        assert_eq!(WindowIndex::Min30.duration(), Duration::from_secs(1800));
        assert_eq!(WindowIndex::from_minutes(15), Some(WindowIndex::Min15));
        assert_eq!(WindowIndex::from_minutes(10), None);
        assert_eq!(WindowIndex::Min5.to_string(), "min5");
    }

    #[test]
    fn test_window_serde_names() {
        let json = serde_json::to_string(&WindowIndex::Min15).unwrap();
        assert_eq!(json, "\"min15\"");
        let w: WindowIndex = serde_json::from_str("\"min2\"").unwrap();
        assert_eq!(w, WindowIndex::Min2);
    }

    #[test]
    fn test_from_map_missing_window() {
        let mut map = HashMap::new();
        map.insert(WindowIndex::Min1, 1);
        map.insert(WindowIndex::Min2, 1);
        map.insert(WindowIndex::Min15, 1);
        map.insert(WindowIndex::Min30, 1);

        match WindowCounters::from_map(&map) {
            Err(RatecheckError::MissingWindow(w)) => assert_eq!(w, WindowIndex::Min5),
            other => panic!("expected MissingWindow, got {:?}", other),
        }

        map.insert(WindowIndex::Min5, 7);
        let counters = WindowCounters::from_map(&map).unwrap();
        assert_eq!(counters[WindowIndex::Min5], 7);
    }

    #[test]
    fn test_positional_conversion() {
        let counters = WindowCounters::try_from(vec![4, 3, 2, 1, 0]).unwrap();
        assert_eq!(counters[WindowIndex::Min1], 4);
        assert_eq!(counters.get(WindowIndex::Min30), 0);
        assert_eq!(Vec::from(counters), vec![4, 3, 2, 1, 0]);

        let short: &[i64] = &[1, 2, 3];
        assert!(matches!(
            WindowCounters::try_from(short),
            Err(RatecheckError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_sum_does_not_overflow() {
        let counters = WindowCounters::new(i64::MAX, i64::MAX, 0, 0, 0);
        assert_eq!(counters.sum(), i128::from(i64::MAX) * 2);
    }

    #[test]
    fn test_counters_deserialize_requires_all_windows() {
        let ok: WindowCounters =
            serde_json::from_str(r#"{"min1":1,"min2":2,"min5":3,"min15":4,"min30":5}"#).unwrap();
        assert_eq!(ok.to_array(), [1, 2, 3, 4, 5]);

        let missing = serde_json::from_str::<WindowCounters>(r#"{"min1":1,"min2":2}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_counters_deserialize_rejects_unknown_window() {
        let json = r#"{"min1":0,"min2":0,"min5":0,"min15":0,"min30":0,"min60":-50}"#;
        assert!(serde_json::from_str::<WindowCounters>(json).is_err());
    }
}
