//! Aggregator
//!
//! Pure statistics over reading values. Every function expects its input
//! sorted ascending (the store hands values over that way) and returns
//! `None` for an empty input instead of dividing by zero or indexing out
//! of bounds.
//!
//! Quartiles use a halves-excluding-middle split:
//!
//! ```text
//! n even: [ lower half | upper half ]           lower = median(v[..n/2]), upper = median(v[n/2..])
//! n odd:  [ lower half | mid | upper half ]     lower = median(v[..n/2]), upper = median(v[n/2+1..])
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of a statistic that may be integral or fractional
///
/// The median of an odd-sized sample is one of the samples and stays an
/// integer; the median of an even-sized sample is a midpoint and is always
/// a float, even when the midpoint is whole (`36.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
}

impl StatValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            StatValue::Integer(v) => *v as f64,
            StatValue::Float(v) => *v,
        }
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Integer(v) => write!(f, "{}", v),
            // Debug keeps the trailing ".0" on whole floats
            StatValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

/// Lower and upper quartile split points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub lower: StatValue,
    pub upper: StatValue,
}

impl std::fmt::Display for Quartiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lower, self.upper)
    }
}

/// Statistics the service can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Min,
    Max,
    Mean,
    Median,
    Mode,
    Quartiles,
}

impl Statistic {
    pub fn all() -> &'static [Statistic] {
        &[
            Statistic::Min,
            Statistic::Max,
            Statistic::Mean,
            Statistic::Median,
            Statistic::Mode,
            Statistic::Quartiles,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Mode => "mode",
            Statistic::Quartiles => "quartiles",
        }
    }

    /// Whether the query must bound both ends of the time window
    pub fn requires_window(&self) -> bool {
        matches!(self, Statistic::Quartiles)
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "mean" | "avg" | "average" => Some(Self::Mean),
            "median" => Some(Self::Median),
            "mode" => Some(Self::Mode),
            "quartiles" => Some(Self::Quartiles),
            _ => None,
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn debug_assert_sorted(values: &[i64]) {
    debug_assert!(
        values.windows(2).all(|w| w[0] <= w[1]),
        "aggregator input must be sorted ascending"
    );
}

/// Smallest element of an ascending sequence
pub fn min<T>(sorted: &[T]) -> Option<&T> {
    sorted.first()
}

/// Largest element of an ascending sequence
pub fn max<T>(sorted: &[T]) -> Option<&T> {
    sorted.last()
}

/// Arithmetic mean
pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let sum: i64 = values.iter().sum();
    Some(sum as f64 / values.len() as f64)
}

/// Most frequent value, ties going to the smallest value
pub fn mode(values: &[i64]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending value order
    let mut groups: Vec<(i64, usize)> = counts.into_iter().collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    groups.first().map(|(value, _)| *value)
}

/// Median of an ascending sequence
pub fn median(sorted: &[i64]) -> Option<StatValue> {
    debug_assert_sorted(sorted);

    let n = sorted.len();
    if n == 0 {
        return None;
    }

    let mid = n / 2;
    if n % 2 == 0 {
        Some(StatValue::Float((sorted[mid - 1] + sorted[mid]) as f64 / 2.0))
    } else {
        Some(StatValue::Integer(sorted[mid]))
    }
}

/// Lower and upper quartiles of an ascending sequence
///
/// Needs at least two values; with fewer, one of the halves is empty and
/// the split is undefined.
pub fn quartiles(sorted: &[i64]) -> Option<Quartiles> {
    debug_assert_sorted(sorted);

    let n = sorted.len();
    let mid = n / 2;

    let lower = median(&sorted[..mid])?;
    let upper = if n % 2 == 0 {
        median(&sorted[mid..])?
    } else {
        median(&sorted[mid + 1..])?
    };

    Some(Quartiles { lower, upper })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        let values = [3, 3, 7, 9, 9];
        assert_eq!(min(&values), Some(&3));
        assert_eq!(max(&values), Some(&9));

        let single = [42];
        assert_eq!(min(&single), Some(&42));
        assert_eq!(max(&single), Some(&42));

        let empty: [i64; 0] = [];
        assert_eq!(min(&empty), None);
        assert_eq!(max(&empty), None);
    }

    #[test]
    fn test_mean() {
        let mean = mean(&[22, 50, 100]).unwrap();
        assert_eq!((mean * 100.0).round() / 100.0, 57.33);

        assert_eq!(super::mean(&[10, 20]), Some(15.0));
        assert_eq!(super::mean(&[]), None);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[22, 50, 100]), Some(StatValue::Integer(50)));
        assert_eq!(median(&[22, 50]), Some(StatValue::Float(36.0)));
        assert_eq!(median(&[7]), Some(StatValue::Integer(7)));
        assert_eq!(median(&[1, 2, 3, 4]), Some(StatValue::Float(2.5)));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_mode() {
        assert_eq!(mode(&[22, 22, 50, 100]), Some(22));
        assert_eq!(mode(&[10, 20, 20, 30]), Some(20));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn test_mode_tie_goes_to_smallest() {
        assert_eq!(mode(&[10, 10, 20, 20]), Some(10));
        assert_eq!(mode(&[22, 50, 100]), Some(22));
        assert_eq!(mode(&[5, 40, 40, 90, 90]), Some(40));
    }

    #[test]
    fn test_quartiles_odd() {
        let q = quartiles(&[22, 50, 100]).unwrap();
        assert_eq!(q.lower, StatValue::Integer(22));
        assert_eq!(q.upper, StatValue::Integer(100));
        assert_eq!(q.to_string(), "22,100");

        // [1 2 3] 4 [5 6 7]
        let q = quartiles(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(q.lower, StatValue::Integer(2));
        assert_eq!(q.upper, StatValue::Integer(6));
    }

    #[test]
    fn test_quartiles_even() {
        // [1 2 3 4] [5 6 7 8]
        let q = quartiles(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(q.lower, StatValue::Float(2.5));
        assert_eq!(q.upper, StatValue::Float(6.5));
        assert_eq!(q.to_string(), "2.5,6.5");

        let q = quartiles(&[10, 90]).unwrap();
        assert_eq!(q.lower, StatValue::Integer(10));
        assert_eq!(q.upper, StatValue::Integer(90));
    }

    #[test]
    fn test_quartiles_undefined_below_two_values() {
        assert_eq!(quartiles(&[]), None);
        assert_eq!(quartiles(&[5]), None);
    }

    #[test]
    fn test_stat_value_display() {
        assert_eq!(StatValue::Integer(50).to_string(), "50");
        assert_eq!(StatValue::Float(36.0).to_string(), "36.0");
        assert_eq!(StatValue::Float(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_stat_value_json() {
        assert_eq!(serde_json::to_string(&StatValue::Integer(50)).unwrap(), "50");
        assert_eq!(serde_json::to_string(&StatValue::Float(36.0)).unwrap(), "36.0");
    }

    #[test]
    fn test_statistic_parse() {
        for stat in Statistic::all() {
            assert_eq!(Statistic::from_str(stat.as_str()), Some(*stat));
        }
        assert_eq!(Statistic::from_str("AVG"), Some(Statistic::Mean));
        assert_eq!(Statistic::from_str("p99"), None);
        assert!(Statistic::Quartiles.requires_window());
        assert!(!Statistic::Median.requires_window());
    }
}
