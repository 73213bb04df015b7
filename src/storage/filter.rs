//! Reading filters
//!
//! A `ReadingFilter` is lowered to a list of `FilterClause`s, each of which
//! renders one parameterized SQL predicate. The predicates are joined with
//! an explicit ` AND ` so any combination of optional filters yields a
//! well-formed statement.
//!
//! ```text
//! ReadingFilter { device, type?, start?, end? }
//!   → [Device, Type?, CreatedFrom?, CreatedTo?]
//!   → "device_uuid = ?1 AND type = ?2 AND date_created >= ?3"
//! ```

use rusqlite::types::Value;

use crate::storage::types::{Reading, SensorType};

/// One predicate over the `readings` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterClause {
    /// `device_uuid` exact match
    Device(String),
    /// `type` exact match
    Type(SensorType),
    /// `date_created >= start`
    CreatedFrom(i64),
    /// `date_created <= end`
    CreatedTo(i64),
}

impl FilterClause {
    /// SQL predicate using the given positional parameter index
    fn to_sql(&self, index: usize) -> String {
        match self {
            FilterClause::Device(_) => format!("device_uuid = ?{}", index),
            FilterClause::Type(_) => format!("type = ?{}", index),
            FilterClause::CreatedFrom(_) => format!("date_created >= ?{}", index),
            FilterClause::CreatedTo(_) => format!("date_created <= ?{}", index),
        }
    }

    /// Bound parameter for this predicate
    fn param(&self) -> Value {
        match self {
            FilterClause::Device(uuid) => Value::Text(uuid.clone()),
            FilterClause::Type(t) => Value::Text(t.as_str().to_string()),
            FilterClause::CreatedFrom(ts) | FilterClause::CreatedTo(ts) => Value::Integer(*ts),
        }
    }

    /// Evaluate the predicate against an in-memory reading
    fn matches(&self, reading: &Reading) -> bool {
        match self {
            FilterClause::Device(uuid) => reading.device_uuid == *uuid,
            FilterClause::Type(t) => reading.sensor_type == *t,
            FilterClause::CreatedFrom(ts) => reading.date_created >= *ts,
            FilterClause::CreatedTo(ts) => reading.date_created <= *ts,
        }
    }
}

/// Rendered `WHERE` body plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Filter over a device's readings
///
/// The device is always required; the type and both ends of the time
/// window are optional and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingFilter {
    pub device_uuid: String,
    pub sensor_type: Option<SensorType>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl ReadingFilter {
    /// Match every reading of a device
    pub fn device(device_uuid: impl Into<String>) -> Self {
        Self {
            device_uuid: device_uuid.into(),
            sensor_type: None,
            start: None,
            end: None,
        }
    }

    /// Builder: restrict to one sensor type
    pub fn sensor_type(mut self, sensor_type: SensorType) -> Self {
        self.sensor_type = Some(sensor_type);
        self
    }

    /// Builder: inclusive lower bound on `date_created`
    pub fn start(mut self, start: i64) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder: inclusive upper bound on `date_created`
    pub fn end(mut self, end: i64) -> Self {
        self.end = Some(end);
        self
    }

    /// Lower the filter into its predicate list, device first
    pub fn clauses(&self) -> Vec<FilterClause> {
        let mut clauses = vec![FilterClause::Device(self.device_uuid.clone())];

        if let Some(t) = self.sensor_type {
            clauses.push(FilterClause::Type(t));
        }
        if let Some(start) = self.start {
            clauses.push(FilterClause::CreatedFrom(start));
        }
        if let Some(end) = self.end {
            clauses.push(FilterClause::CreatedTo(end));
        }

        clauses
    }

    /// Render the predicates joined by ` AND `
    pub fn where_clause(&self) -> WhereClause {
        let clauses = self.clauses();

        let sql = clauses
            .iter()
            .enumerate()
            .map(|(i, clause)| clause.to_sql(i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");

        let params = clauses.iter().map(FilterClause::param).collect();

        WhereClause { sql, params }
    }

    /// Check whether a reading satisfies every predicate
    pub fn matches(&self, reading: &Reading) -> bool {
        self.clauses().iter().all(|clause| clause.matches(reading))
    }
}

/// Row ordering requested from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Order of ingestion
    #[default]
    Insertion,
    /// Ascending by value, ties kept in ingestion order
    ValueAscending,
}

impl SortOrder {
    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            SortOrder::Insertion => "rowid ASC",
            SortOrder::ValueAscending => "value ASC, rowid ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_only() {
        let clause = ReadingFilter::device("dev-1").where_clause();
        assert_eq!(clause.sql, "device_uuid = ?1");
        assert_eq!(clause.params, vec![Value::Text("dev-1".to_string())]);
    }

    #[test]
    fn test_all_filters_joined_with_and() {
        let clause = ReadingFilter::device("dev-1")
            .sensor_type(SensorType::Humidity)
            .start(10)
            .end(20)
            .where_clause();

        assert_eq!(
            clause.sql,
            "device_uuid = ?1 AND type = ?2 AND date_created >= ?3 AND date_created <= ?4"
        );
        assert_eq!(
            clause.params,
            vec![
                Value::Text("dev-1".to_string()),
                Value::Text("humidity".to_string()),
                Value::Integer(10),
                Value::Integer(20),
            ]
        );
    }

    #[test]
    fn test_window_without_type_numbers_params_in_order() {
        let clause = ReadingFilter::device("dev-1").start(0).end(5).where_clause();
        assert_eq!(
            clause.sql,
            "device_uuid = ?1 AND date_created >= ?2 AND date_created <= ?3"
        );
        assert_eq!(clause.params.len(), 3);
    }

    #[test]
    fn test_matches() {
        let reading = Reading {
            device_uuid: "dev-1".to_string(),
            sensor_type: SensorType::Temperature,
            value: 40,
            date_created: 100,
        };

        assert!(ReadingFilter::device("dev-1").matches(&reading));
        assert!(ReadingFilter::device("dev-1").start(100).end(100).matches(&reading));
        assert!(!ReadingFilter::device("dev-2").matches(&reading));
        assert!(!ReadingFilter::device("dev-1")
            .sensor_type(SensorType::Humidity)
            .matches(&reading));
        assert!(!ReadingFilter::device("dev-1").start(101).matches(&reading));
        assert!(!ReadingFilter::device("dev-1").end(99).matches(&reading));
    }
}
