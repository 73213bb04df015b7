//! Core data types for the reading store
//!
//! - `Reading`: a stored sensor observation
//! - `NewReading`: an observation submitted for ingestion
//! - `SensorType`: the kinds of sensor a device can report

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::storage::error::{StorageError, StorageResult};

/// Smallest accepted reading value (inclusive)
pub const MIN_VALUE: i64 = 0;

/// Largest accepted reading value (inclusive)
pub const MAX_VALUE: i64 = 100;

/// Kind of sensor a reading came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Humidity,
}

impl SensorType {
    /// Get all sensor types for iteration
    pub fn all() -> &'static [SensorType] {
        &[SensorType::Temperature, SensorType::Humidity]
    }

    /// Name as stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
        }
    }
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = StorageError;

    /// Exact, case-sensitive match on the stored names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(SensorType::Temperature),
            "humidity" => Ok(SensorType::Humidity),
            other => Err(StorageError::InvalidInput(format!(
                "the sensor type '{}' is not valid (expected temperature or humidity)",
                other
            ))),
        }
    }
}

/// A single stored sensor reading
///
/// Readings are immutable once stored. Identical readings may exist
/// side by side; the store is a multiset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reading {
    pub device_uuid: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub value: i64,
    /// Unix timestamp in seconds
    pub date_created: i64,
}

/// A reading submitted for ingestion
///
/// `date_created` falls back to the current time when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReading {
    pub device_uuid: String,
    pub sensor_type: SensorType,
    pub value: i64,
    pub date_created: Option<i64>,
}

impl NewReading {
    /// Create a reading stamped at ingestion time
    pub fn new(device_uuid: impl Into<String>, sensor_type: SensorType, value: i64) -> Self {
        Self {
            device_uuid: device_uuid.into(),
            sensor_type,
            value,
            date_created: None,
        }
    }

    /// Builder method: set an explicit creation time
    pub fn created_at(mut self, date_created: i64) -> Self {
        self.date_created = Some(date_created);
        self
    }

    /// Check the value bounds and device identifier
    pub fn validate(&self) -> StorageResult<()> {
        if self.device_uuid.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "device_uuid cannot be empty".to_string(),
            ));
        }

        if !(MIN_VALUE..=MAX_VALUE).contains(&self.value) {
            return Err(StorageError::InvalidInput(format!(
                "the sensor value {} is not in the mandatory range of {}-{}",
                self.value, MIN_VALUE, MAX_VALUE
            )));
        }

        Ok(())
    }

    /// Resolve into a stored reading, stamping the current time if needed
    pub fn into_reading(self) -> Reading {
        Reading {
            device_uuid: self.device_uuid,
            sensor_type: self.sensor_type,
            value: self.value,
            date_created: self.date_created.unwrap_or_else(|| Utc::now().timestamp()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_type_parse() {
        assert_eq!("temperature".parse::<SensorType>().unwrap(), SensorType::Temperature);
        assert_eq!("humidity".parse::<SensorType>().unwrap(), SensorType::Humidity);
        assert!("pressure".parse::<SensorType>().is_err());
        assert!("Temperature".parse::<SensorType>().is_err());
    }

    #[test]
    fn test_sensor_type_serde() {
        let json = serde_json::to_string(&SensorType::Humidity).unwrap();
        assert_eq!(json, "\"humidity\"");

        for t in SensorType::all() {
            assert_eq!(t.as_str().parse::<SensorType>().unwrap(), *t);
        }
    }

    #[test]
    fn test_value_bounds() {
        assert!(NewReading::new("dev", SensorType::Temperature, 0).validate().is_ok());
        assert!(NewReading::new("dev", SensorType::Temperature, 100).validate().is_ok());

        let err = NewReading::new("dev", SensorType::Temperature, 150)
            .validate()
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));

        assert!(NewReading::new("dev", SensorType::Humidity, -1).validate().is_err());
        assert!(NewReading::new("  ", SensorType::Humidity, 10).validate().is_err());
    }

    #[test]
    fn test_into_reading_defaults_timestamp() {
        let before = Utc::now().timestamp();
        let reading = NewReading::new("dev", SensorType::Temperature, 22).into_reading();
        assert!(reading.date_created >= before);

        let reading = NewReading::new("dev", SensorType::Temperature, 22)
            .created_at(1_000)
            .into_reading();
        assert_eq!(reading.date_created, 1_000);
    }

    #[test]
    fn test_reading_json_uses_type_key() {
        let reading = Reading {
            device_uuid: "dev".to_string(),
            sensor_type: SensorType::Temperature,
            value: 22,
            date_created: 1_000,
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["type"], "temperature");
        assert_eq!(json["value"], 22);
        assert_eq!(json["date_created"], 1_000);
    }
}
