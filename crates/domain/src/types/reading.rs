//! Sensor readings produced by external collectors.
//!
//! A [`Reading`] is one timestamped observation. Producers construct it and
//! hand it to the ring buffer; from then on it is only moved or cloned,
//! never mutated.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use meterwire_common::collections::BufferEntry;
use serde::{Deserialize, Serialize};

/// Kind discriminator for [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingKind {
    Ble,
    Thermostat,
    Metric,
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ble => write!(f, "ble"),
            Self::Thermostat => write!(f, "thermostat"),
            Self::Metric => write!(f, "metric"),
        }
    }
}

/// Advertisement decoded from a BLE temperature/humidity sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleReading {
    pub timestamp: DateTime<Utc>,
    pub mac: String,
    pub sensor_id: String,
    pub sensor_name: String,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub battery_percent: f64,
    pub battery_voltage: Option<f64>,
    pub rssi_dbm: Option<i16>,
}

/// Room state polled from a smart-thermostat API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatReading {
    pub timestamp: DateTime<Utc>,
    pub room_id: String,
    pub room_name: String,
    pub temperature_celsius: f64,
    pub setpoint_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub heating_power_percent: Option<f64>,
}

/// Generic named gauge, e.g. a value scraped from a meter's HTTP endpoint.
///
/// `labels` is an unordered label set; it is kept in a `BTreeMap` so equal
/// sets compare and group identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl MetricReading {
    /// Creates a reading with no dimension labels.
    pub fn new(name: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, name: name.into(), value, labels: BTreeMap::new() }
    }

    /// Adds (or replaces) a dimension label.
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }
}

/// One observation from any supported source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Ble(BleReading),
    Thermostat(ThermostatReading),
    Metric(MetricReading),
}

impl Reading {
    /// Point in time the observation was made.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Ble(r) => r.timestamp,
            Self::Thermostat(r) => r.timestamp,
            Self::Metric(r) => r.timestamp,
        }
    }

    pub fn kind(&self) -> ReadingKind {
        match self {
            Self::Ble(_) => ReadingKind::Ble,
            Self::Thermostat(_) => ReadingKind::Thermostat,
            Self::Metric(_) => ReadingKind::Metric,
        }
    }

    /// Human-identifiable source token: MAC address, room id or metric name.
    pub fn source_id(&self) -> &str {
        match self {
            Self::Ble(r) => &r.mac,
            Self::Thermostat(r) => &r.room_id,
            Self::Metric(r) => &r.name,
        }
    }
}

impl From<BleReading> for Reading {
    fn from(reading: BleReading) -> Self {
        Self::Ble(reading)
    }
}

impl From<ThermostatReading> for Reading {
    fn from(reading: ThermostatReading) -> Self {
        Self::Thermostat(reading)
    }
}

impl From<MetricReading> for Reading {
    fn from(reading: MetricReading) -> Self {
        Self::Metric(reading)
    }
}

impl BufferEntry for Reading {
    fn entry_id(&self) -> String {
        format!("{}:{}", self.kind(), self.source_id())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 26, 17, 30, 15).unwrap()
    }

    fn ble() -> BleReading {
        BleReading {
            timestamp: ts(),
            mac: "A4:C1:38:00:11:22".into(),
            sensor_id: "living".into(),
            sensor_name: "Living Room".into(),
            temperature_celsius: 21.5,
            humidity_percent: 48.0,
            battery_percent: 87.0,
            battery_voltage: Some(2.98),
            rssi_dbm: Some(-71),
        }
    }

    #[test]
    fn accessors_dispatch_per_variant() {
        let reading = Reading::from(ble());
        assert_eq!(reading.kind(), ReadingKind::Ble);
        assert_eq!(reading.source_id(), "A4:C1:38:00:11:22");
        assert_eq!(reading.timestamp(), ts());

        let metric = Reading::from(MetricReading::new("grid_power_watts", 1520.0, ts()));
        assert_eq!(metric.kind(), ReadingKind::Metric);
        assert_eq!(metric.source_id(), "grid_power_watts");
    }

    #[test]
    fn entry_id_names_kind_and_source() {
        let reading = Reading::Thermostat(ThermostatReading {
            timestamp: ts(),
            room_id: "r-12".into(),
            room_name: "Office".into(),
            temperature_celsius: 20.0,
            setpoint_celsius: None,
            humidity_percent: None,
            heating_power_percent: None,
        });
        assert_eq!(reading.entry_id(), "thermostat:r-12");
    }

    #[test]
    fn serde_uses_kind_tag() {
        let reading = Reading::from(
            MetricReading::new("meter_voltage_volts", 230.1, ts()).with_label("phase", "l1"),
        );
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["kind"], "metric");
        assert_eq!(json["labels"]["phase"], "l1");

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, reading);
    }
}
