//! Integration tests for readings and series types
//!
//! Covers readings flowing through the ring buffer and series assembled from
//! many out-of-order samples.

use chrono::{Duration, TimeZone, Utc};
use meterwire_common::collections::RingBuffer;
use meterwire_domain::{
    BleReading, Label, MetricReading, Reading, Sample, Series, SeriesError, ThermostatReading,
};

// ============================================================================
// Reading + RingBuffer Integration Tests
// ============================================================================

/// Test mixed reading kinds surviving overwrite in a shared buffer
///
/// Scenario: three producers of different kinds overflow a small buffer
#[test]
fn test_mixed_readings_in_ring_buffer() {
    let base = Utc.with_ymd_and_hms(2025, 10, 26, 17, 0, 0).unwrap();
    let buffer: RingBuffer<Reading> = RingBuffer::new(3).unwrap();

    buffer.add(Reading::Ble(BleReading {
        timestamp: base,
        mac: "A4:C1:38:00:00:01".into(),
        sensor_id: "kitchen".into(),
        sensor_name: "Kitchen".into(),
        temperature_celsius: 22.1,
        humidity_percent: 51.0,
        battery_percent: 90.0,
        battery_voltage: None,
        rssi_dbm: None,
    }));
    buffer.add(Reading::Thermostat(ThermostatReading {
        timestamp: base + Duration::seconds(1),
        room_id: "r-1".into(),
        room_name: "Bedroom".into(),
        temperature_celsius: 19.5,
        setpoint_celsius: Some(20.0),
        humidity_percent: None,
        heating_power_percent: Some(35.0),
    }));
    for i in 0..2 {
        buffer.add(Reading::Metric(MetricReading::new(
            "grid_power_watts",
            1000.0 + f64::from(i),
            base + Duration::seconds(2 + i64::from(i)),
        )));
    }

    let readings = buffer.get_all_and_clear();

    // The BLE reading was the oldest and got evicted
    assert_eq!(buffer.evicted_count(), 1);
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0].source_id(), "r-1");
    assert!(readings.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
}

// ============================================================================
// Series Integration Tests
// ============================================================================

/// Test a series assembled from shuffled samples with duplicates
///
/// Scenario: a scrape loop delivered late and repeated readings
#[test]
fn test_series_normalizes_out_of_order_samples() {
    let samples: Vec<Sample> = [5, 1, 4, 2, 3, 2, 5]
        .iter()
        .enumerate()
        .map(|(i, t)| Sample::new(i as f64, t * 1_000))
        .collect();

    let series = Series::named(
        "meter_energy_kwh",
        vec![Label::new("meter", "main"), Label::new("phase", "l1")],
        samples,
    )
    .unwrap();

    let timestamps: Vec<i64> = series.samples().iter().map(|s| s.timestamp_ms).collect();
    assert_eq!(timestamps, vec![1_000, 2_000, 3_000, 4_000, 5_000]);

    // Last occurrence wins for duplicated timestamps
    assert_eq!(series.samples()[1].value, 5.0);
    assert_eq!(series.samples()[4].value, 6.0);

    let name_labels = series.labels().iter().filter(|l| l.name == "__name__").count();
    assert_eq!(name_labels, 1);
}

/// Test that label ordering is independent of insertion order
#[test]
fn test_series_identity_is_order_independent() {
    let a = Series::named("m", vec![Label::new("b", "2"), Label::new("a", "1")], vec![]).unwrap();
    let b = Series::named("m", vec![Label::new("a", "1"), Label::new("b", "2")], vec![]).unwrap();

    assert_eq!(a.labels(), b.labels());
}

/// Test error surface for invalid label sets
#[test]
fn test_series_error_messages() {
    let err = Series::new(vec![], vec![]).unwrap_err();
    assert_eq!(err, SeriesError::MissingName);
    assert_eq!(err.to_string(), "series has no __name__ label");

    let err = Series::named("m", vec![Label::new("x", "1"), Label::new("x", "2")], vec![])
        .unwrap_err();
    assert_eq!(err.to_string(), "duplicate label name: x");
}
