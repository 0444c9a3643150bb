use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use meterwire_common::collections::RingBuffer;
use meterwire_domain::{BleReading, MetricReading, Reading, ThermostatReading};
use meterwire_infra::http::RemoteWriteClient;
use meterwire_infra::push::PusherConfig;
use wiremock::MockServer;

pub const WRITE_PATH: &str = "/api/v1/write";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 26, 17, 30, 0).unwrap()
}

pub fn ble(sensor: &str, offset_secs: i64) -> Reading {
    BleReading {
        timestamp: base_time() + chrono::Duration::seconds(offset_secs),
        mac: format!("AA:BB:CC:00:00:{sensor}"),
        sensor_id: sensor.to_string(),
        sensor_name: format!("sensor {sensor}"),
        temperature_celsius: 21.5,
        humidity_percent: 48.0,
        battery_percent: 90.0,
        battery_voltage: Some(2.9),
        rssi_dbm: Some(-70),
    }
    .into()
}

pub fn thermostat(room: &str, offset_secs: i64) -> Reading {
    ThermostatReading {
        timestamp: base_time() + chrono::Duration::seconds(offset_secs),
        room_id: room.to_string(),
        room_name: format!("room {room}"),
        temperature_celsius: 20.0,
        setpoint_celsius: Some(21.0),
        humidity_percent: None,
        heating_power_percent: Some(35.0),
    }
    .into()
}

pub fn metric(value: f64, offset_secs: i64) -> Reading {
    MetricReading::new("meter_power_watts", value, base_time() + chrono::Duration::seconds(offset_secs))
        .with_label("meter", "main")
        .into()
}

pub fn buffer(capacity: usize) -> Arc<RingBuffer<Reading>> {
    Arc::new(RingBuffer::new(capacity).expect("non-zero capacity"))
}

pub fn client_for(server: &MockServer) -> Arc<RemoteWriteClient> {
    Arc::new(
        RemoteWriteClient::builder(format!("{}{WRITE_PATH}", server.uri()))
            .timeout(Duration::from_secs(2))
            .build()
            .expect("client should build"),
    )
}

/// Fast retries so real-time tests stay short.
pub fn fast_config() -> PusherConfig {
    PusherConfig {
        interval: Duration::from_millis(50),
        base_backoff: Duration::from_millis(10),
        shutdown_flush_timeout: Duration::from_secs(2),
        ..PusherConfig::default()
    }
}
