//! Series for BLE temperature/humidity sensors.

use meterwire_common::time::TimestampQuantization;
use meterwire_domain::{Label, Reading, Sample, Series};

use super::grouping::SeriesSet;
use super::{BuildError, SeriesBuilder};

pub const BLE_TEMPERATURE_CELSIUS: &str = "ble_temperature_celsius";
pub const BLE_HUMIDITY_PERCENT: &str = "ble_humidity_percent";
pub const BLE_BATTERY_PERCENT: &str = "ble_battery_percent";
pub const BLE_BATTERY_VOLTAGE_VOLTS: &str = "ble_battery_voltage_volts";
pub const BLE_RSSI_DBM: &str = "ble_rssi_dbm";

/// Emits temperature, humidity and battery series per sensor, plus battery
/// voltage and signal strength when the advertisement carried them.
///
/// Series are labeled `sensor_id`, `sensor_name` and `mac`. Timestamps are
/// kept at millisecond precision unless configured otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct BleSeriesBuilder {
    quantization: TimestampQuantization,
}

impl BleSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quantization(mut self, quantization: TimestampQuantization) -> Self {
        self.quantization = quantization;
        self
    }

    pub fn quantization(&self) -> TimestampQuantization {
        self.quantization
    }
}

impl SeriesBuilder for BleSeriesBuilder {
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError> {
        let mut set = SeriesSet::default();

        for reading in readings {
            let Reading::Ble(ble) = reading else { continue };

            let ts = self.quantization.apply(&ble.timestamp);
            let dims = [
                Label::new("sensor_id", ble.sensor_id.as_str()),
                Label::new("sensor_name", ble.sensor_name.as_str()),
                Label::new("mac", ble.mac.as_str()),
            ];

            set.push(BLE_TEMPERATURE_CELSIUS, &dims, Sample::new(ble.temperature_celsius, ts));
            set.push(BLE_HUMIDITY_PERCENT, &dims, Sample::new(ble.humidity_percent, ts));
            set.push(BLE_BATTERY_PERCENT, &dims, Sample::new(ble.battery_percent, ts));
            set.push_opt(BLE_BATTERY_VOLTAGE_VOLTS, &dims, ble.battery_voltage, ts);
            set.push_opt(BLE_RSSI_DBM, &dims, ble.rssi_dbm.map(f64::from), ts);
        }

        set.into_series()
    }
}
