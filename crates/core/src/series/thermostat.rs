//! Series for smart-thermostat rooms.

use meterwire_common::time::TimestampQuantization;
use meterwire_domain::{Label, Reading, Sample, Series};

use super::grouping::SeriesSet;
use super::{BuildError, SeriesBuilder};

pub const THERMOSTAT_TEMPERATURE_CELSIUS: &str = "thermostat_temperature_celsius";
pub const THERMOSTAT_SETPOINT_CELSIUS: &str = "thermostat_setpoint_celsius";
pub const THERMOSTAT_HUMIDITY_PERCENT: &str = "thermostat_humidity_percent";
pub const THERMOSTAT_HEATING_POWER_PERCENT: &str = "thermostat_heating_power_percent";

/// Emits one series per room and measured dimension, labeled `room_id` and
/// `room_name`.
///
/// Thermostat APIs are polled at a coarse rate, so timestamps default to
/// the nearest ten seconds to line rooms up with each other.
#[derive(Debug, Clone, Copy)]
pub struct ThermostatSeriesBuilder {
    quantization: TimestampQuantization,
}

impl Default for ThermostatSeriesBuilder {
    fn default() -> Self {
        Self { quantization: TimestampQuantization::ROUND_TEN_SECONDS }
    }
}

impl ThermostatSeriesBuilder {
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

impl SeriesBuilder for ThermostatSeriesBuilder {
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError> {
        let mut set = SeriesSet::default();

        for reading in readings {
            let Reading::Thermostat(room) = reading else { continue };

            let ts = self.quantization.apply(&room.timestamp);
            let dims = [
                Label::new("room_id", room.room_id.as_str()),
                Label::new("room_name", room.room_name.as_str()),
            ];

            set.push(THERMOSTAT_TEMPERATURE_CELSIUS, &dims, Sample::new(room.temperature_celsius, ts));
            set.push_opt(THERMOSTAT_SETPOINT_CELSIUS, &dims, room.setpoint_celsius, ts);
            set.push_opt(THERMOSTAT_HUMIDITY_PERCENT, &dims, room.humidity_percent, ts);
            set.push_opt(THERMOSTAT_HEATING_POWER_PERCENT, &dims, room.heating_power_percent, ts);
        }

        set.into_series()
    }
}
