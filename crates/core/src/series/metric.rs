//! Series for generic named gauges.

use once_cell::sync::Lazy;
use regex::Regex;

use meterwire_common::time::TimestampQuantization;
use meterwire_domain::constants::RESERVED_LABEL_PREFIX;
use meterwire_domain::{Label, MetricReading, Reading, Sample, Series};

use super::grouping::SeriesSet;
use super::{BuildError, SeriesBuilder};

#[allow(clippy::expect_used)]
static METRIC_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("valid metric name regex"));

#[allow(clippy::expect_used)]
static LABEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid label name regex"));

/// Returns `true` if `name` is a legal metric name.
pub fn is_valid_metric_name(name: &str) -> bool {
    METRIC_NAME_RE.is_match(name)
}

/// Returns `true` if `name` may be used as a user-supplied label name.
///
/// Names starting with `__` are reserved for the protocol.
pub fn is_valid_label_name(name: &str) -> bool {
    LABEL_NAME_RE.is_match(name) && !name.starts_with(RESERVED_LABEL_PREFIX)
}

/// Emits one series per metric name and label set.
///
/// Metric and label names are validated; a single bad reading fails the
/// whole batch. Timestamps default to the nearest second.
#[derive(Debug, Clone, Copy)]
pub struct MetricSeriesBuilder {
    quantization: TimestampQuantization,
}

impl Default for MetricSeriesBuilder {
    fn default() -> Self {
        Self { quantization: TimestampQuantization::ROUND_SECOND }
    }
}

impl MetricSeriesBuilder {
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

fn validate(metric: &MetricReading) -> Result<(), BuildError> {
    if !is_valid_metric_name(&metric.name) {
        return Err(BuildError::InvalidMetricName(metric.name.clone()));
    }
    if let Some(bad) = metric.labels.keys().find(|name| !is_valid_label_name(name)) {
        return Err(BuildError::InvalidLabelName {
            metric: metric.name.clone(),
            label: bad.clone(),
        });
    }
    Ok(())
}

impl SeriesBuilder for MetricSeriesBuilder {
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError> {
        let mut set = SeriesSet::default();

        for reading in readings {
            let Reading::Metric(metric) = reading else { continue };
            validate(metric)?;

            let dims: Vec<Label> =
                metric.labels.iter().map(|(name, value)| Label::new(name.as_str(), value.as_str())).collect();
            let ts = self.quantization.apply(&metric.timestamp);

            set.push(&metric.name, &dims, Sample::new(metric.value, ts));
        }

        set.into_series()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_metric_name("grid_power_watts"));
        assert!(is_valid_metric_name("ns:rate5m"));
        assert!(!is_valid_metric_name("9lives"));
        assert!(!is_valid_metric_name("power-watts"));
        assert!(!is_valid_metric_name(""));

        assert!(is_valid_label_name("phase"));
        assert!(!is_valid_label_name("__name__"));
        assert!(!is_valid_label_name("__meta"));
        assert!(!is_valid_label_name("a:b"));
    }

    #[test]
    fn groups_by_name_and_label_set() {
        let readings = vec![
            Reading::Metric(MetricReading::new("meter_voltage_volts", 230.0, at()).with_label("phase", "l1")),
            Reading::Metric(MetricReading::new("meter_voltage_volts", 231.0, at()).with_label("phase", "l2")),
            Reading::Metric(
                MetricReading::new("meter_voltage_volts", 229.0, at() + chrono::Duration::seconds(1))
                    .with_label("phase", "l1"),
            ),
        ];

        let series = MetricSeriesBuilder::new().build(&readings).unwrap();
        assert_eq!(series.len(), 2);

        let l1 = series.iter().find(|s| s.label("phase") == Some("l1")).unwrap();
        assert_eq!(l1.samples().len(), 2);
        assert_eq!(l1.metric_name(), "meter_voltage_volts");
    }

    #[test]
    fn invalid_names_fail_the_batch() {
        let bad_name = vec![Reading::Metric(MetricReading::new("bad-name", 1.0, at()))];
        assert_eq!(
            MetricSeriesBuilder::new().build(&bad_name).unwrap_err(),
            BuildError::InvalidMetricName("bad-name".into())
        );

        let bad_label =
            vec![Reading::Metric(MetricReading::new("ok", 1.0, at()).with_label("__name__", "x"))];
        assert!(matches!(
            MetricSeriesBuilder::new().build(&bad_label).unwrap_err(),
            BuildError::InvalidLabelName { label, .. } if label == "__name__"
        ));
    }

    #[test]
    fn rounds_to_second_by_default() {
        let ts = at() + chrono::Duration::milliseconds(1_500);
        let readings = vec![Reading::Metric(MetricReading::new("m", 1.0, ts))];

        let series = MetricSeriesBuilder::new().build(&readings).unwrap();
        assert_eq!(series[0].samples()[0].timestamp_ms, at().timestamp_millis() + 2_000);
    }
}
