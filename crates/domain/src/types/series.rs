//! Labeled time series, the unit of delivery in the remote-write protocol.
//!
//! A [`Series`] can only be built through [`Series::new`], which enforces
//! the invariants every endpoint expects:
//! - exactly one `__name__` label
//! - label names are non-empty and unique
//! - labels are ordered by name
//! - samples are ordered by ascending timestamp, one sample per timestamp

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::METRIC_NAME_LABEL;

/// A `(name, value)` pair identifying one dimension of a series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// One data point: a value at an epoch-millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    pub timestamp_ms: i64,
}

impl Sample {
    pub const fn new(value: f64, timestamp_ms: i64) -> Self {
        Self { value, timestamp_ms }
    }
}

/// Invariant violations detected while assembling a [`Series`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("series has no __name__ label")]
    MissingName,

    #[error("series has an empty __name__ value")]
    EmptyName,

    #[error("label names must not be empty")]
    EmptyLabelName,

    #[error("duplicate label name: {0}")]
    DuplicateLabel(String),
}

/// A uniquely-labeled, time-ordered sequence of samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    labels: Vec<Label>,
    samples: Vec<Sample>,
}

impl Series {
    /// Validates labels and normalizes ordering.
    ///
    /// Samples are sorted by timestamp with a stable sort; when several
    /// samples share a timestamp the one that came last in `samples` wins.
    ///
    /// # Errors
    /// Returns [`SeriesError`] when the label set is not a valid series
    /// identity.
    pub fn new(mut labels: Vec<Label>, samples: Vec<Sample>) -> Result<Self, SeriesError> {
        labels.sort_by(|a, b| a.name.cmp(&b.name));

        if labels.iter().any(|l| l.name.is_empty()) {
            return Err(SeriesError::EmptyLabelName);
        }
        if let Some(dup) = labels.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(SeriesError::DuplicateLabel(dup[0].name.clone()));
        }
        match labels.iter().find(|l| l.name == METRIC_NAME_LABEL) {
            None => return Err(SeriesError::MissingName),
            Some(l) if l.value.is_empty() => return Err(SeriesError::EmptyName),
            Some(_) => {}
        }

        Ok(Self { labels, samples: normalize_samples(samples) })
    }

    /// Convenience constructor taking the metric name separately from the
    /// dimension labels.
    ///
    /// # Errors
    /// Same as [`Series::new`]; a `__name__` entry in `dimensions` is a
    /// duplicate.
    pub fn named<I>(name: &str, dimensions: I, samples: Vec<Sample>) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = Label>,
    {
        let mut labels = vec![Label::new(METRIC_NAME_LABEL, name)];
        labels.extend(dimensions);
        Self::new(labels, samples)
    }

    /// Value of the `__name__` label.
    pub fn metric_name(&self) -> &str {
        self.label(METRIC_NAME_LABEL).unwrap_or_default()
    }

    /// Looks up a label value by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|idx| self.labels[idx].value.as_str())
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Returns a copy of this series with an extra label.
    ///
    /// # Errors
    /// Returns [`SeriesError::DuplicateLabel`] if the name is already used.
    pub fn with_label(&self, label: Label) -> Result<Self, SeriesError> {
        let mut labels = self.labels.clone();
        labels.push(label);
        Self::new(labels, self.samples.clone())
    }

    pub fn into_parts(self) -> (Vec<Label>, Vec<Sample>) {
        (self.labels, self.samples)
    }
}

fn normalize_samples(mut samples: Vec<Sample>) -> Vec<Sample> {
    samples.sort_by_key(|s| s.timestamp_ms);

    let mut out: Vec<Sample> = Vec::with_capacity(samples.len());
    for sample in samples {
        match out.last_mut() {
            Some(last) if last.timestamp_ms == sample.timestamp_ms => *last = sample,
            _ => out.push(sample),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sorted_by_name() {
        let series = Series::named(
            "ble_temperature_celsius",
            vec![Label::new("sensor_id", "a"), Label::new("mac", "m")],
            vec![],
        )
        .unwrap();

        let names: Vec<_> = series.labels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["__name__", "mac", "sensor_id"]);
        assert_eq!(series.metric_name(), "ble_temperature_celsius");
        assert_eq!(series.label("mac"), Some("m"));
        assert_eq!(series.label("room_id"), None);
    }

    #[test]
    fn rejects_missing_and_duplicate_names() {
        assert_eq!(
            Series::new(vec![Label::new("job", "x")], vec![]).unwrap_err(),
            SeriesError::MissingName
        );
        assert_eq!(
            Series::named("m", vec![Label::new("job", "a"), Label::new("job", "b")], vec![])
                .unwrap_err(),
            SeriesError::DuplicateLabel("job".into())
        );
        assert_eq!(
            Series::named("m", vec![Label::new("__name__", "other")], vec![]).unwrap_err(),
            SeriesError::DuplicateLabel("__name__".into())
        );
        assert_eq!(
            Series::named("m", vec![Label::new("", "v")], vec![]).unwrap_err(),
            SeriesError::EmptyLabelName
        );
        assert_eq!(Series::named("", vec![], vec![]).unwrap_err(), SeriesError::EmptyName);
    }

    #[test]
    fn samples_sorted_and_collapsed_last_wins() {
        let series = Series::named(
            "m",
            vec![],
            vec![Sample::new(3.0, 3_000), Sample::new(1.0, 1_000), Sample::new(1.5, 1_000)],
        )
        .unwrap();

        assert_eq!(series.samples(), &[Sample::new(1.5, 1_000), Sample::new(3.0, 3_000)]);
    }

    #[test]
    fn with_label_rejects_collision() {
        let series = Series::named("m", vec![Label::new("job", "a")], vec![]).unwrap();

        let extended = series.with_label(Label::new("instance", "host-1")).unwrap();
        assert_eq!(extended.label("instance"), Some("host-1"));

        assert_eq!(
            series.with_label(Label::new("job", "b")).unwrap_err(),
            SeriesError::DuplicateLabel("job".into())
        );
    }
}
