//! Accumulates samples per label set while a builder walks its batch.

use std::collections::BTreeMap;

use meterwire_domain::constants::METRIC_NAME_LABEL;
use meterwire_domain::{Label, Sample, Series};

use super::BuildError;

/// Samples keyed by their full, sorted label set.
///
/// Output order follows the label sets, so the same batch always yields the
/// same series order.
#[derive(Debug, Default)]
pub(crate) struct SeriesSet {
    groups: BTreeMap<Vec<Label>, Vec<Sample>>,
}

impl SeriesSet {
    /// Records one sample for `name` with the given dimensions.
    ///
    /// Dimensions with an empty value are omitted.
    pub(crate) fn push(&mut self, name: &str, dimensions: &[Label], sample: Sample) {
        let mut key: Vec<Label> = Vec::with_capacity(dimensions.len() + 1);
        key.push(Label::new(METRIC_NAME_LABEL, name));
        key.extend(dimensions.iter().filter(|l| !l.value.is_empty()).cloned());
        key.sort();

        self.groups.entry(key).or_default().push(sample);
    }

    pub(crate) fn push_opt(&mut self, name: &str, dimensions: &[Label], value: Option<f64>, ts: i64) {
        if let Some(value) = value {
            self.push(name, dimensions, Sample::new(value, ts));
        }
    }

    /// Merges an already-built series into the set.
    ///
    /// Samples for a label set seen earlier are appended after the existing
    /// ones, so on equal timestamps the later series wins.
    pub(crate) fn insert_series(&mut self, series: Series) {
        let (mut labels, samples) = series.into_parts();
        labels.sort();
        self.groups.entry(labels).or_default().extend(samples);
    }

    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn into_series(self) -> Result<Vec<Series>, BuildError> {
        self.groups
            .into_iter()
            .map(|(labels, samples)| Series::new(labels, samples).map_err(BuildError::from))
            .collect()
    }
}
