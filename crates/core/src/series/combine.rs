//! Builder composition.

use std::sync::Arc;

use meterwire_domain::{Label, Reading, Series, SeriesError};
use tracing::debug;

use super::grouping::SeriesSet;
use super::{BuildError, SeriesBuilder};

/// Runs several builders over the same batch and merges their output.
#[derive(Clone, Default)]
pub struct CombinedBuilder {
    builders: Vec<Arc<dyn SeriesBuilder>>,
}

impl CombinedBuilder {
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl std::fmt::Debug for CombinedBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedBuilder").field("builders", &self.builders.len()).finish()
    }
}

/// Combines builders so one push cycle can carry mixed reading kinds.
///
/// Series sharing a label set are merged into one, so every label set appears
/// at most once per batch with ascending timestamps. Output is ordered by
/// label set. The first builder error aborts the whole build.
pub fn combine_builders(builders: Vec<Arc<dyn SeriesBuilder>>) -> CombinedBuilder {
    CombinedBuilder { builders }
}

impl SeriesBuilder for CombinedBuilder {
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError> {
        let mut set = SeriesSet::default();
        for builder in &self.builders {
            for series in builder.build(readings)? {
                set.insert_series(series);
            }
        }
        debug!(readings = readings.len(), series = set.len(), "built series batch");
        set.into_series()
    }
}

/// Decorator adding fixed labels (`instance`, `job`, ...) to every series an
/// inner builder produces.
#[derive(Debug, Clone)]
pub struct ExternalLabels<B> {
    inner: B,
    labels: Vec<Label>,
}

impl<B: SeriesBuilder> ExternalLabels<B> {
    pub fn new<I, K, V>(inner: B, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let labels = labels.into_iter().map(|(k, v)| Label::new(k, v)).collect();
        Self { inner, labels }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

impl<B: SeriesBuilder> SeriesBuilder for ExternalLabels<B> {
    fn build(&self, readings: &[Reading]) -> Result<Vec<Series>, BuildError> {
        let series = self.inner.build(readings)?;
        if self.labels.is_empty() {
            return Ok(series);
        }

        series
            .into_iter()
            .map(|s| {
                let (mut labels, samples) = s.into_parts();
                labels.extend(self.labels.iter().cloned());
                Series::new(labels, samples).map_err(|e| match e {
                    SeriesError::DuplicateLabel(name) => BuildError::LabelCollision(name),
                    other => BuildError::Series(other),
                })
            })
            .collect()
    }
}
