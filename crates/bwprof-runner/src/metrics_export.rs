//! Metrics capture and export for a single run.
//!
//! A run records into its own [`DebuggingRecorder`], scoped to the calling
//! thread, and the snapshot is turned into a serialisable [`MetricsExport`].

use std::collections::BTreeMap;
use std::fmt;

use bwprof_metrics::metrics;
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde::Serialize;

/// Value of one metric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetricValue {
    /// Counter total.
    Counter { value: u64 },
    /// Last gauge value.
    Gauge { value: f64 },
    /// Number of recorded samples and their sum.
    Histogram { count: usize, sum: f64 },
}

/// One metric series: a name plus its label set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    /// Recorded value, flattened next to `name` in JSON.
    #[serde(flatten)]
    pub value: MetricValue,
}

/// All series recorded during a run, sorted by name then labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsExport {
    pub metrics: Vec<MetricSample>,
}

impl MetricsExport {
    /// Take a snapshot of everything recorded so far.
    pub fn from_snapshotter(snapshotter: &Snapshotter) -> Self {
        let mut samples: Vec<MetricSample> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(composite, _unit, _description, value)| {
                let key = composite.key();
                let labels = key
                    .labels()
                    .map(|label| (label.key().to_string(), label.value().to_string()))
                    .collect();
                let value = match value {
                    DebugValue::Counter(value) => MetricValue::Counter { value },
                    DebugValue::Gauge(value) => MetricValue::Gauge { value: value.0 },
                    DebugValue::Histogram(values) => MetricValue::Histogram {
                        count: values.len(),
                        sum: values.iter().map(|v| v.0).sum(),
                    },
                };
                MetricSample {
                    name: key.name().to_string(),
                    labels,
                    value,
                }
            })
            .collect();
        samples.sort_by(|a, b| (&a.name, &a.labels).cmp(&(&b.name, &b.labels)));
        MetricsExport { metrics: samples }
    }

    /// Sum of a counter across every series whose labels include `labels`.
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.metrics
            .iter()
            .filter(|sample| sample.name == name)
            .filter(|sample| {
                labels
                    .iter()
                    .all(|(k, v)| sample.labels.get(*k).map(String::as_str) == Some(*v))
            })
            .map(|sample| match sample.value {
                MetricValue::Counter { value } => value,
                _ => 0,
            })
            .sum()
    }

    /// Current value of an unlabelled gauge.
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find_map(|sample| match sample.value {
            MetricValue::Gauge { value } if sample.name == name => Some(value),
            _ => None,
        })
    }
}

impl fmt::Display for MetricsExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sample in &self.metrics {
            let labels: Vec<String> = sample
                .labels
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "{}{{{}}} ", sample.name, labels.join(","))?;
            match sample.value {
                MetricValue::Counter { value } => writeln!(f, "{}", value)?,
                MetricValue::Gauge { value } => writeln!(f, "{}", value)?,
                MetricValue::Histogram { count, sum } => {
                    writeln!(f, "count={} sum={}", count, sum)?
                }
            }
        }
        Ok(())
    }
}

/// Run `f` with a fresh recorder installed for this thread and return its
/// result together with everything it recorded.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, MetricsExport) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let result = metrics::with_local_recorder(&recorder, || {
        bwprof_metrics::describe_metrics();
        f()
    });
    (result, MetricsExport::from_snapshotter(&snapshotter))
}
