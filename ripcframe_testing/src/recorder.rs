//! Capturing metrics emitted by `ripcframe` during a test.

use metrics_util::debugging::{DebugValue, DebuggingRecorder};

/// Counters and gauges recorded while a closure ran.
#[derive(Debug, Default)]
pub struct CapturedMetrics {
    entries: Vec<(String, Vec<(String, String)>, DebugValue)>,
}

impl CapturedMetrics {
    /// Sum of every counter named `name` whose labels include `labels`.
    #[must_use]
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.matching(name, labels)
            .filter_map(|value| match value {
                DebugValue::Counter(count) => Some(*count),
                _ => None,
            })
            .sum()
    }

    /// Last value of the gauge named `name`, if it was touched.
    #[must_use]
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.matching(name, &[]).find_map(|value| match value {
            DebugValue::Gauge(gauge) => Some(gauge.into_inner()),
            _ => None,
        })
    }

    fn matching<'a>(
        &'a self,
        name: &'a str,
        labels: &'a [(&'a str, &'a str)],
    ) -> impl Iterator<Item = &'a DebugValue> + 'a {
        self.entries
            .iter()
            .filter(move |(key, entry_labels, _)| {
                key == name
                    && labels.iter().all(|(k, v)| {
                        entry_labels
                            .iter()
                            .any(|(ek, ev)| ek == k && ev == v)
                    })
            })
            .map(|(_, _, value)| value)
    }
}

/// Run `f` with a local debugging recorder and return what it recorded.
pub fn capture_metrics<R>(f: impl FnOnce() -> R) -> (R, CapturedMetrics) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let result = metrics::with_local_recorder(&recorder, f);
    let entries = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(key, _, _, value)| {
            let key = key.key();
            let labels = key
                .labels()
                .map(|label| (label.key().to_owned(), label.value().to_owned()))
                .collect();
            (key.name().to_owned(), labels, value)
        })
        .collect();
    (result, CapturedMetrics { entries })
}
