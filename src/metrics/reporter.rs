use std::collections::BTreeMap;

use serde::Serialize;

use super::naming::{address_key, title_case};
use crate::config::{EndpointConfig, MetricNaming, ProbeConfig};
use crate::prober::ProbeResult;

/// Metric key used by the static naming strategy.
pub const STATIC_METRIC_KEY: &str = "latency";

// ─── Public types ────────────────────────────────────────────────

/// Value type advertised to Mackerel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Integer,
    Float,
}

/// How the single latency metric is named and graphed.
/// Always recomputed from configuration, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// Graph identity, `<prefix>.latency`
    pub graph: String,
    /// Metric name within the graph
    pub key: String,
    /// Graph display title
    pub label: String,
    /// Display name of the one metric
    pub metric_label: String,
    pub unit: Unit,
}

impl MetricDescriptor {
    /// Full name the value line is printed under.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.graph, self.key)
    }
}

// ─── Reporter ────────────────────────────────────────────────────

/// Derive the descriptor. Pure: same inputs, same output.
pub fn describe(probe: &ProbeConfig, subscribe: &EndpointConfig) -> MetricDescriptor {
    let (key, metric_label) = match probe.naming {
        MetricNaming::Address => (address_key(&subscribe.address), subscribe.address.clone()),
        MetricNaming::Static => (STATIC_METRIC_KEY.to_owned(), "Latency".to_owned()),
    };

    MetricDescriptor {
        graph: format!("{}.latency", probe.metric_prefix),
        key,
        label: format!("{} Latency", title_case(&probe.metric_prefix)),
        metric_label,
        unit: Unit::Float,
    }
}

/// Map one probe result to `{key: microseconds}`.
///
/// A failed probe yields an empty map: the data point is absent for the
/// period rather than reported as zero.
pub fn report(
    result: &ProbeResult,
    probe: &ProbeConfig,
    subscribe: &EndpointConfig,
) -> BTreeMap<String, f64> {
    let mut stat = BTreeMap::new();
    if let Ok(latency) = result {
        stat.insert(describe(probe, subscribe).key, latency.as_micros_f64());
    }
    stat
}
