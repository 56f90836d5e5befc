use std::collections::BTreeMap;

use serde::Serialize;

use super::reporter::{MetricDescriptor, Unit};

/// Graph definitions keyed by graph name, shipped to the agent on a
/// metadata request.
#[derive(Debug, Clone, Serialize)]
pub struct Graphs {
    pub graphs: BTreeMap<String, GraphDefinition>,
}

/// One graph as the agent expects it.
#[derive(Debug, Clone, Serialize)]
pub struct GraphDefinition {
    pub label: String,
    pub unit: Unit,
    pub metrics: Vec<MetricDefinition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDefinition {
    pub name: String,
    pub label: String,
    pub stacked: bool,
}

impl From<&MetricDescriptor> for Graphs {
    fn from(d: &MetricDescriptor) -> Self {
        let graph = GraphDefinition {
            label: d.label.clone(),
            unit: d.unit,
            metrics: vec![MetricDefinition {
                name: d.key.clone(),
                label: d.metric_label.clone(),
                stacked: false,
            }],
        };

        Self {
            graphs: BTreeMap::from([(d.graph.clone(), graph)]),
        }
    }
}
