pub mod graph;
pub mod naming;
pub mod reporter;

pub use graph::{GraphDefinition, Graphs, MetricDefinition};
pub use reporter::{describe, report, MetricDescriptor, Unit};
