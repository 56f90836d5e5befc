//! Mackerel agent plugin protocol.
//!
//! The agent runs the binary once per period and reads stdout:
//! - with `MACKEREL_AGENT_PLUGIN_META` set, a header line followed by the
//!   graph definitions as JSON
//! - otherwise, one `name\tvalue\tepoch` line per metric

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::metrics::{Graphs, MetricDescriptor};

pub const META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";
const META_HEADER: &str = "# mackerel-agent-plugin";

/// True when the agent is asking for graph definitions instead of values.
pub fn is_meta_request() -> bool {
    std::env::var_os(META_ENV).is_some_and(|v| !v.is_empty())
}

// ─── Output ──────────────────────────────────────────────────────

pub fn output_definitions<W: Write>(out: &mut W, descriptor: &MetricDescriptor) -> anyhow::Result<()> {
    let json = serde_json::to_string(&Graphs::from(descriptor))?;
    writeln!(out, "{META_HEADER}")?;
    writeln!(out, "{json}")?;
    Ok(())
}

/// Print every reported value under `<graph>.<key>`. An empty map prints
/// nothing.
pub fn output_values<W: Write>(
    out: &mut W,
    descriptor: &MetricDescriptor,
    stat: &BTreeMap<String, f64>,
    epoch: i64,
) -> anyhow::Result<()> {
    for (key, value) in stat {
        writeln!(out, "{}.{}\t{:.6}\t{}", descriptor.graph, key, value, epoch)?;
    }
    Ok(())
}

// ─── Tempfile state ──────────────────────────────────────────────

/// Last emitted values, kept for the agent's diff bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedValues {
    pub values: BTreeMap<String, f64>,
    pub last_time: i64,
}

pub fn save_values(path: &Path, stat: &BTreeMap<String, f64>, epoch: i64) -> anyhow::Result<()> {
    let state = SavedValues {
        values: stat.clone(),
        last_time: epoch,
    };
    let json = serde_json::to_vec(&state)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_values(path: &Path) -> anyhow::Result<SavedValues> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}
