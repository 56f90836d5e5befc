//! Redis pub/sub round-trip latency probe for the Mackerel agent.
//!
//! Each invocation opens a publish and a subscribe connection, publishes
//! one message on the probe channel after the subscription is
//! acknowledged, and times how long it takes to come back.
//!
//! ```bash
//! mackerel-plugin-redis-latency --pubaddr 10.0.0.1:6379 --subaddr 10.0.0.2:6379
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod plugin;
pub mod prober;
pub mod redis_client;

pub use config::{EndpointConfig, MetricNaming, PluginConfig, ProbeConfig};
pub use error::{FailureKind, ProbeError};
pub use prober::{probe, Latency, ProbeResult};

/// Provision both connections and run a single probe.
pub async fn measure(config: &PluginConfig) -> ProbeResult {
    let (mut publisher, subscriber) =
        redis_client::connect_pair(&config.publish, &config.subscribe, config.probe.timeout)
            .await?;
    probe(&mut publisher, subscriber, &config.probe).await
}
