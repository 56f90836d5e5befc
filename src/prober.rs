use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::ProbeConfig;
use crate::error::ProbeError;

// ─── Bus seams ───────────────────────────────────────────────────

/// Publishing side of the bus.
#[async_trait]
pub trait Publisher: Send {
    /// Publish and wait for the server's acknowledgment.
    async fn publish(&mut self, channel: &str, message: &str) -> Result<(), ProbeError>;
}

/// Subscribing side of the bus. Consumed by `subscribe` so a connection
/// backs at most one subscription.
#[async_trait]
pub trait Subscriber: Send {
    type Subscription: Subscription;

    /// Resolves only once the server has acknowledged the subscription.
    async fn subscribe(self, channel: &str) -> Result<Self::Subscription, ProbeError>;
}

/// An acknowledged subscription. Dropping it without `close` must still
/// release the underlying connection.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next message on the channel and return its payload.
    async fn receive(&mut self) -> Result<String, ProbeError>;

    /// Unsubscribe and release the connection.
    async fn close(&mut self) -> Result<(), ProbeError>;
}

// ─── Result ──────────────────────────────────────────────────────

/// One successful round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Latency {
    pub elapsed: Duration,
}

impl Latency {
    /// Elapsed time in microseconds, with sub-microsecond fraction.
    pub fn as_micros_f64(&self) -> f64 {
        self.elapsed.as_nanos() as f64 / 1_000.0
    }
}

pub type ProbeResult = Result<Latency, ProbeError>;

// ─── Probe ───────────────────────────────────────────────────────

/// Run one subscribe → publish → receive exchange.
///
/// The publish is only issued after the subscription is acknowledged, and
/// the subscription is closed exactly once whatever happens afterwards.
/// Subscribe, publish, receive and close are each bounded by
/// `config.timeout`.
pub async fn probe<P, S>(publisher: &mut P, subscriber: S, config: &ProbeConfig) -> ProbeResult
where
    P: Publisher,
    S: Subscriber,
{
    let channel = config.channel.as_str();

    let mut subscription = bounded(
        config.timeout,
        subscriber.subscribe(channel),
        || ProbeError::subscribe(channel, timeout_reason(config.timeout, "acknowledgment")),
    )
    .await?;
    tracing::debug!(channel, "subscription acknowledged");

    let outcome = exchange(publisher, &mut subscription, config).await;

    let released = bounded(config.timeout, subscription.close(), || {
        ProbeError::release(channel, timeout_reason(config.timeout, "UNSUBSCRIBE reply"))
    })
    .await;
    if let Err(e) = released {
        tracing::warn!(channel, error = %e, "failed to release subscription");
    }

    outcome
}

/// Publish, start the clock on acknowledgment, wait for one message.
async fn exchange<P, T>(publisher: &mut P, subscription: &mut T, config: &ProbeConfig) -> ProbeResult
where
    P: Publisher,
    T: Subscription,
{
    let channel = config.channel.as_str();

    bounded(config.timeout, publisher.publish(channel, &config.message), || {
        ProbeError::publish(channel, timeout_reason(config.timeout, "PUBLISH reply"))
    })
    .await?;
    let start = Instant::now();

    // Payload is not checked: any message on the channel ends the wait.
    let payload = bounded(config.timeout, subscription.receive(), || {
        ProbeError::receive(channel, timeout_reason(config.timeout, "message"))
    })
    .await?;
    let elapsed = start.elapsed();

    tracing::debug!(
        channel,
        bytes = payload.len(),
        elapsed_us = elapsed.as_micros() as u64,
        "message received"
    );

    Ok(Latency { elapsed })
}

async fn bounded<F, T>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce() -> ProbeError,
) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(on_timeout()),
    }
}

fn timeout_reason(limit: Duration, waiting_for: &str) -> String {
    format!("no {waiting_for} within {}ms", limit.as_millis())
}
