use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{MultiplexedConnection, PubSub};
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tokio_stream::StreamExt;

use crate::config::EndpointConfig;
use crate::error::ProbeError;
use crate::prober::{Publisher, Subscriber, Subscription};

// ─── Provisioning ────────────────────────────────────────────────

/// Opens the two independent connections a probe needs.
///
/// Nothing is pooled: every invocation gets fresh sockets, and the two
/// sides never share a connection even when they point at the same server.
/// The subscribe side is connected first, so an unreachable subscribe
/// endpoint is reported under its own address.
pub async fn connect_pair(
    publish: &EndpointConfig,
    subscribe: &EndpointConfig,
    timeout: Duration,
) -> Result<(RedisPublisher, RedisSubscriber), ProbeError> {
    let subscriber = RedisSubscriber::connect(subscribe, timeout).await?;
    let publisher = RedisPublisher::connect(publish, timeout).await?;
    Ok((publisher, subscriber))
}

/// Build a `redis::Client` for one endpoint. AUTH and SELECT are sent by
/// the client during connection setup.
fn client_for(endpoint: &EndpointConfig) -> Result<redis::Client, ProbeError> {
    let (host, port) = endpoint
        .host_port()
        .map_err(|reason| ProbeError::connection(&endpoint.address, reason))?;

    let info = ConnectionInfo {
        addr: ConnectionAddr::Tcp(host, port),
        redis: RedisConnectionInfo {
            db: endpoint.db,
            password: endpoint.password.clone(),
            ..Default::default()
        },
    };

    redis::Client::open(info).map_err(|e| ProbeError::connection(&endpoint.address, e))
}

async fn connect_within<F, T>(
    endpoint: &EndpointConfig,
    timeout: Duration,
    fut: F,
) -> Result<T, ProbeError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(ProbeError::connection(&endpoint.address, e)),
        Err(_) => Err(ProbeError::connection(
            &endpoint.address,
            format!("not connected within {}ms", timeout.as_millis()),
        )),
    }
}

// ─── Publish side ────────────────────────────────────────────────

/// Connection used only for PUBLISH.
pub struct RedisPublisher {
    conn: MultiplexedConnection,
}

impl RedisPublisher {
    pub async fn connect(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self, ProbeError> {
        let client = client_for(endpoint)?;
        let conn =
            connect_within(endpoint, timeout, client.get_multiplexed_tokio_connection()).await?;
        tracing::debug!(address = %endpoint.address, db = endpoint.db, "publish connection ready");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Publisher for RedisPublisher {
    async fn publish(&mut self, channel: &str, message: &str) -> Result<(), ProbeError> {
        let receivers: i64 = self
            .conn
            .publish(channel, message)
            .await
            .map_err(|e| ProbeError::publish(channel, e))?;
        tracing::trace!(channel, receivers, "published");
        Ok(())
    }
}

// ─── Subscribe side ──────────────────────────────────────────────

/// Connection used only for SUBSCRIBE.
pub struct RedisSubscriber {
    pubsub: PubSub,
}

impl RedisSubscriber {
    pub async fn connect(endpoint: &EndpointConfig, timeout: Duration) -> Result<Self, ProbeError> {
        let client = client_for(endpoint)?;
        let pubsub = connect_within(endpoint, timeout, client.get_async_pubsub()).await?;
        tracing::debug!(address = %endpoint.address, db = endpoint.db, "subscribe connection ready");
        Ok(Self { pubsub })
    }
}

#[async_trait]
impl Subscriber for RedisSubscriber {
    type Subscription = RedisSubscription;

    async fn subscribe(mut self, channel: &str) -> Result<RedisSubscription, ProbeError> {
        // Returns after the server's SUBSCRIBE reply has been read.
        self.pubsub
            .subscribe(channel)
            .await
            .map_err(|e| ProbeError::subscribe(channel, e))?;

        Ok(RedisSubscription {
            pubsub: self.pubsub,
            channel: channel.to_owned(),
            closed: false,
        })
    }
}

/// Active subscription on one channel. Dropping it closes the socket.
pub struct RedisSubscription {
    pubsub: PubSub,
    channel: String,
    closed: bool,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn receive(&mut self) -> Result<String, ProbeError> {
        let msg = {
            let stream = self.pubsub.on_message();
            tokio::pin!(stream);
            stream.next().await
        };

        let msg = msg.ok_or_else(|| {
            ProbeError::receive(&self.channel, "connection closed while waiting")
        })?;
        msg.get_payload::<String>()
            .map_err(|e| ProbeError::receive(&self.channel, e))
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pubsub
            .unsubscribe(&self.channel)
            .await
            .map_err(|e| ProbeError::release(&self.channel, e))
    }
}
