//! Scriptable in-memory bus used to drive the prober without Redis.
//!
//! Every call is appended to a shared [`CallLog`] so tests can assert on
//! ordering and on how many times the subscription was closed.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use redis_latency_probe::prober::{Publisher, Subscriber, Subscription};
use redis_latency_probe::ProbeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Subscribe(String),
    Publish(String, String),
    Receive,
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn publishes(&self) -> usize {
        self.count(|c| matches!(c, Call::Publish(..)))
    }

    pub fn closes(&self) -> usize {
        self.count(|c| matches!(c, Call::Close))
    }
}

// ─── Behaviour knobs ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeBehaviour {
    Ack,
    Fail,
    NeverAck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishBehaviour {
    Ack,
    Fail,
    Hang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseBehaviour {
    Ok,
    Hang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveBehaviour {
    /// Deliver whatever was last published on the channel.
    Echo,
    Fail,
    Hang,
}

// ─── Stubs ───────────────────────────────────────────────────────

pub struct StubPublisher {
    pub log: CallLog,
    pub publish: PublishBehaviour,
    /// Shared with the subscription so `Echo` can deliver it.
    pub last_published: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&mut self, channel: &str, message: &str) -> Result<(), ProbeError> {
        self.log.push(Call::Publish(channel.into(), message.into()));
        match self.publish {
            PublishBehaviour::Ack => {}
            PublishBehaviour::Fail => {
                return Err(ProbeError::publish(channel, "stub publish failure"))
            }
            PublishBehaviour::Hang => std::future::pending::<()>().await,
        }
        *self.last_published.lock() = Some(message.to_owned());
        Ok(())
    }
}

pub struct StubSubscriber {
    pub log: CallLog,
    pub subscribe: SubscribeBehaviour,
    pub receive: ReceiveBehaviour,
    pub close: CloseBehaviour,
    pub last_published: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl Subscriber for StubSubscriber {
    type Subscription = StubSubscription;

    async fn subscribe(self, channel: &str) -> Result<StubSubscription, ProbeError> {
        self.log.push(Call::Subscribe(channel.into()));
        match self.subscribe {
            SubscribeBehaviour::Ack => Ok(StubSubscription {
                log: self.log,
                channel: channel.to_owned(),
                receive: self.receive,
                close: self.close,
                last_published: self.last_published,
            }),
            SubscribeBehaviour::Fail => Err(ProbeError::subscribe(channel, "stub subscribe failure")),
            SubscribeBehaviour::NeverAck => std::future::pending().await,
        }
    }
}

pub struct StubSubscription {
    log: CallLog,
    channel: String,
    receive: ReceiveBehaviour,
    close: CloseBehaviour,
    last_published: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl Subscription for StubSubscription {
    async fn receive(&mut self) -> Result<String, ProbeError> {
        self.log.push(Call::Receive);
        match self.receive {
            ReceiveBehaviour::Echo => {
                let msg = self.last_published.lock().clone();
                msg.ok_or_else(|| ProbeError::receive(&self.channel, "nothing published"))
            }
            ReceiveBehaviour::Fail => Err(ProbeError::receive(&self.channel, "connection reset")),
            ReceiveBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), ProbeError> {
        self.log.push(Call::Close);
        match self.close {
            CloseBehaviour::Ok => Ok(()),
            CloseBehaviour::Hang => std::future::pending().await,
        }
    }
}

/// A publisher/subscriber pair sharing one call log.
pub fn stub_bus(
    subscribe: SubscribeBehaviour,
    publish: PublishBehaviour,
    receive: ReceiveBehaviour,
) -> (StubPublisher, StubSubscriber, CallLog) {
    let log = CallLog::default();
    let last_published = Arc::new(Mutex::new(None));

    let publisher = StubPublisher {
        log: log.clone(),
        publish,
        last_published: last_published.clone(),
    };
    let subscriber = StubSubscriber {
        log: log.clone(),
        subscribe,
        receive,
        close: CloseBehaviour::Ok,
        last_published,
    };
    (publisher, subscriber, log)
}
