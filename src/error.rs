use std::fmt;

use thiserror::Error;

// ─── Failure taxonomy ────────────────────────────────────────────

/// Everything that can stop a single probe from producing a sample.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Endpoint unreachable, bad address, auth or SELECT rejected.
    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    /// SUBSCRIBE was not acknowledged.
    #[error("failed to subscribe to channel \"{channel}\": {reason}")]
    Subscribe { channel: String, reason: String },

    /// PUBLISH errored after the subscription was established.
    #[error("failed to publish to channel \"{channel}\": {reason}")]
    Publish { channel: String, reason: String },

    /// UNSUBSCRIBE failed or went unanswered. Logged only.
    #[error("failed to release subscription on channel \"{channel}\": {reason}")]
    Release { channel: String, reason: String },

    /// No message arrived, or the subscriber connection dropped while waiting.
    #[error("failed to receive from channel \"{channel}\": {reason}")]
    Receive { channel: String, reason: String },
}

/// Coarse classification used for logging and exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Connection,
    Subscribe,
    Publish,
    Receive,
    Release,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connection => "connection",
            Self::Subscribe => "subscribe",
            Self::Publish => "publish",
            Self::Receive => "receive",
            Self::Release => "release",
        };
        f.write_str(s)
    }
}

impl ProbeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Connection { .. } => FailureKind::Connection,
            Self::Subscribe { .. } => FailureKind::Subscribe,
            Self::Publish { .. } => FailureKind::Publish,
            Self::Receive { .. } => FailureKind::Receive,
            Self::Release { .. } => FailureKind::Release,
        }
    }

    /// Receive failures are expected on managed Redis variants and are
    /// skipped for the period instead of failing the invocation.
    pub fn is_soft(&self) -> bool {
        self.kind() == FailureKind::Receive
    }

    pub fn connection(address: &str, reason: impl ToString) -> Self {
        Self::Connection {
            address: address.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn subscribe(channel: &str, reason: impl ToString) -> Self {
        Self::Subscribe {
            channel: channel.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn publish(channel: &str, reason: impl ToString) -> Self {
        Self::Publish {
            channel: channel.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn release(channel: &str, reason: impl ToString) -> Self {
        Self::Release {
            channel: channel.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn receive(channel: &str, reason: impl ToString) -> Self {
        Self::Receive {
            channel: channel.to_owned(),
            reason: reason.to_string(),
        }
    }
}
