//! Command-line configuration.
//!
//! Flags are parsed once by clap into [`Config`] and then frozen into an
//! immutable [`PluginConfig`] that is passed by reference to the prober and
//! the reporter.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Redis's default TCP port, used when an address has no `:port` suffix.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

// ─── CLI ─────────────────────────────────────────────────────────

/// Mackerel plugin measuring Redis pub/sub round-trip latency.
#[derive(Parser, Debug, Clone)]
#[command(name = "mackerel-plugin-redis-latency")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Metric key prefix
    #[arg(long = "metric-key-prefix", default_value = "latency")]
    pub metric_key_prefix: String,

    /// Publish message
    #[arg(long = "msg", default_value = "Publish message")]
    pub msg: String,

    /// Redis pub address (host:port)
    #[arg(long = "pubaddr", default_value = "localhost:6379")]
    pub pub_addr: String,

    /// Redis pub password (empty = no AUTH)
    #[arg(long = "pubpassword", env = "REDIS_PUB_PASSWORD", default_value = "")]
    pub pub_password: String,

    /// Redis pub db number
    #[arg(long = "pubdb", default_value_t = 0)]
    pub pub_db: i64,

    /// Redis sub address (host:port)
    #[arg(long = "subaddr", default_value = "localhost:6379")]
    pub sub_addr: String,

    /// Redis sub password (empty = no AUTH)
    #[arg(long = "subpassword", env = "REDIS_SUB_PASSWORD", default_value = "")]
    pub sub_password: String,

    /// Redis sub db number
    #[arg(long = "subdb", default_value_t = 0)]
    pub sub_db: i64,

    /// Channel name
    #[arg(short = 'n', long = "channel", default_value = "test")]
    pub channel: String,

    /// How the metric key is named
    #[arg(long = "metric-naming", value_enum, default_value_t = MetricNaming::Address)]
    pub metric_naming: MetricNaming,

    /// Upper bound (ms) for each of connect, subscribe, publish, receive and unsubscribe
    #[arg(long = "timeout-ms", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Temp file name
    #[arg(long = "tempfile")]
    pub tempfile: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Freeze the parsed flags into the runtime configuration.
    pub fn into_plugin_config(self) -> PluginConfig {
        let tempfile = self.tempfile.unwrap_or_else(|| {
            PathBuf::from(format!(
                "/tmp/mackerel-plugin-redis-{}-{}",
                self.pub_addr, self.sub_addr
            ))
        });

        PluginConfig {
            publish: EndpointConfig::new(self.pub_addr, &self.pub_password, self.pub_db),
            subscribe: EndpointConfig::new(self.sub_addr, &self.sub_password, self.sub_db),
            probe: ProbeConfig {
                channel: self.channel,
                message: self.msg,
                metric_prefix: self.metric_key_prefix,
                naming: self.metric_naming,
                timeout: Duration::from_millis(self.timeout_ms),
            },
            tempfile,
            log_level: self.log_level,
        }
    }
}

// ─── Runtime configuration ───────────────────────────────────────

/// Metric-key strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricNaming {
    /// Key derived from the subscribe address (`10.0.0.1:6379` → `10_0_0_1-6379`).
    Address,
    /// Fixed key `latency`.
    Static,
}

/// One Redis endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// `host:port`
    pub address: String,
    pub password: Option<String>,
    pub db: i64,
}

impl EndpointConfig {
    pub fn new(address: impl Into<String>, password: &str, db: i64) -> Self {
        Self {
            address: address.into(),
            password: (!password.is_empty()).then(|| password.to_owned()),
            db,
        }
    }

    /// Split the address into host and port. A missing port means 6379.
    pub fn host_port(&self) -> Result<(String, u16), String> {
        let addr = self.address.trim();
        if addr.is_empty() {
            return Err("address is empty".into());
        }

        // Bracketed IPv6: [::1]:6379
        if let Some(rest) = addr.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| format!("unterminated '[' in \"{addr}\""))?;
            let port = match tail.strip_prefix(':') {
                Some(p) => parse_port(p)?,
                None if tail.is_empty() => DEFAULT_REDIS_PORT,
                None => return Err(format!("unexpected \"{tail}\" after host")),
            };
            return Ok((host.to_owned(), port));
        }

        match addr.rsplit_once(':') {
            Some((host, _)) if host.is_empty() => Err(format!("missing host in \"{addr}\"")),
            Some((host, _)) if host.contains(':') => {
                Err(format!("IPv6 address \"{addr}\" must be bracketed"))
            }
            Some((host, port)) => Ok((host.to_owned(), parse_port(port)?)),
            None => Ok((addr.to_owned(), DEFAULT_REDIS_PORT)),
        }
    }
}

fn parse_port(port: &str) -> Result<u16, String> {
    port.parse::<u16>()
        .map_err(|e| format!("invalid port \"{port}\": {e}"))
}

/// Probe parameters shared by the prober and the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub channel: String,
    pub message: String,
    pub metric_prefix: String,
    pub naming: MetricNaming,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            channel: "test".into(),
            message: "Publish message".into(),
            metric_prefix: "latency".into(),
            naming: MetricNaming::Address,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Everything the binary needs, built once at startup.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub publish: EndpointConfig,
    pub subscribe: EndpointConfig,
    pub probe: ProbeConfig,
    pub tempfile: PathBuf,
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PluginConfig {
        let mut argv = vec!["mackerel-plugin-redis-latency"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv)
            .expect("valid flags")
            .into_plugin_config()
    }

    #[test]
    fn defaults_match_the_plugin() {
        let cfg = parse(&[]);
        assert_eq!(cfg.publish.address, "localhost:6379");
        assert_eq!(cfg.subscribe.address, "localhost:6379");
        assert_eq!(cfg.publish.password, None);
        assert_eq!(cfg.subscribe.db, 0);
        assert_eq!(cfg.probe, ProbeConfig::default());
        assert_eq!(
            cfg.tempfile,
            PathBuf::from("/tmp/mackerel-plugin-redis-localhost:6379-localhost:6379")
        );
    }

    #[test]
    fn flags_override_both_endpoints() {
        let cfg = parse(&[
            "--pubaddr", "10.0.0.1:6379",
            "--pubpassword", "secret",
            "--pubdb", "2",
            "--subaddr", "redis.internal:6380",
            "-n", "probe",
            "--metric-naming", "static",
            "--timeout-ms", "250",
            "--tempfile", "/var/tmp/state.json",
        ]);
        assert_eq!(cfg.publish.address, "10.0.0.1:6379");
        assert_eq!(cfg.publish.password.as_deref(), Some("secret"));
        assert_eq!(cfg.publish.db, 2);
        assert_eq!(cfg.subscribe.address, "redis.internal:6380");
        assert_eq!(cfg.probe.channel, "probe");
        assert_eq!(cfg.probe.naming, MetricNaming::Static);
        assert_eq!(cfg.probe.timeout, Duration::from_millis(250));
        assert_eq!(cfg.tempfile, PathBuf::from("/var/tmp/state.json"));
    }

    #[test]
    fn host_port_parsing() {
        let ep = |a: &str| EndpointConfig::new(a, "", 0);

        assert_eq!(ep("127.0.0.1:6380").host_port(), Ok(("127.0.0.1".to_string(), 6380)));
        assert_eq!(ep("redis.internal").host_port(), Ok(("redis.internal".to_string(), 6379)));
        assert_eq!(ep("[::1]:7000").host_port(), Ok(("::1".to_string(), 7000)));
        assert_eq!(ep("[::1]").host_port(), Ok(("::1".to_string(), 6379)));
        assert!(ep("").host_port().is_err());
        assert!(ep(":6379").host_port().is_err());
        assert!(ep("localhost:port").host_port().is_err());
        assert!(ep("::1:6379").host_port().is_err());
    }
}
