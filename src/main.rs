use std::io::Write;
use std::process::ExitCode;

use redis_latency_probe::config::Config;
use redis_latency_probe::logging::init_tracing;
use redis_latency_probe::metrics::{describe, report};
use redis_latency_probe::{measure, plugin};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ── 1. Configuration, parsed once ───────────────────────────
    let config = Config::parse_args().into_plugin_config();
    init_tracing(&config.log_level);

    let descriptor = describe(&config.probe, &config.subscribe);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // ── 2. Metadata request: no probe ───────────────────────────
    if plugin::is_meta_request() {
        return match plugin::output_definitions(&mut out, &descriptor) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "failed to write graph definitions");
                ExitCode::FAILURE
            }
        };
    }

    // ── 3. One probe ────────────────────────────────────────────
    tracing::debug!(
        pub_addr = %config.publish.address,
        sub_addr = %config.subscribe.address,
        channel = %config.probe.channel,
        "probing"
    );
    let result = measure(&config).await;

    let mut status = ExitCode::SUCCESS;
    match &result {
        Ok(latency) => {
            tracing::debug!(latency_us = latency.as_micros_f64(), "probe succeeded");
        }
        Err(e) if e.is_soft() => {
            tracing::info!(
                error = %e,
                "no sample this period (managed Redis without CONFIG may cause this); skipping"
            );
        }
        Err(e) => {
            tracing::error!(kind = %e.kind(), error = %e, "probe failed");
            status = ExitCode::FAILURE;
        }
    }

    // ── 4. Report ───────────────────────────────────────────────
    let stat = report(&result, &config.probe, &config.subscribe);
    let now = chrono::Utc::now().timestamp();

    if let Err(e) = plugin::output_values(&mut out, &descriptor, &stat, now).and_then(|()| {
        out.flush()?;
        Ok(())
    }) {
        tracing::error!(error = %e, "failed to write metric values");
        return ExitCode::FAILURE;
    }

    match plugin::load_values(&config.tempfile) {
        Ok(prev) => tracing::debug!(
            age_secs = now - prev.last_time,
            previous = ?prev.values,
            "previous values"
        ),
        Err(e) => tracing::debug!(error = %e, "no previous values"),
    }
    if let Err(e) = plugin::save_values(&config.tempfile, &stat, now) {
        tracing::warn!(error = %e, "failed to save tempfile");
    }

    status
}
