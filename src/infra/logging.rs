use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. The MCP transport is chatty at info.
pub const DEFAULT_FILTER: &str = "info,rmcp=warn";

/// Logs go to stderr so stdout carries only the conversation.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log a metrics-like line and forward it to whatever `metrics` recorder is installed.
pub fn log_metric(op: &'static str, metric: &'static str, value: f64) {
    tracing::info!(op = op, metric = metric, value = value, "metric");
    if metric.ends_with("_total") {
        metrics::counter!(metric, "op" => op).increment(value as u64);
    } else {
        metrics::histogram!(metric, "op" => op).record(value);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }

    #[test]
    fn default_filter_parses() {
        let _ = tracing_subscriber::EnvFilter::try_new(super::DEFAULT_FILTER).unwrap();
    }

    #[test]
    fn log_metric_without_recorder_is_noop() {
        super::log_metric("agent.run", "remote_error_total", 1.0);
        super::log_metric("agent.run", "remote_latency_ms", 12.5);
    }
}
