use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    nimiq_mcp_agent::infra::logging::init();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "BOOT nimiq-mcp-agent");

    nimiq_mcp_agent::cli::run().await
}
