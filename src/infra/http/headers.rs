use reqwest::RequestBuilder;
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// Per-process request id: `nma-<pid>-<seq>`, stable across retries of one call.
pub fn generate_request_id() -> String {
    let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("nma-{}-{seq}", std::process::id())
}

/// Headers every model API request carries.
pub struct ApiHeaders<'a> {
    pub api_key: &'a str,
    pub request_id: &'a str,
}

impl ApiHeaders<'_> {
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.api_key)
            .header("x-request-id", self.request_id)
            .header(
                reqwest::header::USER_AGENT,
                concat!("nimiq-mcp-agent/", env!("CARGO_PKG_VERSION")),
            )
    }
}
