use std::fmt::Display;

use tracing::error;

/// Out-of-band error sink. Failures are always logged; when an endpoint is
/// configured they are additionally posted to it, fire-and-forget. Capturing
/// never affects control flow.
#[derive(Clone)]
pub struct Telemetry {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl Telemetry {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn capture(&self, failure: &dyn Display) {
        error!(%failure, "captured failure");

        if let Some(endpoint) = self.endpoint.clone() {
            let client = self.client.clone();
            let body = serde_json::json!({ "error": failure.to_string() });
            tokio::spawn(async move {
                let _ = client.post(&endpoint).json(&body).send().await;
            });
        }
    }
}
