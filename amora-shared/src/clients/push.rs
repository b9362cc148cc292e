use reqwest::Client;
use serde::Serialize;

/// Opaque fire-and-forget client for the external push gateway.
///
/// Delivery semantics (fan-out, retries, platform specifics) live entirely
/// on the gateway side; a failed dispatch is logged and dropped.
#[derive(Clone)]
pub struct PushClient {
    client: Client,
    gateway_url: String,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    token: &'a str,
    title: &'a str,
    body: &'a str,
}

impl PushClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.to_string(),
        }
    }

    pub async fn send(&self, token: &str, title: &str, body: &str) -> Result<(), String> {
        let response = self
            .client
            .post(&self.gateway_url)
            .json(&PushRequest { token, title, body })
            .send()
            .await
            .map_err(|e| format!("push dispatch failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("push gateway error: {}", response.status()));
        }

        tracing::debug!(title = %title, "push notification dispatched");
        Ok(())
    }
}
