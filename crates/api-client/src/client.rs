use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use tokentrack_api_types::*;

use crate::ApiError;

/// Typed HTTP client for the token usage API.
///
/// The client holds no credential. Authenticated methods take the bearer
/// token as an argument, so whoever owns the session decides per request
/// what (if anything) is attached.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    ///
    /// `base_url` includes the API prefix, e.g. `https://host/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer credential, when there is one.
    fn authorize(
        &self,
        builder: reqwest::RequestBuilder,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ── Health ────────────────────────────────────────────────────────────

    /// Reachability probe. Any 2xx is success; the body is ignored.
    pub async fn health(&self) -> Result<(), ApiError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(())
    }

    // ── Auth ──────────────────────────────────────────────────────────────

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        debug!(email = %req.email, "POST /auth/login");
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        debug!(email = %req.email, "POST /auth/register");
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn me(&self, token: &str) -> Result<MeResponse, ApiError> {
        let resp = self
            .authorize(self.client.get(self.url("/auth/me")), Some(token))
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Logs ──────────────────────────────────────────────────────────────

    pub async fn logs(&self, token: &str) -> Result<Envelope<Vec<UsageLog>>, ApiError> {
        let resp = self
            .authorize(self.client.get(self.url("/logs")), Some(token))
            .send()
            .await?;
        parse_envelope(resp).await
    }

    pub async fn stats(&self, token: &str) -> Result<Envelope<AggregateStats>, ApiError> {
        let resp = self
            .authorize(self.client.get(self.url("/logs/stats")), Some(token))
            .send()
            .await?;
        parse_envelope(resp).await
    }

    // ── AI ────────────────────────────────────────────────────────────────

    pub async fn process_prompt(
        &self,
        token: Option<&str>,
        req: &ProcessPromptRequest,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        debug!(model = %req.model, chars = req.prompt.len(), "POST /ai/process");
        let resp = self
            .authorize(self.client.post(self.url("/ai/process")), token)
            .json(req)
            .send()
            .await?;
        parse_envelope(resp).await
    }
}

fn status_error(status: reqwest::StatusCode, body: &[u8]) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        message: error_message(body),
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or a status error carrying the server's message.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Like [`parse_response`] for `{success, data?, message?}` bodies.
async fn parse_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<Envelope<T>, ApiError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    Ok(Envelope::decode(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::with_client(reqwest::Client::new(), "https://host/api/");
        assert_eq!(client.base_url(), "https://host/api");
        assert_eq!(client.url("/logs/stats"), "https://host/api/logs/stats");
    }

    #[test]
    fn status_error_uses_server_message() {
        let err = status_error(
            reqwest::StatusCode::UNAUTHORIZED,
            br#"{"success": false, "message": "Invalid credentials"}"#,
        );
        assert_eq!(err.server_message(), Some("Invalid credentials"));
        assert_eq!(err.status(), Some(401));

        let err = status_error(reqwest::StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.server_message(), None);
    }
}
