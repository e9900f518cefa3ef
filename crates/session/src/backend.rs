use std::future::Future;

use tokentrack_api_client::{ApiClient, ApiError};
use tokentrack_api_types::{
    AggregateStats, AuthResponse, Envelope, LoginRequest, MeResponse, ProcessPromptRequest,
    RegisterRequest, UsageLog,
};

/// The remote operations the controller needs.
///
/// [`ApiClient`] is the production implementation; tests substitute an
/// in-memory fake. Authenticated calls receive the bearer token explicitly.
pub trait UsageBackend: Send + Sync {
    fn health(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn login(&self, req: &LoginRequest)
    -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn register(
        &self,
        req: &RegisterRequest,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    fn me(&self, token: &str) -> impl Future<Output = Result<MeResponse, ApiError>> + Send;

    fn logs(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Envelope<Vec<UsageLog>>, ApiError>> + Send;

    fn stats(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Envelope<AggregateStats>, ApiError>> + Send;

    fn process_prompt(
        &self,
        token: Option<&str>,
        req: &ProcessPromptRequest,
    ) -> impl Future<Output = Result<Envelope<serde_json::Value>, ApiError>> + Send;
}

impl UsageBackend for ApiClient {
    async fn health(&self) -> Result<(), ApiError> {
        ApiClient::health(self).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        ApiClient::login(self, req).await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        ApiClient::register(self, req).await
    }

    async fn me(&self, token: &str) -> Result<MeResponse, ApiError> {
        ApiClient::me(self, token).await
    }

    async fn logs(&self, token: &str) -> Result<Envelope<Vec<UsageLog>>, ApiError> {
        ApiClient::logs(self, token).await
    }

    async fn stats(&self, token: &str) -> Result<Envelope<AggregateStats>, ApiError> {
        ApiClient::stats(self, token).await
    }

    async fn process_prompt(
        &self,
        token: Option<&str>,
        req: &ProcessPromptRequest,
    ) -> Result<Envelope<serde_json::Value>, ApiError> {
        ApiClient::process_prompt(self, token, req).await
    }
}
