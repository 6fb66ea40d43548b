use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used by the fan-out. Swappable so callers can wrap or replace
/// the underlying `reqwest` client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
