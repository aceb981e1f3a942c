//! Gateway health endpoint (`/health`)

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use super::client::Client;
use super::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Everything else the gateway reports (version, database, cache ...)
    #[serde(flatten)]
    pub details: BTreeMap<String, JsonValue>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}

impl Client {
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }
}
