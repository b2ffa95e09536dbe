use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPIRES_IN: i64 = 60;

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN
}

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub long_url: Option<String>,
    /// Seconds the alias stays live.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
