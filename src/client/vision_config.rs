use crate::config::{DEFAULT_VISION_ENDPOINT, MAX_REQUEST_BYTES};
use std::time::Duration;

/// Connection settings for [`super::VisionClient`].
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Base URL, without the `/v1/...` path
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Base64 content budget per images request; larger batches are split
    pub max_request_bytes: usize,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
            user_agent: format!("ocrdump/{}", crate::VERSION),
            max_request_bytes: MAX_REQUEST_BYTES,
        }
    }
}

impl VisionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_request_bytes(mut self, bytes: usize) -> Self {
        self.max_request_bytes = bytes;
        self
    }

    /// URL of the synchronous image annotation method.
    pub fn images_url(&self) -> String {
        format!("{}/v1/images:annotate", self.endpoint.trim_end_matches('/'))
    }

    /// URL of the synchronous file (PDF/TIFF) annotation method.
    pub fn files_url(&self) -> String {
        format!("{}/v1/files:annotate", self.endpoint.trim_end_matches('/'))
    }
}
