// Kling VideoProvider Implementation

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::signer;
use openreel_core::domain::{GenerationConfig, JobHandle};
use openreel_core::error::{AppError, Result};
use openreel_core::port::secret_store::{KLING_ACCESS_KEY_ACCOUNT, KLING_SECRET_KEY_ACCOUNT};
use openreel_core::port::{
    GenerationStatus, ProviderError, SecretStore, TimeProvider, VideoProvider,
};
use secrecy::SecretString;

pub const KLING_PROVIDER_ID: &str = "kling";

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api-singapore.klingai.com";

/// Upper bound for a single HTTP round trip (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_FAILURE_REASON: &str = "Generation failed.";

#[derive(Serialize)]
struct StartGenerationRequest<'a> {
    prompt: &'a str,
    aspect_ratio: &'a str,
    duration: u8,
}

#[derive(Deserialize)]
struct StartGenerationResponse {
    job_id: Option<String>,
    id: Option<String>,
}

#[derive(Deserialize)]
struct GenerationStatusResponse {
    status: String,
    progress: Option<f64>,
    video_url: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct KlingErrorResponse {
    message: Option<String>,
    error: Option<String>,
}

/// Remote provider backed by the Kling HTTP API
///
/// Credentials are read from the secret store on every call and each
/// request carries a freshly signed token.
pub struct KlingProvider {
    base_url: Url,
    client: Client,
    secrets: Arc<dyn SecretStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl KlingProvider {
    /// Create a new Kling provider
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g. `https://api-singapore.klingai.com`)
    /// * `secrets` - Store holding the access and secret keys
    /// * `time_provider` - Clock used for token validity windows
    /// * `request_timeout` - Bound for each HTTP call
    pub fn new(
        base_url: &str,
        secrets: Arc<dyn SecretStore>,
        time_provider: Arc<dyn TimeProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid Kling base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Kling base URL cannot carry a path: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            secrets,
            time_provider,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sign a fresh token from the stored credentials
    async fn bearer_token(&self) -> std::result::Result<String, ProviderError> {
        let access_key = self.load_secret(KLING_ACCESS_KEY_ACCOUNT).await?;
        let secret_key = SecretString::from(self.load_secret(KLING_SECRET_KEY_ACCOUNT).await?);
        let token = signer::sign(&access_key, &secret_key, self.time_provider.now_secs())?;
        Ok(token)
    }

    async fn load_secret(&self, account: &str) -> std::result::Result<String, ProviderError> {
        match self.secrets.load(account).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(ProviderError::MissingCredentials),
            Err(e) => {
                warn!(account = %account, error = %e, "Failed to read credentials");
                Err(ProviderError::MissingCredentials)
            }
        }
    }

    /// Read the body, turning non-2xx responses into HTTP errors
    async fn read_body(
        response: reqwest::Response,
    ) -> std::result::Result<Vec<u8>, ProviderError> {
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl VideoProvider for KlingProvider {
    fn provider_id(&self) -> &str {
        KLING_PROVIDER_ID
    }

    async fn submit(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> std::result::Result<JobHandle, ProviderError> {
        let token = self.bearer_token().await?;
        let body = serde_json::to_vec(&StartGenerationRequest {
            prompt,
            aspect_ratio: config.aspect_ratio.as_str(),
            duration: config.duration_seconds,
        })
        .map_err(|e| ProviderError::Encoding(e.to_string()))?;

        let url = self.endpoint(&["v1", "generation", "video"]);
        debug!(url = %url, "Submitting generation");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let body = Self::read_body(response).await?;
        parse_job_id(&body)
    }

    async fn check_status(
        &self,
        handle: &str,
    ) -> std::result::Result<GenerationStatus, ProviderError> {
        let token = self.bearer_token().await?;
        let url = self.endpoint(&["v1", "generation", "video", handle]);
        debug!(url = %url, "Checking generation status");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let body = Self::read_body(response).await?;
        map_status_response(&body)
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Transport(format!("request timed out: {}", err))
    } else {
        ProviderError::Transport(err.to_string())
    }
}

/// `message` or `error` field of an error body, if decodable
fn error_message(body: &[u8]) -> Option<String> {
    let decoded: KlingErrorResponse = serde_json::from_slice(body).ok()?;
    decoded.message.or(decoded.error)
}

/// Job id from `job_id`, falling back to `id`
pub(crate) fn parse_job_id(body: &[u8]) -> std::result::Result<JobHandle, ProviderError> {
    let decoded: StartGenerationResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let present = |id: &Option<String>| id.as_ref().is_some_and(|id| !id.is_empty());
    let job_id = if present(&decoded.job_id) {
        decoded.job_id
    } else if present(&decoded.id) {
        decoded.id
    } else {
        None
    };
    job_id.ok_or_else(|| ProviderError::InvalidResponse("response carries no job id".to_string()))
}

/// Map a status body onto a provider-neutral status
pub(crate) fn map_status_response(
    body: &[u8],
) -> std::result::Result<GenerationStatus, ProviderError> {
    let decoded: GenerationStatusResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    match decoded.status.to_lowercase().as_str() {
        "queued" | "processing" | "running" => Ok(GenerationStatus::Processing {
            progress: decoded.progress,
        }),
        "completed" | "succeeded" | "success" => {
            let video_url = decoded
                .video_url
                .filter(|raw| Url::parse(raw).is_ok())
                .ok_or(ProviderError::MissingVideoUrl)?;
            Ok(GenerationStatus::Completed { video_url })
        }
        "failed" | "error" => Ok(GenerationStatus::Failed {
            reason: decoded
                .error
                .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
        }),
        _ => Ok(GenerationStatus::Failed {
            reason: format!("Unknown status: {}", decoded.status),
        }),
    }
}
