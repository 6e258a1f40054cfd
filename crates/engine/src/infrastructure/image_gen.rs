//! Image generation client (OpenAI-compatible images endpoint).
//!
//! The API returns a temporary, time-limited URL; callers must fetch and
//! re-upload the bytes to permanent storage before it expires.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::infrastructure::ports::{GeneratedImage, ImageGenError, ImageGenPort};

/// Client for an OpenAI-compatible `/v1/images/generations` API.
#[derive(Clone)]
pub struct ImageApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
}

impl ImageApiClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        // Image generation is the slowest upstream call in the system.
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            size: "1024x1024".to_string(),
        }
    }
}

#[async_trait]
impl ImageGenPort for ImageApiClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageGenError> {
        let api_request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.size.clone(),
        };

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ImageGenError::GenerationFailed(error_text));
        }

        let api_response: ImageGenerationResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        let url = api_response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| {
                ImageGenError::GenerationFailed("no image URL in response".to_string())
            })?;

        Ok(GeneratedImage { url })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageGenError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageGenError::FetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageGenError::FetchFailed(format!(
                "status {} fetching temporary image",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ImageGenError::FetchFailed(e.to_string()))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
}
