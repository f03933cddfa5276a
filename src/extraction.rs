//! # Extraction Client Module
//!
//! Sends a bet slip screenshot to the image-understanding service and returns
//! the raw text it answers with. Turning that text into a slip is the job of
//! [`crate::slip_parser`].
//!
//! One request per screenshot, no retries. Repeated transport failures open
//! a [`CircuitBreaker`] so later screenshots fail fast until the service is
//! reachable again.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::ExtractionConfig;
use crate::extraction_errors::ExtractionError;

/// Fixed instruction sent with every screenshot
pub const EXTRACTION_PROMPT: &str = "Analyze this betting screenshot. Extract ALL games/bets. \
Return ONLY valid JSON: {\"sport\": \"Football/Basketball/Tennis\", \"games\": [{\"match\": \"Team A vs Team B\", \"bet\": \"description\"}]}";

/// Anything that can turn screenshot bytes into the service's raw answer
#[async_trait]
pub trait SlipExtractor: Send + Sync {
    /// Extract raw text from a PNG-encoded screenshot
    async fn extract(&self, image_png: &[u8]) -> Result<String, ExtractionError>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RequestContent<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    media_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseContent>,
    #[serde(default)]
    error: Option<ResponseError>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseError {
    #[serde(default)]
    message: Option<String>,
}

/// Extraction client for the Anthropic Messages API
#[derive(Debug)]
pub struct AnthropicExtractor {
    config: ExtractionConfig,
    client: Client,
    circuit_breaker: CircuitBreaker,
}

impl AnthropicExtractor {
    /// Build a client with the configured request timeout
    pub fn new(config: ExtractionConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.recovery.operation_timeout_secs))
            .build()?;
        let circuit_breaker = CircuitBreaker::new(config.recovery.clone());

        Ok(Self {
            config,
            client,
            circuit_breaker,
        })
    }

    fn build_request<'a>(&'a self, image_png: &[u8]) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: vec![
                    RequestContent::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: "image/png",
                            data: STANDARD.encode(image_png),
                        },
                    },
                    RequestContent::Text {
                        text: EXTRACTION_PROMPT,
                    },
                ],
            }],
        }
    }

    async fn send(&self, api_key: &str, image_png: &[u8]) -> Result<String, ExtractionError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&self.build_request(image_png))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, body_len = body.len(), "Extraction service responded");

        interpret_response(status.as_u16(), &body)
    }
}

#[async_trait]
impl SlipExtractor for AnthropicExtractor {
    async fn extract(&self, image_png: &[u8]) -> Result<String, ExtractionError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("Extraction requested without a configured credential");
            return Err(ExtractionError::NotConfigured);
        };

        if self.circuit_breaker.is_open() {
            warn!("Extraction circuit breaker is open, failing fast");
            return Err(ExtractionError::TransportFailure(
                "extraction service temporarily unavailable".to_string(),
            ));
        }

        info!(image_bytes = image_png.len(), model = %self.config.model, "Sending screenshot for extraction");

        let result = self.send(api_key, image_png).await;
        match &result {
            Ok(text) => {
                self.circuit_breaker.record_success();
                info!(chars_extracted = text.len(), "Extraction completed");
            }
            Err(e) if e.is_transport() => {
                self.circuit_breaker.record_failure();
                error!(error = %e, failures = self.circuit_breaker.failure_count(), "Extraction transport failure");
            }
            Err(e) => {
                // The service answered, so it is reachable
                self.circuit_breaker.record_success();
                warn!(error = %e, "Extraction service rejected the request");
            }
        }
        result
    }
}

/// Map a service response to the raw text or a typed failure
///
/// An `error` payload wins over any content and its message is kept verbatim;
/// otherwise the first text block is the answer.
pub fn interpret_response(status: u16, body: &str) -> Result<String, ExtractionError> {
    let parsed: MessagesResponse = serde_json::from_str(body).map_err(|e| {
        ExtractionError::TransportFailure(format!("unreadable response (HTTP {status}): {e}"))
    })?;

    if let Some(err) = parsed.error {
        return Err(ExtractionError::ServiceError(
            err.message.unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }

    parsed
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ExtractionError::EmptyResponse)
}

/// Check whether the bytes are a screenshot format we accept
pub fn is_supported_image_format(bytes: &[u8]) -> bool {
    match image::guess_format(bytes) {
        Ok(format) => {
            let supported = matches!(
                format,
                image::ImageFormat::Png
                    | image::ImageFormat::Jpeg
                    | image::ImageFormat::WebP
                    | image::ImageFormat::Gif
                    | image::ImageFormat::Bmp
            );
            debug!(format = ?format, supported, "Detected screenshot format");
            supported
        }
        Err(e) => {
            debug!(error = %e, "Could not determine screenshot format");
            false
        }
    }
}

/// Re-encode a screenshot as PNG, the single format sent to the service
pub fn normalize_to_png(bytes: &[u8], max_bytes: usize) -> Result<Vec<u8>, ExtractionError> {
    if bytes.len() > max_bytes {
        return Err(ExtractionError::InvalidImage(format!(
            "screenshot is {} bytes, limit is {max_bytes}",
            bytes.len()
        )));
    }
    if !is_supported_image_format(bytes) {
        return Err(ExtractionError::InvalidImage("unsupported image format".to_string()));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;

    Ok(png.into_inner())
}
