// src/services/imagen_service.rs
use crate::config::Config;
use crate::errors::GenerationError;
use crate::models::*;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use log::{debug, info, warn};
use reqwest::{Client, Url};
use serde_json::{Value, json};
use std::time::Instant;

/// Anything that can turn a prompt and style into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        style: &StylePreset,
    ) -> Result<GeneratedImage, GenerationError>;
}

pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

#[async_trait]
pub trait PredictTransport: Send + Sync {
    async fn post_json(&self, url: Url, body: &Value) -> Result<TransportResponse, GenerationError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PredictTransport for HttpTransport {
    async fn post_json(&self, url: Url, body: &Value) -> Result<TransportResponse, GenerationError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                GenerationError::Unexpected(format!("Imagen request failed: {}", e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                GenerationError::Unexpected(format!("Failed to read response: {}", e.without_url()))
            })?;

        Ok(TransportResponse { status, body })
    }
}

pub struct ImagenService<T = HttpTransport> {
    api_key: Option<String>,
    base_url: String,
    model: String,
    transport: T,
}

impl ImagenService<HttpTransport> {
    pub fn new(config: &Config) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: PredictTransport> ImagenService<T> {
    pub fn with_transport(config: &Config, transport: T) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            transport,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:predict", self.base_url, self.model)
    }

    /// Masks the credential in text that may end up in logs or errors.
    fn redact(&self, text: &str) -> String {
        match self.api_key.as_deref() {
            Some(key) => text.replace(key, "[redacted]"),
            None => text.to_string(),
        }
    }

    pub async fn generate_icon(
        &self,
        prompt: &str,
        style: &StylePreset,
    ) -> Result<GeneratedImage, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let start = Instant::now();
        let endpoint = self.endpoint();
        let url = Url::parse_with_params(&endpoint, &[("key", api_key)])
            .map_err(|e| GenerationError::Unexpected(format!("Invalid endpoint: {}", e)))?;

        let body = json!({
            "instances": [{ "prompt": style.compose_prompt(prompt) }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "1:1"
            }
        });

        info!("Requesting {} icon from {}", style.display_name, endpoint);
        let response = self
            .transport
            .post_json(url, &body)
            .await
            .map_err(|e| match e {
                GenerationError::Unexpected(message) => {
                    GenerationError::Unexpected(self.redact(&message))
                }
                other => other,
            })?;

        if !(200..300).contains(&response.status) {
            warn!(
                "Imagen returned status {}: {}",
                response.status,
                self.redact(&String::from_utf8_lossy(&response.body))
            );
            return Err(GenerationError::RequestFailed {
                status: response.status,
            });
        }

        let result: Value = serde_json::from_slice(&response.body).map_err(|e| {
            GenerationError::Unexpected(format!("Failed to parse Imagen response: {}", e))
        })?;

        let encoded = result["predictions"]
            .as_array()
            .and_then(|predictions| predictions.first())
            .and_then(|prediction| prediction["bytesBase64Encoded"].as_str())
            .filter(|encoded| !encoded.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let image_data = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| GenerationError::Unexpected(format!("Failed to decode image: {}", e)))?;

        debug!(
            "Received {} bytes in {} ms",
            image_data.len(),
            start.elapsed().as_millis()
        );

        Ok(GeneratedImage::new(Bytes::from(image_data), prompt, style))
    }
}

#[async_trait]
impl<T: PredictTransport> ImageGenerator for ImagenService<T> {
    async fn generate(
        &self,
        prompt: &str,
        style: &StylePreset,
    ) -> Result<GeneratedImage, GenerationError> {
        self.generate_icon(prompt, style).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockTransport {
        status: u16,
        body: &'static str,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PredictTransport for MockTransport {
        async fn post_json(
            &self,
            url: Url,
            body: &Value,
        ) -> Result<TransportResponse, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), body.clone()));
            Ok(TransportResponse {
                status: self.status,
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    struct UnreachableTransport;

    #[async_trait]
    impl PredictTransport for UnreachableTransport {
        async fn post_json(&self, url: Url, _: &Value) -> Result<TransportResponse, GenerationError> {
            Err(GenerationError::Unexpected(format!(
                "error sending request for url ({}): connection refused",
                url
            )))
        }
    }

    fn config(api_key: Option<&str>) -> Config {
        Config {
            api_key: api_key.map(str::to_string),
            base_url: "https://images.test/v1beta/models/".to_string(),
            model: "imagen-test".to_string(),
            download_dir: ".".into(),
        }
    }

    fn flat() -> &'static StylePreset {
        StylePreset::find("flat").unwrap()
    }

    #[tokio::test]
    async fn success_decodes_first_prediction() {
        let service = ImagenService::with_transport(
            &config(Some("secret")),
            MockTransport::replying(200, r#"{"predictions":[{"bytesBase64Encoded":"AAAA"}]}"#),
        );

        let image = service.generate("cyberpunk cat", flat()).await.unwrap();

        assert_eq!(image.image_data.as_ref(), &[0u8, 0, 0]);
        assert_eq!(image.source_prompt, "cyberpunk cat");
        assert_eq!(image.style_name, "Flat Design");
    }

    #[tokio::test]
    async fn request_carries_key_in_query_and_one_square_sample() {
        let service = ImagenService::with_transport(
            &config(Some("secret")),
            MockTransport::replying(200, r#"{"predictions":[{"bytesBase64Encoded":"AAAA"}]}"#),
        );
        service.generate("rocket", flat()).await.unwrap();

        let calls = service.transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (url, body) = &calls[0];
        assert_eq!(
            url,
            "https://images.test/v1beta/models/imagen-test:predict?key=secret"
        );
        assert_eq!(body["instances"][0]["prompt"], flat().compose_prompt("rocket"));
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "1:1");
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let service = ImagenService::with_transport(
            &config(Some("secret")),
            MockTransport::replying(429, r#"{"error":{"message":"quota"}}"#),
        );

        let err = service.generate("cyberpunk cat", flat()).await.unwrap_err();

        assert_eq!(err, GenerationError::RequestFailed { status: 429 });
        assert_eq!(service.transport.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_credential_never_touches_transport() {
        for prompt in ["cyberpunk cat", "   "] {
            let service = ImagenService::with_transport(
                &config(None),
                MockTransport::replying(200, "{}"),
            );
            let err = service.generate(prompt, flat()).await.unwrap_err();
            assert_eq!(err, GenerationError::MissingCredential);
            assert!(service.transport.calls.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn blank_prompt_fails_fast() {
        let service = ImagenService::with_transport(
            &config(Some("secret")),
            MockTransport::replying(200, "{}"),
        );
        let err = service.generate(" \t ", flat()).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyPrompt);
        assert!(service.transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_or_empty_predictions_are_empty_response() {
        for body in [
            "{}",
            r#"{"predictions":[]}"#,
            r#"{"predictions":[{"raiFilteredReason":"blocked"}]}"#,
        ] {
            let service = ImagenService::with_transport(
                &config(Some("secret")),
                MockTransport::replying(200, body),
            );
            let err = service.generate("cat", flat()).await.unwrap_err();
            assert_eq!(err, GenerationError::EmptyResponse, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn malformed_bodies_are_unexpected() {
        for body in [
            "not json",
            r#"{"predictions":[{"bytesBase64Encoded":"***"}]}"#,
        ] {
            let service = ImagenService::with_transport(
                &config(Some("secret")),
                MockTransport::replying(200, body),
            );
            let err = service.generate("cat", flat()).await.unwrap_err();
            assert!(matches!(err, GenerationError::Unexpected(_)), "body: {}", body);
        }
    }

    #[tokio::test]
    async fn transport_failure_is_unexpected_and_masks_key() {
        let service = ImagenService::with_transport(&config(Some("secret")), UnreachableTransport);
        let err = service.generate("cat", flat()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Unexpected(_)));
        assert!(!err.to_string().contains("secret"));
        assert!(err.to_string().contains("[redacted]"));
    }

    #[tokio::test]
    async fn connection_error_text_omits_key() {
        let config = Config {
            api_key: Some("SUPERSECRET".to_string()),
            base_url: "http://127.0.0.1:1/v1beta/models".to_string(),
            model: "m".to_string(),
            download_dir: ".".into(),
        };
        let service = ImagenService::new(&config);

        let err = service.generate("cat", flat()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Unexpected(_)));
        assert!(!err.to_string().contains("SUPERSECRET"), "{}", err);
    }

    #[tokio::test]
    async fn rejected_request_error_omits_key() {
        let service = ImagenService::with_transport(
            &config(Some("secret")),
            MockTransport::replying(403, r#"{"error":{"message":"API key secret is invalid"}}"#),
        );

        let err = service.generate("cat", flat()).await.unwrap_err();

        assert_eq!(err, GenerationError::RequestFailed { status: 403 });
        assert!(!err.to_string().contains("secret"));
        assert!(!err.user_message().contains("secret"));
    }

    #[test]
    fn redact_masks_every_occurrence() {
        let service = ImagenService::with_transport(&config(Some("secret")), UnreachableTransport);
        assert_eq!(
            service.redact("key=secret&again=secret"),
            "key=[redacted]&again=[redacted]"
        );
    }
}
