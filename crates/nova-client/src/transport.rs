use async_trait::async_trait;
use futures::StreamExt;
use nova_core::FileAttachment;
use reqwest::{header, Client};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::payload;
use crate::sse::SseDecoder;

/// Receives the cumulative accumulated text after every decoded frame
pub type DeltaCallback = Box<dyn FnMut(&str) + Send>;

/// Receives `(file name, progress 0..=100)` as attachments are embedded
pub type UploadCallback = Box<dyn FnMut(&str, u8) + Send>;

/// Transport seam the session layer talks through
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one user turn and stream the reply.
    ///
    /// `on_delta` is invoked with the full accumulated text after each
    /// decoded frame; the returned string is the final accumulated text.
    async fn send(
        &self,
        text: &str,
        attachments: &[FileAttachment],
        on_delta: DeltaCallback,
        on_upload: Option<UploadCallback>,
    ) -> Result<String>;
}

/// HTTP transport for an OpenAI-compatible chat completions endpoint
pub struct ChatClient {
    config: ClientConfig,
    http: Client,
}

impl ChatClient {
    /// Create a client from configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// Get the config
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Pre-flight checks; nothing touches the network past a failure here.
    fn check_inputs(&self, text: &str, attachments: &[FileAttachment]) -> Result<()> {
        if self.config.api_key.trim().is_empty() {
            return Err(ClientError::Config("no API key is configured".to_string()));
        }
        if self.config.model.trim().is_empty() {
            return Err(ClientError::Config("no model is configured".to_string()));
        }
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(ClientError::Validation(
                "message text is required when no attachments are present".to_string(),
            ));
        }
        self.config
            .attachment_policy
            .check(attachments)
            .map_err(|e| ClientError::Validation(e.to_string()))
    }

    /// Assemble message content, reporting per-file progress as each
    /// attachment is encoded into the payload.
    fn build_content(
        &self,
        text: &str,
        attachments: &[FileAttachment],
        on_upload: &mut Option<UploadCallback>,
    ) -> serde_json::Value {
        if attachments.is_empty() {
            return payload::text_content(text);
        }

        let mut parts = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            if let Some(cb) = on_upload.as_mut() {
                cb(&attachment.name, 0);
            }
            parts.push(payload::image_part(attachment));
            if let Some(cb) = on_upload.as_mut() {
                cb(&attachment.name, 100);
            }
        }
        payload::parts_content(text, parts)
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send(
        &self,
        text: &str,
        attachments: &[FileAttachment],
        mut on_delta: DeltaCallback,
        mut on_upload: Option<UploadCallback>,
    ) -> Result<String> {
        self.check_inputs(text, attachments)?;

        let content = self.build_content(text, attachments, &mut on_upload);
        let body = payload::build_body(&self.config, content);
        let url = format!("{}/chat/completions", self.config.base_url);

        debug!(model = %self.config.model, "sending chat completion request");

        let response = self
            .http
            .post(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut accumulated = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ClientError::Network(e.to_string()))?;
            for delta in decoder.push(&chunk) {
                accumulated.push_str(&delta);
                on_delta(&accumulated);
            }
            if decoder.is_done() {
                break;
            }
        }

        if accumulated.is_empty() {
            return Err(ClientError::EmptyResponse);
        }

        debug!(chars = accumulated.chars().count(), "stream complete");
        Ok(accumulated)
    }
}
