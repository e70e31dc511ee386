use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::runtime::{AgentRuntime, ChunkStream, InvokeRequest};
use crate::aws::credentials::Credentials;
use crate::aws::event_stream::{Frame, FrameDecoder};
use crate::aws::sigv4::{sign_request, uri_encode, SigningParams};
use crate::errors::InvocationError;

const SIGNING_SERVICE: &str = "bedrock";
const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

#[derive(Debug, Clone)]
pub struct BedrockAgentConfig {
    pub endpoint: String,
    pub region: String,
    pub agent_id: String,
    pub agent_alias_id: String,
    pub credentials: Credentials,
}

impl BedrockAgentConfig {
    pub fn default_endpoint(region: &str) -> String {
        format!("https://bedrock-agent-runtime.{}.amazonaws.com", region)
    }
}

/// Payload of a `chunk` event
#[derive(Debug, Deserialize)]
struct ChunkPayload {
    bytes: Option<String>,
}

/// Payload of an `exception` message
#[derive(Debug, Deserialize)]
struct ExceptionPayload {
    message: Option<String>,
}

/// Invokes a Bedrock agent alias over the agent runtime REST API.
pub struct BedrockAgentRuntime {
    client: Client,
    config: BedrockAgentConfig,
}

impl BedrockAgentRuntime {
    pub fn new(config: BedrockAgentConfig) -> Result<Self, InvocationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn invoke_url(&self, session_id: &str) -> Result<Url, InvocationError> {
        let url = format!(
            "{}/agents/{}/agentAliases/{}/sessions/{}/text",
            self.config.endpoint.trim_end_matches('/'),
            uri_encode(&self.config.agent_id, true),
            uri_encode(&self.config.agent_alias_id, true),
            uri_encode(session_id, true),
        );
        Url::parse(&url)
            .map_err(|e| InvocationError::Transport(format!("Invalid agent URL {}: {}", url, e)))
    }
}

#[async_trait]
impl AgentRuntime for BedrockAgentRuntime {
    async fn invoke_agent(&self, request: &InvokeRequest) -> Result<ChunkStream, InvocationError> {
        let url = self.invoke_url(&request.session_id)?;
        let payload = json!({
            "inputText": request.input_text,
            "enableTrace": request.enable_trace,
        })
        .to_string();

        let headers = sign_request(
            "POST",
            &url,
            &[
                ("content-type", "application/json"),
                ("accept", EVENT_STREAM_CONTENT_TYPE),
            ],
            payload.as_bytes(),
            &SigningParams {
                credentials: &self.config.credentials,
                region: &self.config.region,
                service: SIGNING_SERVICE,
                time: Utc::now(),
                sign_content_sha256: false,
            },
        )?;

        debug!(
            agent_id = %self.config.agent_id,
            session_id = %request.session_id,
            "invoking agent"
        );

        let mut builder = self.client.post(url).body(payload);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvocationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes_stream();
        Ok(Box::pin(async_stream::try_stream! {
            futures::pin_mut!(body);
            let mut decoder = FrameDecoder::new();
            while let Some(data) = body.next().await {
                let data = data.map_err(InvocationError::from)?;
                decoder.extend(&data);
                while let Some(frame) = decoder
                    .next_frame()
                    .map_err(|e| InvocationError::MalformedStream(e.to_string()))?
                {
                    if let Some(chunk) = chunk_bytes(&frame)? {
                        yield chunk;
                    }
                }
            }
            if !decoder.is_empty() {
                Err::<(), _>(InvocationError::MalformedStream(
                    "stream ended inside a message".to_string(),
                ))?;
            }
        }))
    }
}

/// Payload bytes carried by a frame, if it is a chunk event.
///
/// Exceptions become errors; trace and other events are skipped.
fn chunk_bytes(frame: &Frame) -> Result<Option<Bytes>, InvocationError> {
    match frame.message_type() {
        Some("exception") => {
            let kind = frame
                .header_str(":exception-type")
                .unwrap_or("exception")
                .to_string();
            let message = serde_json::from_slice::<ExceptionPayload>(&frame.payload)
                .ok()
                .and_then(|p| p.message)
                .unwrap_or_else(|| String::from_utf8_lossy(&frame.payload).into_owned());
            Err(InvocationError::Remote { kind, message })
        }
        Some("error") => Err(InvocationError::Remote {
            kind: frame.header_str(":error-code").unwrap_or("error").to_string(),
            message: frame
                .header_str(":error-message")
                .unwrap_or_default()
                .to_string(),
        }),
        _ if frame.event_type() == Some("chunk") => {
            let payload: ChunkPayload = serde_json::from_slice(&frame.payload)
                .map_err(|e| InvocationError::MalformedStream(format!("chunk payload: {}", e)))?;
            match payload.bytes {
                Some(encoded) => STANDARD
                    .decode(encoded)
                    .map(|decoded| Some(Bytes::from(decoded)))
                    .map_err(|e| InvocationError::MalformedStream(format!("chunk bytes: {}", e))),
                None => Ok(None),
            }
        }
        other => {
            debug!(
                message_type = ?other,
                event_type = ?frame.event_type(),
                "skipping event"
            );
            Ok(None)
        }
    }
}
