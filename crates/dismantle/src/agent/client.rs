use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;
use tracing::{debug, warn};

use super::envelope;
use super::runtime::{AgentRuntime, ChunkStream, InvokeRequest};
use crate::errors::InvocationError;
use crate::models::message::Message;
use crate::models::response::AgentResponse;
use crate::models::session::Session;

/// Sends prompts to a hosted agent and turns the streamed reply into a message.
pub struct AgentClient {
    runtime: Box<dyn AgentRuntime>,
    enable_trace: bool,
    drain_timeout: Option<Duration>,
}

impl AgentClient {
    pub fn new(runtime: Box<dyn AgentRuntime>) -> Self {
        Self {
            runtime,
            enable_trace: true,
            drain_timeout: None,
        }
    }

    pub fn with_trace(mut self, enable_trace: bool) -> Self {
        self.enable_trace = enable_trace;
        self
    }

    /// Give up on a reply that has not finished streaming after `timeout`.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    /// Invoke the agent and return the reply text.
    pub async fn invoke_text(
        &self,
        prompt: &str,
        session_id: &str,
    ) -> Result<String, InvocationError> {
        let request = InvokeRequest {
            session_id: session_id.to_string(),
            input_text: prompt.to_string(),
            enable_trace: self.enable_trace,
        };

        let stream = self.runtime.invoke_agent(&request).await?;
        let buffer = match self.drain_timeout {
            Some(limit) => tokio::time::timeout(limit, drain(stream))
                .await
                .map_err(|_| InvocationError::Timeout(limit))??,
            None => drain(stream).await?,
        };

        debug!(session_id, bytes = buffer.len(), "agent reply received");
        let text = String::from_utf8(buffer.to_vec())?;
        Ok(envelope::extract_message(text))
    }

    /// Invoke the agent, folding any failure into the response.
    pub async fn invoke(&self, prompt: &str, session_id: &str) -> AgentResponse {
        match self.invoke_text(prompt, session_id).await {
            Ok(message) => AgentResponse::success(message),
            Err(e) => {
                warn!(session_id, error = %e, "agent invocation failed");
                AgentResponse::failure(e.to_string())
            }
        }
    }

    /// One conversational turn. The reply is only recorded when the agent answered.
    pub async fn converse(&self, session: &mut Session, prompt: &str) -> AgentResponse {
        session.push(Message::user(prompt));
        let response = self.invoke(prompt, session.id()).await;
        if response.success {
            session.push(Message::assistant(response.message.clone()));
        }
        response
    }
}

async fn drain(mut stream: ChunkStream) -> Result<BytesMut, InvocationError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer)
}
