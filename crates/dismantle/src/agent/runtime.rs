use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::errors::InvocationError;

/// Payload bytes of a streamed reply, in arrival order. Chunk boundaries carry
/// no meaning: a JSON document or a UTF-8 sequence may be split anywhere.
pub type ChunkStream = BoxStream<'static, Result<Bytes, InvocationError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub session_id: String,
    pub input_text: String,
    pub enable_trace: bool,
}

/// Transport to a hosted, stateful agent (Bedrock agents, a gateway, a mock)
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Start an invocation and hand back the reply stream once the service accepted it.
    async fn invoke_agent(&self, request: &InvokeRequest) -> Result<ChunkStream, InvocationError>;
}
