use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};

use super::runtime::{AgentRuntime, ChunkStream, InvokeRequest};
use crate::errors::InvocationError;

enum Script {
    Chunks(Vec<Result<Bytes, InvocationError>>),
    ConnectError(InvocationError),
    Stall,
}

/// A runtime that replays a scripted reply and records what it was asked
pub struct MockAgentRuntime {
    script: Script,
    requests: Mutex<Vec<InvokeRequest>>,
}

impl MockAgentRuntime {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with these chunks, then end the stream.
    pub fn chunks(chunks: &[&str]) -> Self {
        Self::with_script(Script::Chunks(
            chunks
                .iter()
                .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
                .collect(),
        ))
    }

    /// Reply with raw byte chunks, which need not be valid UTF-8 on their own.
    pub fn raw_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self::with_script(Script::Chunks(
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect(),
        ))
    }

    /// Yield some chunks and then fail mid-stream.
    pub fn broken_stream(chunks: &[&str], error: InvocationError) -> Self {
        let mut items: Vec<Result<Bytes, InvocationError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        items.push(Err(error));
        Self::with_script(Script::Chunks(items))
    }

    /// Refuse the invocation outright.
    pub fn failing(error: InvocationError) -> Self {
        Self::with_script(Script::ConnectError(error))
    }

    /// Accept the invocation but never send anything.
    pub fn stalled() -> Self {
        Self::with_script(Script::Stall)
    }

    pub fn requests(&self) -> Vec<InvokeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentRuntime for MockAgentRuntime {
    async fn invoke_agent(&self, request: &InvokeRequest) -> Result<ChunkStream, InvocationError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Chunks(items) => Ok(stream::iter(items.clone()).boxed()),
            Script::ConnectError(error) => Err(error.clone()),
            Script::Stall => Ok(stream::pending().boxed()),
        }
    }
}
