use anyhow::Result;

use crate::agent::bedrock::{BedrockAgentConfig, BedrockAgentRuntime};
use crate::agent::client::AgentClient;
use crate::config::Settings;
use crate::store::client::ArtifactStore;
use crate::store::s3::{S3Config, S3Store};

pub fn agent_client(settings: &Settings) -> Result<AgentClient> {
    let runtime = BedrockAgentRuntime::new(BedrockAgentConfig {
        endpoint: settings
            .agent_endpoint
            .clone()
            .unwrap_or_else(|| BedrockAgentConfig::default_endpoint(&settings.region)),
        region: settings.region.clone(),
        agent_id: settings.agent_id.clone(),
        agent_alias_id: settings.agent_alias_id.clone(),
        credentials: settings.credentials.clone(),
    })?;

    let mut client = AgentClient::new(Box::new(runtime)).with_trace(settings.enable_trace);
    if let Some(timeout) = settings.agent_timeout {
        client = client.with_drain_timeout(timeout);
    }
    Ok(client)
}

pub fn artifact_store(settings: &Settings) -> Result<ArtifactStore> {
    let store = S3Store::new(S3Config {
        bucket: settings.bucket.clone(),
        region: settings.region.clone(),
        endpoint: settings.store_endpoint.clone(),
        credentials: settings.credentials.clone(),
    })?;
    Ok(ArtifactStore::new(Box::new(store))?)
}
