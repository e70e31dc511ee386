use std::path::PathBuf;

use anyhow::Result;
use dismantle::config::Settings;
use dismantle::factory::artifact_store;

use crate::render::{export_media, print_artifact, print_error};

pub async fn execute(settings: &Settings, key: &str, media_path: Option<PathBuf>) -> Result<()> {
    let store = artifact_store(settings)?;
    match store.get_artifact(key).await {
        Ok(artifact) => {
            print_artifact(&artifact)?;
            if let Some(path) = media_path {
                export_media(&artifact, &path)?;
            }
        }
        Err(e) => print_error(&format!("Error loading analysis: {}", e)),
    }
    Ok(())
}
