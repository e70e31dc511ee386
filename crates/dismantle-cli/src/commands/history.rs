use anyhow::Result;
use cliclack::select;
use console::style;
use dismantle::config::Settings;
use dismantle::factory::artifact_store;

use crate::render::{print_artifact, print_error};

pub async fn execute(settings: &Settings, prefix: Option<String>, pick: bool) -> Result<()> {
    let store = artifact_store(settings)?;
    let prefix = prefix.unwrap_or_else(|| settings.artifact_prefix.clone());
    let entries = store.list_artifacts(&prefix).await;

    if entries.is_empty() {
        println!("No previous analyses found");
        return Ok(());
    }

    if !pick {
        for entry in &entries {
            println!(
                "{}  {}  {}",
                style(entry.last_modified.format("%Y-%m-%d %H:%M")).dim(),
                style(entry.display_name()).bold(),
                style(&entry.key).dim()
            );
        }
        return Ok(());
    }

    let mut prompt = select("Select previous analysis:");
    for entry in &entries {
        prompt = prompt.item(
            entry.key.clone(),
            entry.display_name(),
            entry.last_modified.format("%Y-%m-%d").to_string(),
        );
    }
    let key: String = prompt.interact()?;

    match store.get_artifact(&key).await {
        Ok(artifact) => print_artifact(&artifact),
        Err(e) => {
            print_error(&format!("Error loading analysis: {}", e));
            Ok(())
        }
    }
}
