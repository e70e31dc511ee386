use std::path::PathBuf;

use anyhow::Result;
use cliclack::spinner;
use console::style;
use dismantle::analysis::analyze_website;
use dismantle::config::Settings;
use dismantle::factory::{agent_client, artifact_store};
use dismantle::models::session::Session;
use dismantle::url_normalizer::{looks_fetchable, normalize};

use crate::render::{export_media, print_artifact, print_error, print_markdown};

pub async fn execute(settings: &Settings, raw_url: &str, media_path: Option<PathBuf>) -> Result<()> {
    let target = normalize(raw_url);
    if target.is_empty() {
        print_error("Enter a website address to analyze");
        return Ok(());
    }
    if target != raw_url {
        println!("{}", style(format!("Analyzing: {}", target)).dim().italic());
    }
    if !looks_fetchable(&target) {
        println!(
            "{}",
            style(format!("\"{}\" does not look like a website address", target)).yellow()
        );
    }

    let agent = agent_client(settings)?;
    let store = artifact_store(settings)?;
    let session = Session::new();

    let spin = spinner();
    spin.start("Analyzing website...");
    let analysis = analyze_website(&agent, &store, session.id(), raw_url).await;
    spin.stop("");

    let Some(analysis) = analysis else {
        return Ok(());
    };

    if !analysis.response.success {
        print_error(&format!("Analysis failed: {}", analysis.response.message));
        return Ok(());
    }

    println!("{}", style("Analysis completed!").green().bold());
    match analysis.artifact {
        Some(Ok(artifact)) => {
            print_artifact(&artifact)?;
            if let Some(path) = media_path {
                export_media(&artifact, &path)?;
            }
        }
        Some(Err(e)) => print_error(&format!("Error loading analysis data: {}", e)),
        None => {}
    }

    print_markdown(&analysis.response.message)
}
