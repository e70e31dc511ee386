use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bat::WrappingMode;
use console::style;
use dismantle::models::artifact::Artifact;
use dismantle::presenter::MarkdownPresenter;

const THEME: &str = "zenburn";

pub fn print_markdown(content: &str) -> Result<()> {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .map_err(|e| anyhow!("Failed to render output: {}", e))?;
    println!();
    Ok(())
}

pub fn print_artifact(artifact: &Artifact) -> Result<()> {
    print_markdown(&MarkdownPresenter::render(artifact))
}

/// Write the artifact's media URLs as an indented JSON array.
pub fn export_media(artifact: &Artifact, path: &Path) -> Result<()> {
    let json = artifact
        .media_list_json()
        .context("Failed to serialize media list")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "{} {} media URLs to {}",
        style("Saved").green(),
        artifact.media.len(),
        path.display()
    );
    Ok(())
}

pub fn print_error(message: &str) {
    eprintln!("{}", style(message).red());
}
