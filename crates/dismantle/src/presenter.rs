use crate::models::artifact::{Artifact, ContentBlock, MediaItem};
use crate::models::message::{Message, Role};
use crate::models::session::Session;

/// Headline figures of an analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub analysis_date: Option<&'a str>,
    pub image_count: u64,
    pub paragraph_count: u64,
    pub header_count: usize,
}

impl<'a> From<&'a Artifact> for ArtifactSummary<'a> {
    fn from(artifact: &'a Artifact) -> Self {
        Self {
            url: &artifact.url,
            title: &artifact.title,
            analysis_date: artifact.analysis_date(),
            image_count: artifact.metadata.image_count,
            paragraph_count: artifact.metadata.paragraph_count,
            header_count: artifact.header_count(),
        }
    }
}

/// Implement this for each front end that wants to show an analysis.
pub trait Presenter {
    fn summary(&mut self, summary: &ArtifactSummary<'_>);
    fn media(&mut self, index: usize, item: &MediaItem);
    fn header(&mut self, depth: u8, text: &str);
    fn paragraph(&mut self, text: &str);
    fn list(&mut self, items: &[String]);

    fn message(&mut self, _message: &Message) {}
}

/// Walk an artifact: summary, then media, then content blocks in document order.
pub fn present<P: Presenter + ?Sized>(artifact: &Artifact, presenter: &mut P) {
    presenter.summary(&ArtifactSummary::from(artifact));

    for (index, item) in artifact.media.iter().enumerate() {
        presenter.media(index, item);
    }

    for block in &artifact.structured_content {
        match block {
            ContentBlock::Header { text, .. } => {
                presenter.header(block.header_depth().unwrap_or(1), text)
            }
            ContentBlock::Paragraph { text } => presenter.paragraph(text),
            ContentBlock::List { items } => presenter.list(items),
            ContentBlock::Unknown => {}
        }
    }
}

pub fn present_transcript<P: Presenter + ?Sized>(session: &Session, presenter: &mut P) {
    for message in session.messages() {
        presenter.message(message);
    }
}

/// Builds a Markdown document, ready for a terminal renderer or a file.
#[derive(Debug, Default)]
pub struct MarkdownPresenter {
    output: String,
}

impl MarkdownPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(artifact: &Artifact) -> String {
        let mut presenter = Self::new();
        present(artifact, &mut presenter);
        presenter.finish()
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }
}

impl Presenter for MarkdownPresenter {
    fn summary(&mut self, summary: &ArtifactSummary<'_>) {
        self.line("# Analysis Results");
        self.line("");
        self.line(&format!("**URL:** [{}]({})  ", summary.url, summary.url));
        self.line(&format!("**Title:** {}", summary.title));
        self.line("");
        self.line("| Images | Paragraphs | Headers | Analysis Date |");
        self.line("|---|---|---|---|");
        self.line(&format!(
            "| {} | {} | {} | {} |",
            summary.image_count,
            summary.paragraph_count,
            summary.header_count,
            summary.analysis_date.unwrap_or("N/A")
        ));
        self.line("");
    }

    fn media(&mut self, index: usize, item: &MediaItem) {
        if index == 0 {
            self.line("## Media");
            self.line("");
        }
        self.line(&format!("- [{}]({})", item.caption(index), item.url));
    }

    fn header(&mut self, depth: u8, text: &str) {
        self.line("");
        self.line(&format!("{} {}", "#".repeat(depth as usize), text));
        self.line("");
    }

    fn paragraph(&mut self, text: &str) {
        self.line(text);
        self.line("");
    }

    fn list(&mut self, items: &[String]) {
        for item in items {
            self.line(&format!("- {}", item));
        }
        self.line("");
    }

    fn message(&mut self, message: &Message) {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Dismantle",
        };
        self.line(&format!("**{}:** {}", speaker, message.content));
        self.line("");
    }
}
