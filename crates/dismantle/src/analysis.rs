//! The "analyze a website" interaction: normalize, ask the agent, then load
//! the stored analysis the agent links to.
use tracing::debug;

use crate::agent::client::AgentClient;
use crate::errors::RetrievalError;
use crate::models::artifact::Artifact;
use crate::models::response::AgentResponse;
use crate::store::client::ArtifactStore;
use crate::url_normalizer::normalize;

/// Line prefix the agent uses to point at the stored analysis.
pub const ANALYSIS_LINK_MARKER: &str = "Access full analysis at:";

pub fn analysis_prompt(url: &str) -> String {
    format!("Analyze this website: {}", url)
}

/// The analysis link in an agent reply. When several lines carry one, the last wins.
pub fn find_analysis_link(message: &str) -> Option<&str> {
    message
        .lines()
        .rev()
        .filter_map(|line| line.strip_prefix(ANALYSIS_LINK_MARKER))
        .map(str::trim)
        .find(|link| !link.is_empty())
}

#[derive(Debug)]
pub struct WebsiteAnalysis {
    /// Normalized address that was sent to the agent
    pub target: String,
    pub response: AgentResponse,
    /// Linked artifact; `None` when the reply carried no link or the analysis failed.
    pub artifact: Option<Result<Artifact, RetrievalError>>,
}

impl WebsiteAnalysis {
    /// Whether normalization changed what the user typed.
    pub fn rewritten(&self, raw_url: &str) -> bool {
        self.target != raw_url
    }
}

/// Run one analysis. Returns `None` when there is nothing to analyze.
pub async fn analyze_website(
    agent: &AgentClient,
    store: &ArtifactStore,
    session_id: &str,
    raw_url: &str,
) -> Option<WebsiteAnalysis> {
    let target = normalize(raw_url);
    if target.is_empty() {
        return None;
    }

    let response = agent.invoke(&analysis_prompt(&target), session_id).await;
    let artifact = if response.success {
        match find_analysis_link(&response.message) {
            Some(link) => {
                debug!(link, "loading linked analysis");
                Some(store.fetch_linked(link).await)
            }
            None => None,
        }
    } else {
        None
    };

    Some(WebsiteAnalysis {
        target,
        response,
        artifact,
    })
}
