//! Agent card discovery from the well-known path.

use crate::error::{A2AError, A2AResult};
use crate::types::AgentCard;

/// Fetches agent cards from `/.well-known/agent.json`.
pub struct CardResolver {
    client: reqwest::Client,
}

impl CardResolver {
    /// Create a resolver with a fresh HTTP client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the card published at `base_url`.
    pub async fn resolve(&self, base_url: &str) -> A2AResult<AgentCard> {
        let url = format!(
            "{}/.well-known/agent.json",
            base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| A2AError::Transport(format!("failed to fetch agent card: {e}")))?;

        if !response.status().is_success() {
            return Err(A2AError::Http {
                status: response.status().as_u16(),
                body: format!("agent card fetch returned {}", response.status()),
            });
        }

        response
            .json::<AgentCard>()
            .await
            .map_err(|e| A2AError::InvalidJson(format!("bad agent card: {e}")))
    }
}

impl Default for CardResolver {
    fn default() -> Self {
        Self::new()
    }
}
