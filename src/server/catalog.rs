//! Discovery catalog — the directory of known agents.
//!
//! Three pieces: the in-process [`CatalogRegistry`], the HTTP surface
//! ([`catalog_router`]) serving `/.well-known/catalog.json`, `/agent/{id}`
//! and `POST /agent`, and the retrying [`CatalogClient`] agents use to
//! self-register and to resolve peers. Registration retries tolerate the
//! startup race where agents come up before the catalog does.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::error::{A2AError, A2AResult};
use crate::types::AgentCard;

/// Default number of attempts for catalog client operations.
const DEFAULT_ATTEMPTS: u32 = 5;

/// Default base delay between attempts; doubles each retry.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(3);

/// Process-wide registry of agent cards keyed by name.
///
/// Many readers, occasional writers (startup registration).
pub struct CatalogRegistry {
    agents: RwLock<HashMap<String, AgentCard>>,
}

impl CatalogRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) an agent card under its name.
    pub async fn add_agent(&self, card: AgentCard) {
        info!(agent = %card.name, url = %card.url, "agent registered");
        self.agents.write().await.insert(card.name.clone(), card);
    }

    /// Look up an agent by name.
    pub async fn get_agent(&self, name: &str) -> Option<AgentCard> {
        self.agents.read().await.get(name).cloned()
    }

    /// All registered cards, sorted by name for stable listings.
    pub async fn get_agents(&self) -> Vec<AgentCard> {
        let mut cards: Vec<AgentCard> = self.agents.read().await.values().cloned().collect();
        cards.sort_by(|a, b| a.name.cmp(&b.name));
        cards
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the catalog service's HTTP router.
pub fn catalog_router(registry: Arc<CatalogRegistry>) -> Router {
    Router::new()
        .route("/.well-known/catalog.json", get(handle_list))
        .route("/agent/{id}", get(handle_get))
        .route("/agent", post(handle_register))
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

async fn handle_list(State(registry): State<Arc<CatalogRegistry>>) -> Response {
    Json(registry.get_agents().await).into_response()
}

async fn handle_get(
    State(registry): State<Arc<CatalogRegistry>>,
    Path(id): Path<String>,
) -> Response {
    match registry.get_agent(&id).await {
        Some(card) => Json(card).into_response(),
        None => (StatusCode::NOT_FOUND, "agent not found").into_response(),
    }
}

async fn handle_register(
    State(registry): State<Arc<CatalogRegistry>>,
    body: Json<serde_json::Value>,
) -> Response {
    let card: AgentCard = match serde_json::from_value(body.0) {
        Ok(card) => card,
        Err(e) => {
            warn!(error = %e, "rejected malformed agent card");
            return (StatusCode::BAD_REQUEST, format!("invalid agent card: {e}"))
                .into_response();
        }
    };
    if card.name.is_empty() || card.url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            "agent card requires non-empty name and url",
        )
            .into_response();
    }
    registry.add_agent(card).await;
    StatusCode::CREATED.into_response()
}

/// HTTP client for a remote catalog, with bounded exponential backoff.
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
    attempts: u32,
    base_delay: Duration,
}

impl CatalogClient {
    /// Client for a catalog at `base_url` with default retry policy
    /// (5 attempts, 3 s base, exponential).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            attempts: DEFAULT_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Override the retry policy (tests use short delays).
    pub fn with_retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    async fn with_backoff<T, F, Fut>(&self, what: &str, op: F) -> A2AResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = A2AResult<T>>,
    {
        let mut delay = self.base_delay;
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(attempt, error = %e, "{what} attempt failed");
                    last_err = Some(e);
                    if attempt < self.attempts {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| A2AError::internal_error(format!("{what} never attempted"))))
    }

    /// Register an agent card, retrying while the catalog comes up.
    pub async fn register(&self, card: &AgentCard) -> A2AResult<()> {
        let url = format!("{}/agent", self.base_url);
        self.with_backoff("catalog registration", || async {
            let resp = self
                .client
                .post(&url)
                .json(card)
                .send()
                .await
                .map_err(|e| A2AError::Transport(format!("catalog unreachable: {e}")))?;
            match resp.status() {
                StatusCode::CREATED => Ok(()),
                status => Err(A2AError::Http {
                    status: status.as_u16(),
                    body: resp.text().await.unwrap_or_default(),
                }),
            }
        })
        .await
    }

    /// Resolve one agent by name, retrying to tolerate startup races.
    pub async fn discover(&self, name: &str) -> A2AResult<AgentCard> {
        let url = format!("{}/agent/{}", self.base_url, name);
        self.with_backoff("catalog discovery", || async {
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| A2AError::Transport(format!("catalog unreachable: {e}")))?;
            if resp.status() == StatusCode::NOT_FOUND {
                // Retryable: the agent may simply not have registered yet.
                return Err(A2AError::Http {
                    status: 404,
                    body: format!("agent {name} is not in the catalog"),
                });
            }
            if !resp.status().is_success() {
                return Err(A2AError::Http {
                    status: resp.status().as_u16(),
                    body: resp.text().await.unwrap_or_default(),
                });
            }
            resp.json::<AgentCard>()
                .await
                .map_err(|e| A2AError::InvalidJson(format!("bad agent card: {e}")))
        })
        .await
    }

    /// List all agents known to the catalog.
    pub async fn list(&self) -> A2AResult<Vec<AgentCard>> {
        let url = format!("{}/.well-known/catalog.json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| A2AError::Transport(format!("catalog unreachable: {e}")))?;
        if !resp.status().is_success() {
            return Err(A2AError::Http {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }
        resp.json::<Vec<AgentCard>>()
            .await
            .map_err(|e| A2AError::InvalidJson(format!("bad catalog listing: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentCapabilities;

    fn card(name: &str) -> AgentCard {
        AgentCard {
            name: name.to_string(),
            description: None,
            url: format!("http://localhost/{name}"),
            provider: None,
            version: "0.1.0".to_string(),
            documentation_url: None,
            capabilities: AgentCapabilities::default(),
            authentication: None,
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: Vec::new(),
        }
    }

    #[tokio::test]
    async fn registry_add_get_list() {
        let registry = CatalogRegistry::new();
        registry.add_agent(card("beta")).await;
        registry.add_agent(card("alpha")).await;

        assert!(registry.get_agent("alpha").await.is_some());
        assert!(registry.get_agent("gamma").await.is_none());

        let names: Vec<String> = registry
            .get_agents()
            .await
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn re_registration_replaces_card() {
        let registry = CatalogRegistry::new();
        registry.add_agent(card("echo")).await;
        let mut updated = card("echo");
        updated.version = "0.2.0".to_string();
        registry.add_agent(updated).await;

        assert_eq!(registry.get_agent("echo").await.unwrap().version, "0.2.0");
        assert_eq!(registry.get_agents().await.len(), 1);
    }
}
