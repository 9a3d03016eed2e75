//! Ergonomic builders for composite wire types.

use crate::error::{A2AError, A2AResult};
use crate::types::{
    AgentAuthentication, AgentCapabilities, AgentCard, AgentProvider, AgentSkill,
};

/// Builder for [`AgentCard`].
///
/// # Example
///
/// ```
/// use a2a_fabric::AgentCardBuilder;
///
/// let card = AgentCardBuilder::new("echo-agent")
///     .description("Echoes every message back")
///     .version("1.0.0")
///     .url("http://localhost:7420")
///     .streaming(true)
///     .skill("echo", "Echo", Some("Echoes text input"))
///     .build()
///     .unwrap();
/// assert_eq!(card.name, "echo-agent");
/// ```
pub struct AgentCardBuilder {
    name: String,
    description: Option<String>,
    url: Option<String>,
    provider: Option<AgentProvider>,
    version: Option<String>,
    documentation_url: Option<String>,
    capabilities: AgentCapabilities,
    authentication: Option<AgentAuthentication>,
    default_input_modes: Vec<String>,
    default_output_modes: Vec<String>,
    skills: Vec<AgentSkill>,
}

impl AgentCardBuilder {
    /// Start a card for the named agent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: None,
            provider: None,
            version: None,
            documentation_url: None,
            capabilities: AgentCapabilities::default(),
            authentication: None,
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            skills: Vec::new(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the base URL the agent serves from.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the agent version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the providing organization.
    pub fn provider(mut self, organization: impl Into<String>, url: Option<String>) -> Self {
        self.provider = Some(AgentProvider {
            organization: organization.into(),
            url,
        });
        self
    }

    /// Set the documentation URL.
    pub fn documentation_url(mut self, url: impl Into<String>) -> Self {
        self.documentation_url = Some(url.into());
        self
    }

    /// Advertise streaming support.
    pub fn streaming(mut self, enabled: bool) -> Self {
        self.capabilities.streaming = enabled;
        self
    }

    /// Advertise push notification support.
    pub fn push_notifications(mut self, enabled: bool) -> Self {
        self.capabilities.push_notifications = enabled;
        self
    }

    /// Advertise state transition history.
    pub fn state_transition_history(mut self, enabled: bool) -> Self {
        self.capabilities.state_transition_history = enabled;
        self
    }

    /// Set authentication requirements.
    pub fn authentication(mut self, schemes: Vec<String>, credentials: Option<String>) -> Self {
        self.authentication = Some(AgentAuthentication {
            schemes,
            credentials,
        });
        self
    }

    /// Replace the default input modes.
    pub fn default_input_modes(mut self, modes: Vec<String>) -> Self {
        self.default_input_modes = modes;
        self
    }

    /// Replace the default output modes.
    pub fn default_output_modes(mut self, modes: Vec<String>) -> Self {
        self.default_output_modes = modes;
        self
    }

    /// Add a skill with id, name, and optional description.
    pub fn skill(mut self, id: impl Into<String>, name: impl Into<String>, description: Option<&str>) -> Self {
        self.skills.push(AgentSkill {
            id: id.into(),
            name: name.into(),
            description: description.map(String::from),
            tags: None,
            examples: None,
            input_modes: None,
            output_modes: None,
        });
        self
    }

    /// Add a fully specified skill.
    pub fn skill_full(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Finish the card; fails when name, url, or version is missing.
    pub fn build(self) -> A2AResult<AgentCard> {
        if self.name.is_empty() {
            return Err(A2AError::invalid_params("agent card requires a name"));
        }
        let url = self
            .url
            .ok_or_else(|| A2AError::invalid_params("agent card requires a url"))?;
        let version = self
            .version
            .ok_or_else(|| A2AError::invalid_params("agent card requires a version"))?;

        Ok(AgentCard {
            name: self.name,
            description: self.description,
            url,
            provider: self.provider,
            version,
            documentation_url: self.documentation_url,
            capabilities: self.capabilities,
            authentication: self.authentication,
            default_input_modes: self.default_input_modes,
            default_output_modes: self.default_output_modes,
            skills: self.skills,
        })
    }
}
