//! Runtime configuration recognized by the core, sourced from environment
//! variables. No config-file machinery here — agents embedding this crate
//! layer their own on top.

use std::env;

/// Environment variable naming the catalog base URL.
pub const ENV_CATALOG_URL: &str = "CATALOG_URL";

/// Environment variable carrying the OpenAI-compatible provider key.
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Environment variable carrying the Anthropic provider key.
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Environment-derived runtime settings.
#[derive(Debug, Clone, Default)]
pub struct FabricConfig {
    /// Catalog base URL (`CATALOG_URL`).
    pub catalog_url: Option<String>,
    /// OpenAI-compatible provider credential (`OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,
    /// Anthropic provider credential (`ANTHROPIC_API_KEY`).
    pub anthropic_api_key: Option<String>,
    /// Object-store access key (`AWS_ACCESS_KEY_ID`), surfaced for
    /// object-store `TaskStore` backends layered on this crate; none ships
    /// here.
    pub aws_access_key_id: Option<String>,
    /// Object-store secret key (`AWS_SECRET_ACCESS_KEY`); see
    /// [`aws_access_key_id`](Self::aws_access_key_id).
    pub aws_secret_access_key: Option<String>,
}

impl FabricConfig {
    /// Read all recognized variables from the process environment.
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        fn read(name: &str) -> Option<String> {
            env::var(name).ok().filter(|v| !v.is_empty())
        }

        FabricConfig {
            catalog_url: read(ENV_CATALOG_URL),
            openai_api_key: read(ENV_OPENAI_API_KEY),
            anthropic_api_key: read(ENV_ANTHROPIC_API_KEY),
            aws_access_key_id: read("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: read("AWS_SECRET_ACCESS_KEY"),
        }
    }
}
