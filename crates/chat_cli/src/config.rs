//! Host configuration: an optional JSON file plus environment overrides.
//!
//! ```json
//! {
//!   "endpoints": ["https://agents.example.com/api/agent/stream"],
//!   "user": "ada",
//!   "agent": "general",
//!   "greeting": "Hi! What are we working on?",
//!   "timeout_sec": 120,
//!   "require_user": false,
//!   "diagram_dir": "/tmp/agent_chat_diagrams",
//!   "mmdc_path": "mmdc"
//! }
//! ```
//!
//! Every field is optional. Unknown fields are rejected. `timeout_sec` must be
//! > 0 when provided.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use agent_api::url::DEFAULT_ENDPOINTS;
use agent_api::AgentApiConfig;
use agent_chat::DEFAULT_AGENT;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV_VAR: &str = "AGENT_CHAT_CONFIG_PATH";
pub const ENDPOINTS_ENV_VAR: &str = "AGENT_CHAT_ENDPOINTS";
pub const AGENT_ENV_VAR: &str = "AGENT_CHAT_AGENT";
pub const USER_ENV_VAR: &str = "AGENT_CHAT_USER";

pub const DEFAULT_GREETING: &str = "Hi! Ask me anything, or type /help to see the commands.";
const DEFAULT_MMDC_PATH: &str = "mmdc";
const DIAGRAM_DIR_NAME: &str = "agent_chat_diagrams";

#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    endpoints: Option<Vec<String>>,
    user: Option<String>,
    agent: Option<String>,
    greeting: Option<String>,
    timeout_sec: Option<u64>,
    require_user: Option<bool>,
    diagram_dir: Option<PathBuf>,
    mmdc_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub endpoints: Vec<String>,
    pub user: Option<String>,
    pub agent: String,
    pub greeting: String,
    pub timeout: Option<Duration>,
    pub require_user: bool,
    pub diagram_dir: PathBuf,
    pub mmdc_path: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|url| url.to_string()).collect(),
            user: None,
            agent: DEFAULT_AGENT.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            timeout: None,
            require_user: false,
            diagram_dir: std::env::temp_dir().join(DIAGRAM_DIR_NAME),
            mmdc_path: PathBuf::from(DEFAULT_MMDC_PATH),
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Result<Self, CliConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup` instead of the process
    /// environment.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliConfigError> {
        let file = match non_empty(lookup(CONFIG_PATH_ENV_VAR)) {
            Some(path) => read_file_config(Path::new(&path))?,
            None => FileConfig::default(),
        };

        let mut config = Self::default();
        config.apply_file(file)?;

        if let Some(endpoints) = non_empty(lookup(ENDPOINTS_ENV_VAR)) {
            config.endpoints = split_endpoints(&endpoints);
        }
        if let Some(agent) = non_empty(lookup(AGENT_ENV_VAR)) {
            config.agent = agent;
        }
        if let Some(user) = non_empty(lookup(USER_ENV_VAR)) {
            config.user = Some(user);
        }

        if config.endpoints.is_empty() {
            return Err(CliConfigError::Invalid(
                "at least one endpoint is required".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn api_config(&self) -> AgentApiConfig {
        let mut config = AgentApiConfig::new(self.endpoints.iter().cloned());
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<(), CliConfigError> {
        if let Some(endpoints) = file.endpoints {
            self.endpoints = endpoints
                .into_iter()
                .map(|endpoint| endpoint.trim().to_string())
                .filter(|endpoint| !endpoint.is_empty())
                .collect();
        }
        if let Some(user) = non_empty(file.user) {
            self.user = Some(user);
        }
        if let Some(agent) = non_empty(file.agent) {
            self.agent = agent;
        }
        if let Some(greeting) = file.greeting {
            self.greeting = greeting;
        }
        if let Some(timeout_sec) = file.timeout_sec {
            if timeout_sec == 0 {
                return Err(CliConfigError::Invalid(
                    "timeout_sec must be > 0 when provided".to_string(),
                ));
            }
            self.timeout = Some(Duration::from_secs(timeout_sec));
        }
        if let Some(require_user) = file.require_user {
            self.require_user = require_user;
        }
        if let Some(diagram_dir) = file.diagram_dir {
            self.diagram_dir = diagram_dir;
        }
        if let Some(mmdc_path) = file.mmdc_path {
            self.mmdc_path = mmdc_path;
        }
        Ok(())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, CliConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| CliConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn split_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
