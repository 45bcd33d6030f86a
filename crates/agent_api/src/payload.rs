use serde::{Deserialize, Serialize};

/// Request payload for one conversation turn.
///
/// `user` is always serialized, as `null` when no user is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub prompt: String,
    pub user: Option<String>,
    pub agent: String,
}

impl AgentRequest {
    pub fn new(prompt: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            user: None,
            agent: agent.into(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}
