use agent_api::AgentApiError;
use thiserror::Error;

use crate::preflight::PreflightRejection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("turn {index} is still streaming")]
    StreamAlreadyActive { index: usize },
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error(transparent)]
    Preflight(#[from] PreflightRejection),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error("agent service error: {0}")]
    Transport(#[from] AgentApiError),

    #[error("request was cancelled before the stream opened")]
    Cancelled,
}
