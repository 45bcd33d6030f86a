use agent_api::{AgentApiClient, AgentApiError, AgentRequest, CancellationSignal, StreamRecord};
use log::{info, warn};

use crate::attachment::ContentAction;
use crate::classify::{classify, ClassifyContext};
use crate::error::{ChatError, TranscriptError};
use crate::preflight::{AllowAll, Preflight};
use crate::transcript::Transcript;
use crate::viewer::AttachmentHost;

pub const DEFAULT_AGENT: &str = "general";

/// Result of one submitted prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Index of the assistant turn the stream filled.
    pub turn_index: usize,
    /// Records received, including ignored ones.
    pub records: usize,
    pub cancelled: bool,
}

/// One conversation: transcript plus the identity sent with each prompt.
pub struct ChatSession {
    transcript: Transcript,
    agent: String,
    user: Option<String>,
    preflight: Box<dyn Preflight>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("transcript", &self.transcript)
            .field("agent", &self.agent)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT)
    }
}

impl ChatSession {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(),
            agent: agent.into(),
            user: None,
            preflight: Box::new(AllowAll),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_preflight(mut self, preflight: impl Preflight + 'static) -> Self {
        self.preflight = Box::new(preflight);
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.transcript.push_greeting(greeting);
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Switch persona for subsequent prompts.
    pub fn set_agent(&mut self, agent: impl Into<String>) {
        self.agent = agent.into();
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Send `prompt` and stream the reply into a new assistant turn.
    pub async fn submit(
        &mut self,
        client: &AgentApiClient,
        prompt: &str,
        host: &mut dyn AttachmentHost,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<TurnOutcome, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if let Some(index) = self.transcript.active_index() {
            return Err(TranscriptError::StreamAlreadyActive { index }.into());
        }
        if let Err(rejection) = self.preflight.check(self.user.as_deref(), &self.agent) {
            self.transcript.push_system(rejection.to_string());
            return Err(rejection.into());
        }

        self.transcript.push_user(prompt);
        let mut request = AgentRequest::new(prompt, self.agent.clone());
        if let Some(user) = &self.user {
            request = request.with_user(user.clone());
        }

        let mut stream = match client.open_stream(&request, cancellation).await {
            Ok(stream) => stream,
            Err(AgentApiError::Cancelled) => return Err(ChatError::Cancelled),
            Err(error) => {
                warn!("agent request failed: {error}");
                self.transcript
                    .push_system(format!("Could not reach the agent service: {error}"));
                return Err(error.into());
            }
        };

        let turn_index = self.begin_turn()?;
        let mut records = 0;
        let mut cancelled = false;

        loop {
            match stream.next_record().await {
                Ok(Some(record)) => {
                    records += 1;
                    self.on_record(&record, host);
                }
                Ok(None) => break,
                Err(AgentApiError::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(error) => {
                    self.end_turn();
                    warn!("agent stream from {} failed: {error}", stream.endpoint());
                    self.transcript
                        .push_system(format!("The response was interrupted: {error}"));
                    return Err(error.into());
                }
            }
        }

        self.end_turn();
        info!(
            "turn {turn_index} finished: {records} records from {}{}",
            stream.endpoint(),
            if cancelled { " (cancelled)" } else { "" }
        );
        Ok(TurnOutcome {
            turn_index,
            records,
            cancelled,
        })
    }

    /// Open the streaming assistant turn. For hosts that drive their own
    /// transport loop.
    pub fn begin_turn(&mut self) -> Result<usize, ChatError> {
        Ok(self.transcript.begin_stream()?)
    }

    /// Classify and apply one record to the streaming turn. A written
    /// attachment is handed to `host` right away.
    pub fn on_record(&mut self, record: &StreamRecord, host: &mut dyn AttachmentHost) -> bool {
        let action = classify(record, &ClassifyContext::new(&self.agent));
        let sets_attachment = matches!(action, ContentAction::SetAttachment(_));
        if !self.transcript.apply(action) {
            return false;
        }
        if sets_attachment {
            if let Some(index) = self.transcript.active_index() {
                self.transcript.request_attachment_render(index, host);
            }
        }
        true
    }

    /// Freeze the streaming turn.
    pub fn end_turn(&mut self) -> Option<usize> {
        self.transcript.finish_stream()
    }
}
