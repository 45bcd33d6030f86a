use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agent_api::{AgentApiClient, AgentApiError, CancellationSignal};
use agent_chat::{
    diagram_blocks, open_turn_result, AttachmentUnit, ChatError, ChatSession, RequireUser, Role,
};
use diagram_engine::{CancelToken, DiagramPipeline, DiagramRenderer, DiagramView, ViewUpdate};
use log::debug;

use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use crate::config::CliConfig;
use crate::mermaid_cli::MermaidCliRenderer;
use crate::render::{render_attachment_line, render_diagram_status, render_turn, PagerViewer};

/// REPL state: one chat session plus the diagram views of its turns.
pub struct App<R> {
    session: ChatSession,
    client: AgentApiClient,
    pipeline: DiagramPipeline<R>,
    diagrams: BTreeMap<(usize, usize), DiagramView>,
    render_token: CancelToken,
    cancellation: CancellationSignal,
    svg_dir: Option<PathBuf>,
    pub should_exit: bool,
}

impl App<MermaidCliRenderer> {
    pub fn from_config(config: &CliConfig) -> Result<Self, AgentApiError> {
        let client = AgentApiClient::new(config.api_config())?;

        let mut session = ChatSession::new(config.agent.clone());
        if !config.greeting.trim().is_empty() {
            session = session.with_greeting(config.greeting.clone());
        }
        if let Some(user) = &config.user {
            session = session.with_user(user.clone());
        }
        if config.require_user {
            session = session.with_preflight(RequireUser);
        }

        let renderer = MermaidCliRenderer::new(&config.mmdc_path, &config.diagram_dir);
        Ok(Self::new(session, client, renderer).with_svg_dir(config.diagram_dir.clone()))
    }
}

impl<R: DiagramRenderer> App<R> {
    pub fn new(session: ChatSession, client: AgentApiClient, renderer: R) -> Self {
        Self {
            session,
            client,
            pipeline: DiagramPipeline::new(renderer),
            diagrams: BTreeMap::new(),
            render_token: CancelToken::new(),
            cancellation: Arc::new(AtomicBool::new(false)),
            svg_dir: None,
            should_exit: false,
        }
    }

    /// Directory rendered diagrams are written to, for status lines.
    pub fn with_svg_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.svg_dir = Some(dir.into());
        self
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn pipeline(&self) -> &DiagramPipeline<R> {
        &self.pipeline
    }

    /// Signal that cancels the reply being streamed. It is cleared once the
    /// prompt it interrupted has been handled.
    pub fn cancellation(&self) -> CancellationSignal {
        Arc::clone(&self.cancellation)
    }

    pub fn print_transcript<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (index, turn) in self.session.transcript().turns().iter().enumerate() {
            writeln!(out, "{}", render_turn(index, turn))?;
        }
        Ok(())
    }

    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<()> {
        match parse_slash_command(line) {
            Some(command) => self.handle_command(command, out),
            None => self.submit(line, out).await,
        }
    }

    fn handle_command<W: Write>(&mut self, command: SlashCommand, out: &mut W) -> io::Result<()> {
        match command {
            SlashCommand::Help => writeln!(out, "{HELP_TEXT}"),
            SlashCommand::Clear => {
                self.render_token.cancel();
                self.render_token = CancelToken::new();
                self.diagrams.clear();
                self.session.transcript_mut().clear();
                writeln!(out, "Transcript cleared.")
            }
            SlashCommand::Agent(Some(agent)) => {
                self.session.set_agent(agent);
                writeln!(out, "Now talking to {}.", self.session.agent())
            }
            SlashCommand::Agent(None) => {
                writeln!(out, "Current agent: {}", self.session.agent())
            }
            SlashCommand::Open(Some(index)) => match self.session.transcript().get(index) {
                Some(turn) => {
                    open_turn_result(turn, index, &mut PagerViewer::new(out));
                    Ok(())
                }
                None => writeln!(out, "No turn {index}."),
            },
            SlashCommand::Open(None) => writeln!(out, "Usage: /open <turn>"),
            SlashCommand::Quit => {
                self.should_exit = true;
                Ok(())
            }
            SlashCommand::Unknown(command) => {
                writeln!(out, "Unknown command {command}. {HELP_TEXT}")
            }
        }
    }

    async fn submit<W: Write>(&mut self, prompt: &str, out: &mut W) -> io::Result<()> {
        let first_new_turn = self.session.transcript().len();

        let mut host_error = None;
        let mut host = |turn: usize, attachment: &AttachmentUnit| {
            if host_error.is_none() {
                host_error = writeln!(out, "{}", render_attachment_line(turn, attachment)).err();
            }
        };
        let result = self
            .session
            .submit(&self.client, prompt, &mut host, Some(&self.cancellation))
            .await;
        self.cancellation.store(false, Ordering::SeqCst);
        if let Some(error) = host_error {
            return Err(error);
        }

        for (index, turn) in self
            .session
            .transcript()
            .turns()
            .iter()
            .enumerate()
            .skip(first_new_turn)
        {
            if turn.role != Role::User {
                writeln!(out, "{}", render_turn(index, turn))?;
            }
        }

        match result {
            Ok(outcome) => {
                if outcome.cancelled {
                    writeln!(out, "  (response cancelled)")?;
                }
                self.render_diagrams(outcome.turn_index, out)
            }
            Err(ChatError::EmptyPrompt) => Ok(()),
            Err(ChatError::Cancelled) => writeln!(out, "  (response cancelled)"),
            Err(ChatError::Preflight(_)) | Err(ChatError::Transport(_)) => Ok(()),
            Err(error) => writeln!(out, "error: {error}"),
        }
    }

    /// Render every diagram block of a finished turn and print its status.
    pub fn render_diagrams<W: Write>(&mut self, turn_index: usize, out: &mut W) -> io::Result<()> {
        let Some(turn) = self.session.transcript().get(turn_index) else {
            return Ok(());
        };
        if turn.streaming {
            return Ok(());
        }

        for (block_index, source) in diagram_blocks(&turn.content).into_iter().enumerate() {
            let view = self.diagrams.entry((turn_index, block_index)).or_default();
            let update = view.update(&self.pipeline, &source, &self.render_token);
            debug!("diagram {turn_index}.{block_index}: {update:?}");
            if update == ViewUpdate::Discarded {
                continue;
            }

            let svg_path = match (&self.svg_dir, view.artifact()) {
                (Some(dir), Some(artifact)) => {
                    Some(dir.join(format!("{}.svg", artifact.id)).display().to_string())
                }
                _ => None,
            };
            writeln!(out, "{}", render_diagram_status(view, svg_path))?;
        }
        Ok(())
    }
}
