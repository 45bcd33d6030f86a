//! Ordered conversation turns and the streaming turn they grow into.

use log::debug;

use crate::attachment::{AttachmentUnit, ContentAction};
use crate::content::is_generated_content;
use crate::error::TranscriptError;
use crate::viewer::AttachmentHost;

/// Shown for a streaming turn that has no content yet. Never stored.
pub const PLACEHOLDER_TEXT: &str = "Thinking…";

/// Openers of block renderings that must start on a fresh line to parse as
/// blocks: fences, images and checklists.
const BLOCK_OPENERS: &[&str] = &["```", "~~~", "![", "- ["];

/// Appended once to a finished turn that produced images or code blocks.
pub const GENERATED_CONTENT_NOTICE: &str =
    "\n\n_Generated content from this reply is kept for this session. Use `/open <turn>` to view it in full._";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub attachment: Option<AttachmentUnit>,
    pub streaming: bool,
}

impl Turn {
    fn finished(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachment: None,
            streaming: false,
        }
    }

    /// Text to display: the placeholder while a streaming turn is empty.
    pub fn display_content(&self) -> &str {
        if self.streaming && self.content.is_empty() {
            PLACEHOLDER_TEXT
        } else {
            &self.content
        }
    }
}

/// Append-only list of turns with at most one streaming assistant turn.
///
/// Only the active turn is ever mutated; once [`Transcript::finish_stream`]
/// freezes it, it stays as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
    active: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Index of the streaming turn, if any.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> usize {
        self.push(Turn::finished(Role::User, content))
    }

    pub fn push_system(&mut self, content: impl Into<String>) -> usize {
        self.push(Turn::finished(Role::System, content))
    }

    /// Non-streaming assistant turn, e.g. the opening greeting.
    pub fn push_greeting(&mut self, content: impl Into<String>) -> usize {
        self.push(Turn::finished(Role::Assistant, content))
    }

    /// Open an empty streaming assistant turn and return its index.
    pub fn begin_stream(&mut self) -> Result<usize, TranscriptError> {
        if let Some(index) = self.active {
            return Err(TranscriptError::StreamAlreadyActive { index });
        }
        let index = self.push(Turn {
            role: Role::Assistant,
            content: String::new(),
            attachment: None,
            streaming: true,
        });
        self.active = Some(index);
        Ok(index)
    }

    /// Apply one action to the streaming turn.
    ///
    /// Returns `false` without touching anything when no turn is streaming.
    pub fn apply(&mut self, action: ContentAction) -> bool {
        let Some(turn) = self.active.and_then(|index| self.turns.get_mut(index)) else {
            debug!("dropping content action: no streaming turn");
            return false;
        };

        match action {
            ContentAction::AppendText(text) => {
                separate_block(&mut turn.content, &text);
                turn.content.push_str(&text);
            }
            ContentAction::SetAttachment(attachment) => turn.attachment = Some(attachment),
            ContentAction::Ignore => {}
        }
        true
    }

    /// Freeze the streaming turn and return its index.
    pub fn finish_stream(&mut self) -> Option<usize> {
        let index = self.active.take()?;
        let turn = self.turns.get_mut(index)?;
        turn.streaming = false;
        if is_generated_content(&turn.content) {
            turn.content.push_str(GENERATED_CONTENT_NOTICE);
        }
        Some(index)
    }

    /// Remove every turn, including one still streaming.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.active = None;
    }

    /// Hand the attachment of turn `index` to `host`. Returns whether the
    /// turn had one.
    pub fn request_attachment_render(&self, index: usize, host: &mut dyn AttachmentHost) -> bool {
        match self.turns.get(index).and_then(|turn| turn.attachment.as_ref()) {
            Some(attachment) => {
                host.render_attachment(index, attachment);
                true
            }
            None => false,
        }
    }

    fn push(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }
}

// A block appended to a line that is still open would parse as inline text.
fn separate_block(content: &mut String, next: &str) {
    if content.is_empty()
        || content.ends_with("\n\n")
        || !BLOCK_OPENERS.iter().any(|opener| next.starts_with(opener))
    {
        return;
    }
    content.push_str(if content.ends_with('\n') { "\n" } else { "\n\n" });
}
