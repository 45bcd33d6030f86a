//! Streaming chat client for a remote AI agent service.
//!
//! The transport lives in [`agent_api`]: endpoint rotation and decoding of
//! the response stream into [`agent_api::StreamRecord`]s. This crate gives
//! those records meaning:
//!
//! - [`classify`] maps each record's free-form JSON to one [`ContentAction`]
//!   through an ordered rule table.
//! - [`transcript`] accumulates actions into the streaming assistant turn and
//!   freezes it when the stream ends.
//! - [`session`] drives one prompt end to end: preflight, request, stream,
//!   classify, accumulate.
//!
//! Diagram blocks found in finished turns are rendered by hosts through
//! [`diagram_engine`]; [`content::diagram_blocks`] extracts them.

pub mod attachment;
pub mod classify;
pub mod content;
pub mod error;
pub mod preflight;
pub mod session;
pub mod transcript;
pub mod viewer;

pub use attachment::{AttachmentUnit, ContentAction};
pub use classify::{classify, classify_data, matching_rule, ClassifyContext, Rule, RULES};
pub use content::{diagram_blocks, is_generated_content, lone_diagram};
pub use error::{ChatError, TranscriptError};
pub use preflight::{AllowAll, Preflight, PreflightRejection, RequireUser};
pub use session::{ChatSession, TurnOutcome, DEFAULT_AGENT};
pub use transcript::{Role, Transcript, Turn, GENERATED_CONTENT_NOTICE, PLACEHOLDER_TEXT};
pub use viewer::{open_turn_result, AttachmentHost, ContentKind, NoAttachmentHost, ResultViewer};
