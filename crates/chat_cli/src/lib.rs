//! Terminal host for the agent chat client.
//!
//! Reads prompts and slash commands from stdin, streams replies through
//! [`agent_chat::ChatSession`], and renders diagram blocks with the `mmdc`
//! command-line renderer. Ctrl-C cancels a reply that is still streaming;
//! at the prompt it exits, as do `/quit` and end of input.
//!
//! ## Configuration
//!
//! - `AGENT_CHAT_CONFIG_PATH`: optional JSON config file, see [`config`].
//! - `AGENT_CHAT_ENDPOINTS`: comma-separated endpoint list, overrides the file.
//! - `AGENT_CHAT_AGENT` / `AGENT_CHAT_USER`: persona and signed-in user.
//! - `AGENT_CHAT_LOG_LEVEL`: `trace` through `off`, default `warn`. Logs go to
//!   stderr.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;
pub mod mermaid_cli;
pub mod render;
