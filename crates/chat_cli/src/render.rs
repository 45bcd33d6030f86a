//! Plain-text rendering of transcript turns for the terminal.

use std::io::Write;

use agent_chat::{AttachmentUnit, ContentKind, ResultViewer, Role, Turn};
use diagram_engine::{fence_block, DiagramView, DIAGRAM_FENCE_TAG};

const RULE_WIDTH: usize = 60;

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "agent",
        Role::System => "system",
    }
}

/// `[index] label: content`, followed by the attachment summary if any.
pub fn render_turn(index: usize, turn: &Turn) -> String {
    let mut out = format!(
        "[{index}] {}: {}",
        role_label(turn.role),
        turn.display_content().trim_end()
    );
    if let Some(attachment) = &turn.attachment {
        out.push('\n');
        out.push_str(&render_attachment_line(index, attachment));
    }
    out
}

pub fn render_attachment_line(index: usize, attachment: &AttachmentUnit) -> String {
    format!(
        "  [attachment] {} (open with /open {index})",
        attachment.summary()
    )
}

/// Status line for a diagram block after its view was updated.
pub fn render_diagram_status(view: &DiagramView, svg_path: Option<String>) -> String {
    if let Some(artifact) = view.artifact() {
        let location = svg_path.unwrap_or_else(|| artifact.id.clone());
        let retried = if artifact.attempts > 1 {
            " after relaxing labels"
        } else {
            ""
        };
        return format!("  [diagram] rendered{retried}: {location}");
    }
    if let Some(error) = view.error() {
        return format!(
            "  [diagram] {}\n{}",
            error.user_message(),
            fence_block(DIAGRAM_FENCE_TAG, &error.raw_source)
        );
    }
    "  [diagram] pending".to_string()
}

/// Full-result viewer that prints a framed page to a writer.
pub struct PagerViewer<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> PagerViewer<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self { out }
    }
}

impl<W: Write> ResultViewer for PagerViewer<'_, W> {
    fn open_full_result(&mut self, content: &str, kind: ContentKind, title: &str) {
        let header = format!("── {title} ({}) ", kind.label());
        let padding = RULE_WIDTH.saturating_sub(header.chars().count());
        let _ = writeln!(self.out, "{header}{}", "─".repeat(padding));
        let _ = writeln!(self.out, "{}", content.trim_end());
        let _ = writeln!(self.out, "{}", "─".repeat(RULE_WIDTH));
    }
}
