//! Collaborator seams for hosts that display transcript content.

use crate::attachment::AttachmentUnit;
use crate::content::lone_diagram;
use crate::transcript::{Turn, GENERATED_CONTENT_NOTICE};

/// Kind tag handed to a [`ResultViewer`] alongside the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Markdown,
    Document,
    Presentation,
    Email,
    Diagram,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Document => "document",
            Self::Presentation => "presentation",
            Self::Email => "email",
            Self::Diagram => "diagram",
        }
    }
}

/// Opens a full-screen view of one result.
pub trait ResultViewer {
    fn open_full_result(&mut self, content: &str, kind: ContentKind, title: &str);
}

/// Renders the attachment of one turn.
///
/// Invoked whenever a turn's attachment slot is written during streaming, and
/// on explicit request afterwards.
pub trait AttachmentHost {
    fn render_attachment(&mut self, turn_index: usize, attachment: &AttachmentUnit);
}

impl<F> AttachmentHost for F
where
    F: FnMut(usize, &AttachmentUnit),
{
    fn render_attachment(&mut self, turn_index: usize, attachment: &AttachmentUnit) {
        self(turn_index, attachment)
    }
}

/// Host that ignores attachment renders.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAttachmentHost;

impl AttachmentHost for NoAttachmentHost {
    fn render_attachment(&mut self, _turn_index: usize, _attachment: &AttachmentUnit) {}
}

/// Open the most specific full result a turn carries.
///
/// The attachment wins over the text. Text consisting of a single diagram
/// block opens as [`ContentKind::Diagram`].
pub fn open_turn_result(turn: &Turn, turn_index: usize, viewer: &mut dyn ResultViewer) {
    if let Some(attachment) = &turn.attachment {
        viewer.open_full_result(&attachment.full_content(), attachment.kind(), attachment.title());
        return;
    }

    let title = format!("Turn {turn_index}");
    let body = turn
        .content
        .strip_suffix(GENERATED_CONTENT_NOTICE)
        .unwrap_or(&turn.content);
    if let Some(diagram) = lone_diagram(body) {
        viewer.open_full_result(&diagram, ContentKind::Diagram, &title);
        return;
    }
    viewer.open_full_result(&turn.content, ContentKind::Markdown, &title);
}
