use std::time::Duration;

use thiserror::Error;

/// Substrings the render engine embeds in markup it produced for a source it
/// could not parse.
pub const ERROR_MARKERS: &[&str] = &["Syntax error in text", "Parse error on line", "error-icon"];

/// Failure raised by the render engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("render engine is unavailable: {0}")]
    Unavailable(String),

    #[error("render engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render engine timed out after {0:?}")]
    Timeout(Duration),

    #[error("render engine rejected the source: {0}")]
    Rejected(String),
}

/// Render primitive consumed by [`crate::DiagramPipeline`].
///
/// The engine registers output by `id`; callers must never reuse an id.
pub trait DiagramRenderer {
    /// One-time style configuration, called before the first render.
    fn configure(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Render `source` to vector markup.
    fn render(&self, id: &str, source: &str) -> Result<String, EngineError>;
}

impl<R: DiagramRenderer + ?Sized> DiagramRenderer for Box<R> {
    fn configure(&self) -> Result<(), EngineError> {
        (**self).configure()
    }

    fn render(&self, id: &str, source: &str) -> Result<String, EngineError> {
        (**self).render(id, source)
    }
}

pub fn contains_error_marker(markup: &str) -> bool {
    ERROR_MARKERS.iter().any(|marker| markup.contains(marker))
}
