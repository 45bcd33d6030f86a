use crate::cancel::CancelToken;
use crate::pipeline::{DiagramArtifact, DiagramPipeline, RenderError, RenderOutcome};
use crate::render::DiagramRenderer;

/// What [`DiagramView::update`] or [`DiagramView::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Source unchanged since the last write; nothing rendered.
    Unchanged,
    Rendered,
    Failed,
    /// The view went away while rendering; nothing written.
    Discarded,
}

/// Display state for one visible diagram block.
///
/// Re-renders whenever the visible source changes. Results are written only
/// while the caller's token is live; a successful render clears the previous
/// error and a failed one clears the previous artifact.
#[derive(Debug, Default)]
pub struct DiagramView {
    source: Option<String>,
    artifact: Option<DiagramArtifact>,
    error: Option<RenderError>,
}

impl DiagramView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn artifact(&self) -> Option<&DiagramArtifact> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&RenderError> {
        self.error.as_ref()
    }

    pub fn is_current(&self, source: &str) -> bool {
        self.source.as_deref() == Some(source)
    }

    /// Render `source` if it differs from what is displayed and write the
    /// result.
    pub fn update<R: DiagramRenderer>(
        &mut self,
        pipeline: &DiagramPipeline<R>,
        source: &str,
        token: &CancelToken,
    ) -> ViewUpdate {
        if self.is_current(source) {
            return ViewUpdate::Unchanged;
        }
        let outcome = pipeline.render(source, token);
        self.apply(source, outcome, token)
    }

    /// Write a render outcome produced elsewhere, unless `token` was cancelled
    /// in the meantime.
    pub fn apply(&mut self, source: &str, outcome: RenderOutcome, token: &CancelToken) -> ViewUpdate {
        if token.is_cancelled() {
            return ViewUpdate::Discarded;
        }

        match outcome {
            RenderOutcome::Rendered(artifact) => {
                self.source = Some(source.to_string());
                self.artifact = Some(artifact);
                self.error = None;
                ViewUpdate::Rendered
            }
            RenderOutcome::Failed(error) => {
                self.source = Some(source.to_string());
                self.artifact = None;
                self.error = Some(error);
                ViewUpdate::Failed
            }
            RenderOutcome::Cancelled => ViewUpdate::Discarded,
        }
    }
}
