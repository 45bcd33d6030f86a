use log::{debug, warn};
use once_cell::sync::OnceCell;
use thiserror::Error;
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::normalize::{normalize, relax_for_retry};
use crate::render::{contains_error_marker, DiagramRenderer};

/// Message shown in place of a diagram that could not be rendered.
pub const RENDER_ERROR_MESSAGE: &str =
    "This diagram could not be rendered because its source contains syntax errors. Check the raw diagram source below.";

/// A successfully rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramArtifact {
    /// Identifier the engine rendered under.
    pub id: String,
    pub raw: String,
    pub normalized: String,
    /// Source of the attempt that succeeded.
    pub rendered_source: String,
    pub markup: String,
    /// 1 for the first attempt, 2 after the relaxed retry.
    pub attempts: u8,
}

/// Both attempts failed.
///
/// Displays as [`RENDER_ERROR_MESSAGE`]; attempt details are kept for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", RENDER_ERROR_MESSAGE)]
pub struct RenderError {
    pub raw_source: String,
    pub failures: Vec<String>,
}

impl RenderError {
    pub fn user_message(&self) -> &'static str {
        RENDER_ERROR_MESSAGE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(DiagramArtifact),
    Failed(RenderError),
    /// The token was cancelled; the result must not be written anywhere.
    Cancelled,
}

/// Normalize → render → retry state machine over a [`DiagramRenderer`].
#[derive(Debug)]
pub struct DiagramPipeline<R> {
    renderer: R,
    configured: OnceCell<Result<(), String>>,
}

/// Fresh process-unique render identifier.
pub fn next_render_id() -> String {
    format!("diagram-{}", Uuid::new_v4().simple())
}

impl<R: DiagramRenderer> DiagramPipeline<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            configured: OnceCell::new(),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn render(&self, raw: &str, token: &CancelToken) -> RenderOutcome {
        if token.is_cancelled() {
            return RenderOutcome::Cancelled;
        }

        if let Err(error) = self.ensure_configured() {
            return RenderOutcome::Failed(RenderError {
                raw_source: raw.to_string(),
                failures: vec![error],
            });
        }

        let normalized = normalize(raw);
        let mut failures = Vec::with_capacity(2);

        let candidates = [normalized.clone(), relax_for_retry(&normalized)];
        for (attempt, source) in (1u8..).zip(candidates) {
            let result = self.attempt(&source);
            if token.is_cancelled() {
                debug!("discarding diagram render: view is no longer active");
                return RenderOutcome::Cancelled;
            }

            match result {
                Ok((id, markup)) => {
                    return RenderOutcome::Rendered(DiagramArtifact {
                        id,
                        raw: raw.to_string(),
                        normalized,
                        rendered_source: source,
                        markup,
                        attempts: attempt,
                    });
                }
                Err(reason) => {
                    debug!("diagram render attempt {attempt} failed: {reason}");
                    failures.push(reason);
                }
            }
        }

        warn!("diagram could not be rendered after {} attempts", failures.len());
        RenderOutcome::Failed(RenderError {
            raw_source: raw.to_string(),
            failures,
        })
    }

    fn ensure_configured(&self) -> Result<(), String> {
        self.configured
            .get_or_init(|| {
                self.renderer
                    .configure()
                    .map_err(|error| format!("renderer configuration failed: {error}"))
            })
            .clone()
    }

    fn attempt(&self, source: &str) -> Result<(String, String), String> {
        let id = next_render_id();
        match self.renderer.render(&id, source) {
            Ok(markup) if contains_error_marker(&markup) => {
                Err(format!("{id}: engine returned error markup"))
            }
            Ok(markup) => Ok((id, markup)),
            Err(error) => Err(format!("{id}: {error}")),
        }
    }
}
