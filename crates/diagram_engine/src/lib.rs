//! Sanitizing renderer for Mermaid-style diagram sources.
//!
//! Upstream agents routinely emit diagram text that the render engine rejects:
//! unquoted labels containing spaces or punctuation, stray double quotes,
//! brackets inside edge labels. [`DiagramPipeline`] runs a normalize pass,
//! renders, and on failure retries once with a more aggressive relaxation.
//! Every failure ends in a [`RenderError`] carrying a fixed user-facing
//! message; nothing escapes the pipeline.
//!
//! The render engine itself is a collaborator behind [`DiagramRenderer`].

pub mod cancel;
pub mod fence;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod view;

pub use cancel::CancelToken;
pub use fence::{fence_block, strip_code_fence, DIAGRAM_FENCE_TAG};
pub use normalize::{normalize, relax_for_retry};
pub use pipeline::{
    next_render_id, DiagramArtifact, DiagramPipeline, RenderError, RenderOutcome,
    RENDER_ERROR_MESSAGE,
};
pub use render::{contains_error_marker, DiagramRenderer, EngineError, ERROR_MARKERS};
pub use view::{DiagramView, ViewUpdate};
