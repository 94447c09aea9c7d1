use thiserror::Error;
use vlist::{ConfigError, MeasureError};

/// Errors surfaced by [`crate::Engine`].
///
/// `E` is the renderer's error type. Renderer failures are never swallowed: they reach the
/// caller of the operation that triggered the recomputation.
#[derive(Debug, Error)]
pub enum EngineError<E> {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error("failed to render item {index}")]
    Render {
        index: usize,
        #[source]
        source: E,
    },
}
