/// Core error types for slidefx.

/// A specialized Result type for slidefx operations.
pub type SlideResult<T> = Result<T, SlideError>;

/// Top-level error type encompassing every slider subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SlideError {
    /// Invalid container, no slides, or out-of-range options. Fatal at construction.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("slide {index} has no eligible image")]
    MissingImage { index: usize },

    /// Rendering capability absent or incomplete.
    #[error("GPU unavailable: {0}")]
    GpuUnavailable(String),

    /// An image could not be decoded into a texture.
    #[error("resource load error: {0}")]
    ResourceLoad(String),

    #[error("layout error: {0}")]
    Layout(String),

    /// Failure while a session is drawing frames.
    #[error("render error: {0}")]
    Render(String),

    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SlideError {
    /// Create a resource-load error naming the image that failed.
    pub fn resource_load(source: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        SlideError::ResourceLoad(format!("{source}: {reason}"))
    }

    /// True when the error means the GPU path cannot work at all on this host,
    /// as opposed to a failure specific to one session.
    pub fn is_gpu_unavailable(&self) -> bool {
        matches!(self, SlideError::GpuUnavailable(_))
    }
}
