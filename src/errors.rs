// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the filter rendering engine

use std::fmt;

/// Result type alias for render-path operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by filter construction, initialization, and rendering
///
/// Render-before-initialize is deliberately *not* represented here: calling a
/// render entry point on an uninitialized filter is a programmer error and
/// panics instead of returning an error the frame pipeline would have to
/// invent a policy for.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A required backend object (GPU device, compiled pipeline, named
    /// kernel) was unavailable at construction. The filter cannot be used
    /// this session.
    Configuration(String),
    /// Resource pool creation failed; the owning filter stays uninitialized.
    Allocation(String),
    /// The resource pool or texture cache was momentarily absent, typically
    /// because a filter hot-swap or format change raced the frame stream.
    /// The frame pipeline holds the previous output and retries next frame.
    TransientResource,
    /// The input surface arrived in an encoding the filter could not
    /// normalize to its canonical format.
    Conversion(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            RenderError::Allocation(msg) => write!(f, "Allocation failure: {}", msg),
            RenderError::TransientResource => write!(f, "Resource pool not available"),
            RenderError::Conversion(msg) => write!(f, "Conversion failure: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}

impl RenderError {
    /// True for the designed degrade path that the frame pipeline absorbs
    /// by reusing its previous output.
    pub fn is_transient(&self) -> bool {
        matches!(self, RenderError::TransientResource)
    }
}
