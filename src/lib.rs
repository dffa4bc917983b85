// SPDX-License-Identifier: GPL-3.0-only

//! Prism - a filter rendering engine for live camera frames, video, and
//! still images
//!
//! The engine applies visual effects through one uniform contract across
//! three consumption modes: continuous live pixel-buffer streaming,
//! synchronous still-image rendering, and on-demand procedural generation.
//! Three backend technologies sit behind that contract: declarative
//! image-operator graphs, custom compute kernels (WGSL via wgpu, with CPU
//! reference fallbacks), and fixed specialized operators.
//!
//! # Architecture
//!
//! - [`engine`]: the explicit context object tying everything together
//! - [`render`]: the per-filter render contract and live instances
//! - [`registry`]: filter identity, capability, and rating metadata
//! - [`params`]: typed settings storage and render statistics
//! - [`backends`]: the three processing technologies
//! - [`filters`]: the concrete filter set
//! - [`pool`] / [`gpu`]: resource pools and GPU plumbing
//!
//! # Example
//!
//! ```
//! use prism::{Engine, FilterType, FrameBuffer, FrameFormat, PixelEncoding};
//!
//! let engine = Engine::with_memory_settings();
//! let filter = engine.create_filter(FilterType::Grayscale).unwrap();
//!
//! let format = FrameFormat::new(64, 64, PixelEncoding::Rgba8);
//! filter.initialize(&format, prism::constants::DEFAULT_BUFFER_COUNT_HINT).unwrap();
//!
//! let frame = FrameBuffer::from_rgba(64, 64, vec![128; 64 * 64 * 4]).unwrap();
//! let output = filter.render_frame(&frame).unwrap();
//! assert_eq!(output.width(), 64);
//! ```

pub mod backends;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod filters;
pub mod frame;
pub mod gpu;
pub mod params;
pub mod pool;
pub mod registry;
pub mod render;
pub mod shaders;

// Re-export commonly used types
pub use engine::Engine;
pub use errors::{RenderError, RenderResult};
pub use frame::{ColorPrimaries, FrameBuffer, FrameFormat, PixelEncoding};
pub use params::{InputField, InputType, MemoryStore, ParamValue, ParameterStore, SettingsStore};
pub use pool::ResourcePool;
pub use registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterRegistry, FilterTarget, FilterType, Ports,
    Rating,
};
pub use render::{FilterInstance, QueryRequest, QueryResults, QueryValue, RenderPath, Renderer};
