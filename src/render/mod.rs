// SPDX-License-Identifier: GPL-3.0-only

//! The per-filter rendering contract
//!
//! Every filter implements [`Renderer`]: one canonical render over the
//! normalized RGBA surface, wrapped by thin adapters for the three consumer
//! representations (live pixel buffers, `DynamicImage` stills, raw RGBA
//! images). Lifecycle is Uninitialized -> Initialized (via `initialize` /
//! `initialize_for_image`) -> Uninitialized (via `reset`). Calling a render
//! entry point before initializing the matching path is a programmer error
//! and panics; a missing resource pool mid-stream is the designed hot-swap
//! degrade and surfaces as [`RenderError::TransientResource`].

mod instance;

pub use instance::FilterInstance;

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{RenderError, RenderResult};
use crate::frame::{FrameBuffer, FrameFormat};
use crate::params::{InputField, InputType, ParamValue};
use crate::pool::ResourcePool;
use crate::registry::{FilterDescriptor, FilterTarget, FilterType, Ports};

/// Which consumption path a canonical render is serving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// Continuous pixel-buffer streaming from the capture callback
    Live,
    /// Synchronous still rendering or procedural generation
    Still,
}

/// A value in a measurement query's request or result map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    Color([f32; 4]),
    ColorList(Vec<[f32; 4]>),
    CountList(Vec<u64>),
}

/// Keyed parameters for a measurement query
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    entries: HashMap<String, QueryValue>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: QueryValue) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }

    pub fn int(&self, key: &str, default: i64) -> i64 {
        match self.entries.get(key) {
            Some(QueryValue::Int(v)) => *v,
            Some(QueryValue::Double(v)) => *v as i64,
            _ => default,
        }
    }

    pub fn bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(QueryValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn double(&self, key: &str, default: f64) -> f64 {
        match self.entries.get(key) {
            Some(QueryValue::Double(v)) => *v,
            Some(QueryValue::Int(v)) => *v as f64,
            _ => default,
        }
    }
}

/// Derived numeric results from a measurement filter
pub type QueryResults = HashMap<String, QueryValue>;

/// Per-instance state shared by every filter implementation
///
/// Owns the live resource pool and the two path-readiness flags. The live
/// and image paths never share pool state.
#[derive(Default)]
pub struct RenderResources {
    pub pool: Option<Arc<ResourcePool>>,
    pub input_format: Option<FrameFormat>,
    pub output_format: Option<FrameFormat>,
    pub initialized: bool,
    pub image_ready: bool,
}

impl RenderResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and return to the uninitialized state
    pub fn clear(&mut self) {
        self.pool = None;
        self.input_format = None;
        self.output_format = None;
        self.initialized = false;
        self.image_ready = false;
    }

    /// Fetch the pool for a live render
    ///
    /// A missing pool here is the hot-swap race: the frame arrived after
    /// this filter was reset but before the pipeline caught up. The frame
    /// pipeline holds its previous output and retries next frame.
    pub fn live_pool(&self) -> RenderResult<Arc<ResourcePool>> {
        match &self.pool {
            Some(pool) => Ok(Arc::clone(pool)),
            None => {
                debug!("Resource pool absent mid-stream; dropping frame");
                Err(RenderError::TransientResource)
            }
        }
    }

    /// Take an output surface, from the pool when the size matches
    pub fn acquire_output(&self, len: usize) -> Vec<u8> {
        match &self.pool {
            Some(pool) if pool.surface_len() == len => pool.acquire(),
            _ => vec![0u8; len],
        }
    }
}

/// The stateful effect unit contract
///
/// Implementations provide `render_canonical` plus capability metadata; the
/// adapters, lifecycle, and degrade paths are provided. All methods are
/// called with the owning instance's lock already held.
pub trait Renderer: Send {
    fn descriptor(&self) -> &'static FilterDescriptor;

    fn resources(&self) -> &RenderResources;

    fn resources_mut(&mut self) -> &mut RenderResources;

    /// The one canonical render: normalized RGBA in, RGBA out
    ///
    /// `src` is guaranteed canonical RGBA. Generators ignore the source
    /// pixels and use only its dimensions; measurement filters pass the
    /// source through.
    fn render_canonical(&mut self, src: &FrameBuffer, path: RenderPath) -> RenderResult<FrameBuffer>;

    /// Settable parameter fields, for the settings UI
    fn supported_fields(&self) -> Vec<InputField> {
        Vec::new()
    }

    /// Declared type and default value for one field
    fn default_field_value(&self, _field: InputField) -> Option<(InputType, ParamValue)> {
        None
    }

    /// Hook for dropping backend state beyond the shared resources
    fn teardown(&mut self) {}

    /// High-latency hint so the frame pipeline can throttle
    fn is_slow(&self) -> bool {
        false
    }

    fn filter_type(&self) -> FilterType {
        self.descriptor().filter_type
    }

    fn ports(&self) -> Ports {
        self.descriptor().ports
    }

    fn targets(&self) -> &'static [FilterTarget] {
        self.descriptor().targets
    }

    fn initialized(&self) -> bool {
        self.resources().initialized
    }

    fn initialized_for_image(&self) -> bool {
        self.resources().image_ready
    }

    /// Idempotent full reset followed by pool (re)creation from `format`
    ///
    /// On allocation failure the instance stays uninitialized.
    fn initialize(&mut self, format: &FrameFormat, buffer_count_hint: usize) -> RenderResult<()> {
        self.reset("initialize");
        let pool = ResourcePool::new(format.clone(), buffer_count_hint)?;
        let output_format = format.as_rgba();
        let resources = self.resources_mut();
        resources.pool = Some(Arc::new(pool));
        resources.input_format = Some(format.clone());
        resources.output_format = Some(output_format);
        resources.initialized = true;
        Ok(())
    }

    /// Independent initialization for the still-image/generation flow
    ///
    /// Shares no pool state with the live path; compute filters bind their
    /// own per-path texture cache on first use.
    fn initialize_for_image(&mut self) -> RenderResult<()> {
        self.resources_mut().image_ready = true;
        Ok(())
    }

    /// Release all backend objects and return to the uninitialized state
    ///
    /// Safe to call repeatedly.
    fn reset(&mut self, called_by: &str) {
        debug!(
            filter = self.descriptor().title,
            called_by, "Resetting filter instance"
        );
        self.teardown();
        self.resources_mut().clear();
    }

    /// Process one live frame
    ///
    /// # Panics
    ///
    /// Panics if called before `initialize` (programmer error).
    fn render_frame(&mut self, frame: &FrameBuffer) -> RenderResult<FrameBuffer> {
        assert!(
            self.initialized(),
            "{} render_frame called before initialize",
            self.descriptor().title
        );
        let pool = self.resources().live_pool()?;
        if frame.width() != pool.format().width || frame.height() != pool.format().height {
            return Err(RenderError::Conversion(format!(
                "frame {} does not match pool format {}",
                frame.format(),
                pool.format()
            )));
        }
        let src = frame.normalize_to_rgba().map_err(|e| {
            warn!(filter = self.descriptor().title, error = %e, "Input normalization failed");
            e
        })?;
        self.render_canonical(&src, RenderPath::Live)
    }

    /// Synchronous still-image render
    ///
    /// # Panics
    ///
    /// Panics if called before `initialize_for_image`.
    fn render_image(&mut self, image: &image::DynamicImage) -> RenderResult<image::DynamicImage> {
        assert!(
            self.initialized_for_image(),
            "{} render_image called before initialize_for_image",
            self.descriptor().title
        );
        let src = FrameBuffer::from_image(&image.to_rgba8());
        let out = self.render_canonical(&src, RenderPath::Still)?;
        Ok(image::DynamicImage::ImageRgba8(out.to_image()?))
    }

    /// Still-image render over a raw RGBA buffer
    ///
    /// # Panics
    ///
    /// Panics if called before `initialize_for_image`.
    fn render_rgba(&mut self, image: &RgbaImage) -> RenderResult<RgbaImage> {
        assert!(
            self.initialized_for_image(),
            "{} render_rgba called before initialize_for_image",
            self.descriptor().title
        );
        let src = FrameBuffer::from_image(image);
        let out = self.render_canonical(&src, RenderPath::Still)?;
        out.to_image()
    }

    /// Procedural generation; `Some` only for output-only generators
    fn generate(&mut self) -> Option<RgbaImage> {
        None
    }

    /// Derived-measurement query; `Some` only for input-only filters
    fn query(&mut self, _frame: &FrameBuffer, _request: &QueryRequest) -> Option<QueryResults> {
        None
    }
}

/// Generates the descriptor/resources accessors every filter repeats.
macro_rules! renderer_boilerplate {
    ($descriptor:expr) => {
        fn descriptor(&self) -> &'static crate::registry::FilterDescriptor {
            &$descriptor
        }

        fn resources(&self) -> &crate::render::RenderResources {
            &self.resources
        }

        fn resources_mut(&mut self) -> &mut crate::render::RenderResources {
            &mut self.resources
        }
    };
}

pub(crate) use renderer_boilerplate;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelEncoding;

    #[test]
    fn test_live_pool_absent_is_transient() {
        let resources = RenderResources::new();
        assert_eq!(
            resources.live_pool().err(),
            Some(RenderError::TransientResource)
        );
    }

    #[test]
    fn test_acquire_output_prefers_pool() {
        let mut resources = RenderResources::new();
        let format = FrameFormat::new(2, 2, PixelEncoding::Rgba8);
        let pool = Arc::new(ResourcePool::new(format, 1).unwrap());
        resources.pool = Some(Arc::clone(&pool));

        let buf = resources.acquire_output(16);
        assert_eq!(buf.len(), 16);
        assert_eq!(pool.idle_surfaces(), 0);

        // size mismatch bypasses the pool
        let other = resources.acquire_output(64);
        assert_eq!(other.len(), 64);
    }

    #[test]
    fn test_query_request_typed_accessors() {
        let request = QueryRequest::new()
            .with("Width", QueryValue::Int(32))
            .with("CalculateMean", QueryValue::Bool(true));
        assert_eq!(request.int("Width", 8), 32);
        assert!(request.bool("CalculateMean", false));
        assert_eq!(request.int("Height", 8), 8);
    }
}
