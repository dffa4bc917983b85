// SPDX-License-Identifier: GPL-3.0-only

//! The live filter instance shared between the capture and UI threads

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use image::RgbaImage;
use uuid::Uuid;

use crate::errors::RenderResult;
use crate::frame::{FrameBuffer, FrameFormat};
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{FilterDescriptor, FilterTarget, FilterType, Ports};
use crate::render::{QueryRequest, QueryResults, Renderer};

/// One live effect unit: a renderer, its lock, and its statistics feed
///
/// The mutex serializes render/query/reset calls on *this* instance only
/// and is held for the full duration of each call; distinct instances
/// render concurrently. Per-call wall-clock timing is accumulated into the
/// parameter store, keyed by the live/still flag.
pub struct FilterInstance {
    descriptor: &'static FilterDescriptor,
    params: Arc<ParameterStore>,
    renderer: Mutex<Box<dyn Renderer>>,
}

impl FilterInstance {
    pub(crate) fn new(
        descriptor: &'static FilterDescriptor,
        params: Arc<ParameterStore>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            descriptor,
            params,
            renderer: Mutex::new(renderer),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Renderer>> {
        self.renderer.lock().expect("renderer lock poisoned")
    }

    pub fn descriptor(&self) -> &'static FilterDescriptor {
        self.descriptor
    }

    pub fn filter_type(&self) -> FilterType {
        self.descriptor.filter_type
    }

    pub fn id(&self) -> Uuid {
        self.descriptor.id
    }

    pub fn title(&self) -> &'static str {
        self.descriptor.title
    }

    pub fn ports(&self) -> Ports {
        self.descriptor.ports
    }

    pub fn targets(&self) -> &'static [FilterTarget] {
        self.descriptor.targets
    }

    pub fn is_slow(&self) -> bool {
        self.lock().is_slow()
    }

    pub fn initialized(&self) -> bool {
        self.lock().initialized()
    }

    pub fn initialized_for_image(&self) -> bool {
        self.lock().initialized_for_image()
    }

    /// Full reset followed by resource pool creation for `format`
    pub fn initialize(&self, format: &FrameFormat, buffer_count_hint: usize) -> RenderResult<()> {
        self.lock().initialize(format, buffer_count_hint)
    }

    /// Prepare the independent still-image/generation path
    pub fn initialize_for_image(&self) -> RenderResult<()> {
        self.lock().initialize_for_image()
    }

    /// Release all graphics objects; idempotent
    pub fn reset(&self, called_by: &str) {
        self.lock().reset(called_by);
    }

    /// Process one live frame, recording timing on success
    pub fn render_frame(&self, frame: &FrameBuffer) -> RenderResult<FrameBuffer> {
        let mut renderer = self.lock();
        let start = Instant::now();
        let result = renderer.render_frame(frame);
        if result.is_ok() {
            self.params
                .update_render_accumulator(start.elapsed(), &self.descriptor.id, false);
        }
        result
    }

    /// Synchronous still-image render, recording timing on success
    pub fn render_image(&self, image: &image::DynamicImage) -> RenderResult<image::DynamicImage> {
        let mut renderer = self.lock();
        let start = Instant::now();
        let result = renderer.render_image(image);
        if result.is_ok() {
            self.params
                .update_render_accumulator(start.elapsed(), &self.descriptor.id, true);
        }
        result
    }

    /// Still render over a raw RGBA buffer, recording timing on success
    pub fn render_rgba(&self, image: &RgbaImage) -> RenderResult<RgbaImage> {
        let mut renderer = self.lock();
        let start = Instant::now();
        let result = renderer.render_rgba(image);
        if result.is_ok() {
            self.params
                .update_render_accumulator(start.elapsed(), &self.descriptor.id, true);
        }
        result
    }

    /// Procedural generation; `None` for filters with an input port
    pub fn generate(&self) -> Option<RgbaImage> {
        let mut renderer = self.lock();
        let start = Instant::now();
        let result = renderer.generate();
        if result.is_some() {
            self.params
                .update_render_accumulator(start.elapsed(), &self.descriptor.id, true);
        }
        result
    }

    /// Measurement query; `None` for filters with an output port
    pub fn query(&self, frame: &FrameBuffer, request: &QueryRequest) -> Option<QueryResults> {
        let mut renderer = self.lock();
        let start = Instant::now();
        let result = renderer.query(frame, request);
        if result.is_some() {
            self.params
                .update_render_accumulator(start.elapsed(), &self.descriptor.id, false);
        }
        result
    }

    pub fn supported_fields(&self) -> Vec<InputField> {
        self.lock().supported_fields()
    }

    pub fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        self.lock().default_field_value(field)
    }

    /// Provenance keywords for the export/metadata subsystem
    pub fn export_keywords(&self) -> Vec<String> {
        vec![
            self.descriptor.title.to_string(),
            format!("{:?}", self.descriptor.kernel),
            format!("{:?}", self.descriptor.group),
        ]
    }

    /// Current parameter values as key/value pairs for embedding into
    /// saved images
    pub fn export_fields(&self) -> Vec<(String, String)> {
        let renderer = self.lock();
        let mut rows = Vec::new();
        for field in renderer.supported_fields() {
            let Some((ty, default)) = renderer.default_field_value(field) else {
                continue;
            };
            let value = self
                .params
                .stored_value(&self.descriptor.id, field, ty)
                .unwrap_or(default);
            rows.push((field.key(), value.encode()));
        }
        rows
    }

    /// Full provenance record as JSON, the shape the export/metadata
    /// subsystem embeds into saved images
    pub fn export_provenance_json(&self) -> String {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .export_fields()
            .into_iter()
            .map(|(name, value)| (name, serde_json::Value::String(value)))
            .collect();
        serde_json::json!({
            "filter": self.descriptor.title,
            "id": self.descriptor.id.to_string(),
            "keywords": self.export_keywords(),
            "fields": fields,
        })
        .to_string()
    }
}

impl std::fmt::Debug for FilterInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterInstance")
            .field("filter", &self.descriptor.filter_type)
            .field("id", &self.descriptor.id)
            .finish()
    }
}
