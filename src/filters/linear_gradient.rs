// SPDX-License-Identifier: GPL-3.0-only

//! Smooth linear gradient generator (declarative graph)

use std::sync::Arc;

use tracing::warn;

use crate::backends::graph::{GraphBackend, ImageOp};
use crate::constants::{DEFAULT_GENERATOR_HEIGHT, DEFAULT_GENERATOR_WIDTH};
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::LinearGradient,
    id: uuid::uuid!("a4d8f136-7b02-4c59-9e64-f8231b07d5ac"),
    title: "Smooth Linear Gradient",
    settings_panel: "linear_gradient_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::OUTPUT_ONLY,
    targets: ALL_TARGETS,
    group: FilterGroup::Generators,
};

pub struct LinearGradient {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl LinearGradient {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    fn build_ops(&self) -> Vec<ImageOp> {
        let id = &DESCRIPTOR.id;
        let angle = self.params.get_double(id, InputField::Angle, 0.0);
        let color0 = self
            .params
            .get_color(id, InputField::Color0, [0.0, 0.0, 0.0, 1.0]);
        let color1 = self
            .params
            .get_color(id, InputField::Color1, [1.0, 1.0, 1.0, 1.0]);

        // Rotate the gradient axis about the canvas center
        let (sin, cos) = (angle as f32).sin_cos();
        let start = (0.5 - 0.5 * cos, 0.5 - 0.5 * sin);
        let end = (0.5 + 0.5 * cos, 0.5 + 0.5 * sin);
        vec![ImageOp::LinearGradient {
            start,
            end,
            color0,
            color1,
        }]
    }
}

impl Renderer for LinearGradient {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops();
        self.backend.run(&ops, src, &self.resources)
    }

    fn generate(&mut self) -> Option<image::RgbaImage> {
        let (width, height) = match &self.resources.output_format {
            Some(format) => (format.width, format.height),
            None => (DEFAULT_GENERATOR_WIDTH, DEFAULT_GENERATOR_HEIGHT),
        };
        let blank =
            FrameBuffer::from_rgba(width, height, vec![0u8; (width * height * 4) as usize])
                .ok()?;
        match self.render_canonical(&blank, RenderPath::Still) {
            Ok(out) => out.to_image().ok(),
            Err(e) => {
                warn!(error = %e, "Gradient generation failed");
                None
            }
        }
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::Angle, InputField::Color0, InputField::Color1]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::Angle => Some((InputType::Double, ParamValue::Double(0.0))),
            InputField::Color0 => Some((InputType::Color, ParamValue::Color([0.0, 0.0, 0.0, 1.0]))),
            InputField::Color1 => Some((InputType::Color, ParamValue::Color([1.0, 1.0, 1.0, 1.0]))),
            _ => None,
        }
    }
}
