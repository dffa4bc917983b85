// SPDX-License-Identifier: GPL-3.0-only

//! Two-color luminance mapping (declarative graph)

use std::sync::Arc;

use crate::backends::graph::{GraphBackend, ImageOp};
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::FalseColor,
    id: uuid::uuid!("e6b91c44-2f5a-47d3-9c08-514a7d8e2b6f"),
    title: "False Color",
    settings_panel: "false_color_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Colors,
};

pub struct FalseColor {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl FalseColor {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    fn build_ops(&self) -> Vec<ImageOp> {
        let id = &DESCRIPTOR.id;
        let color0 = self
            .params
            .get_color(id, InputField::Color0, [0.1, 0.1, 0.4, 1.0]);
        let color1 = self
            .params
            .get_color(id, InputField::Color1, [1.0, 0.9, 0.5, 1.0]);
        vec![ImageOp::GradientMap { color0, color1 }]
    }
}

impl Renderer for FalseColor {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops();
        self.backend.run(&ops, src, &self.resources)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::Color0, InputField::Color1]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::Color0 => Some((InputType::Color, ParamValue::Color([0.1, 0.1, 0.4, 1.0]))),
            InputField::Color1 => Some((InputType::Color, ParamValue::Color([1.0, 0.9, 0.5, 1.0]))),
            _ => None,
        }
    }
}
