// SPDX-License-Identifier: GPL-3.0-only

//! Hue rotation (declarative graph)

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
    filter_type: FilterType::HueAdjust,
    id: uuid::uuid!("5d20a1b7-93c6-4f4e-a8d2-7e0b3c915f24"),
    title: "Hue Adjust",
    settings_panel: "hue_adjust_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Colors,
};

pub struct HueAdjust {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl HueAdjust {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    fn build_ops(&self) -> Vec<ImageOp> {
        let radians = self
            .params
            .get_double(&DESCRIPTOR.id, InputField::InputHue, 0.0) as f32;
        vec![ImageOp::HueRotate { radians }]
    }
}

impl Renderer for HueAdjust {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops();
        self.backend.run(&ops, src, &self.resources)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::InputHue]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::InputHue => Some((InputType::Double, ParamValue::Double(0.0))),
            _ => None,
        }
    }
}
