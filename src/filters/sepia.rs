// SPDX-License-Identifier: GPL-3.0-only

//! Sepia tone (declarative graph)

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
    filter_type: FilterType::Sepia,
    id: uuid::uuid!("3f1c8d0e-5bb4-4c22-8f0a-2d4e6b7c9a10"),
    title: "Sepia Tone",
    settings_panel: "sepia_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Standard,
};

pub struct Sepia {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl Sepia {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    fn build_ops(&self) -> Vec<ImageOp> {
        let level = self
            .params
            .get_normal(&DESCRIPTOR.id, InputField::SepiaToneLevel, 1.0) as f32;
        vec![ImageOp::SepiaTone { level }]
    }
}

impl Renderer for Sepia {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops();
        self.backend.run(&ops, src, &self.resources)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::SepiaToneLevel]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::SepiaToneLevel => Some((InputType::Normal, ParamValue::Double(1.0))),
            _ => None,
        }
    }
}
