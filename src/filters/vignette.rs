// SPDX-License-Identifier: GPL-3.0-only

//! Edge-darkening vignette (declarative graph)

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
    filter_type: FilterType::Vignette,
    id: uuid::uuid!("7c33e9a0-84f1-4b6d-8a27-d05f19c6e483"),
    title: "Vignette",
    settings_panel: "vignette_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Effects,
};

pub struct Vignette {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl Vignette {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    fn build_ops(&self) -> Vec<ImageOp> {
        let id = &DESCRIPTOR.id;
        let center = self.params.get_point(id, InputField::Center, (0.5, 0.5));
        let inner = self.params.get_normal(id, InputField::Width, 0.3) as f32;
        let outer = self.params.get_normal(id, InputField::Radius, 0.9) as f32;
        vec![ImageOp::RadialShade {
            center: (center.0 as f32, center.1 as f32),
            inner,
            outer,
        }]
    }
}

impl Renderer for Vignette {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops();
        self.backend.run(&ops, src, &self.resources)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::Center, InputField::Width, InputField::Radius]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::Center => Some((InputType::Point, ParamValue::Point(0.5, 0.5))),
            InputField::Width => Some((InputType::Normal, ParamValue::Double(0.3))),
            InputField::Radius => Some((InputType::Normal, ParamValue::Double(0.9))),
            _ => None,
        }
    }
}
