// SPDX-License-Identifier: GPL-3.0-only

//! Windowed median (specialized operator)
//!
//! Reports itself slow: a full sort per pixel per channel is far beyond the
//! live frame budget at capture resolutions, so the pipeline throttles or
//! routes it to stills.

use std::sync::Arc;

use crate::backends::specialized::{self, SpecializedOp};
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::Median,
    id: uuid::uuid!("0c52f8b9-a3d7-4e61-b8f4-29c615d0a7e3"),
    title: "Median",
    settings_panel: "median_settings",
    kernel: FilterKind::SpecializedOp,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Effects,
};

pub struct Median {
    resources: RenderResources,
    params: Arc<ParameterStore>,
}

impl Median {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            params,
        }
    }
}

impl Renderer for Median {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let window = self
            .params
            .get_int(&DESCRIPTOR.id, InputField::WindowSize, 1)
            .clamp(1, 4) as u32;
        specialized::run(SpecializedOp::Median { window }, src)
    }

    fn is_slow(&self) -> bool {
        true
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::WindowSize]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::WindowSize => Some((InputType::Int, ParamValue::Int(1))),
            _ => None,
        }
    }
}
