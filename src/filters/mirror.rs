// SPDX-License-Identifier: GPL-3.0-only

//! Half-frame mirroring (declarative graph)
//!
//! Crops one half of the frame, flips it, and composites it over the
//! opposite half.

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
    filter_type: FilterType::Mirror,
    id: uuid::uuid!("1b7f4d92-c6a5-4e38-b07d-3a92e8f5c016"),
    title: "Mirroring",
    settings_panel: "mirror_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Tiles,
};

pub struct Mirror {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl Mirror {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    /// side 0 reflects the left half onto the right, 1 the reverse
    fn build_ops(&self, width: u32, height: u32) -> Vec<ImageOp> {
        let side = self
            .params
            .get_int(&DESCRIPTOR.id, InputField::HorizontalSide, 0);
        let half = (width / 2).max(1);
        let (crop_x, origin_x) = if side == 0 { (0, half) } else { (half, 0) };
        vec![ImageOp::Composite {
            ops: vec![
                ImageOp::Crop {
                    x: crop_x,
                    y: 0,
                    width: half,
                    height,
                },
                ImageOp::FlipHorizontal,
            ],
            origin: (origin_x, 0),
        }]
    }
}

impl Renderer for Mirror {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops(src.width(), src.height());
        self.backend.run(&ops, src, &self.resources)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::MirroringDirection, InputField::HorizontalSide]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::MirroringDirection => Some((InputType::Int, ParamValue::Int(0))),
            InputField::HorizontalSide => Some((InputType::Int, ParamValue::Int(0))),
            _ => None,
        }
    }
}
