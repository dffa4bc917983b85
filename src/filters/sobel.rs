// SPDX-License-Identifier: GPL-3.0-only

//! Sobel edge detection (specialized operator)

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
    filter_type: FilterType::Sobel,
    id: uuid::uuid!("98d4a7e3-6b1f-4d02-85c9-f73e0b2a41d6"),
    title: "Sobel",
    settings_panel: "sobel_settings",
    kernel: FilterKind::SpecializedOp,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Effects,
};

pub struct Sobel {
    resources: RenderResources,
    params: Arc<ParameterStore>,
}

impl Sobel {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            params,
        }
    }
}

impl Renderer for Sobel {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let intensity = self
            .params
            .get_double(&DESCRIPTOR.id, InputField::EdgeIntensity, 1.0) as f32;
        specialized::run(SpecializedOp::Sobel { intensity }, src)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::EdgeIntensity]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::EdgeIntensity => Some((InputType::Double, ParamValue::Double(1.0))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_flat_region_goes_dark() {
        let mut filter = Sobel::new(Arc::new(ParameterStore::in_memory()));
        filter
            .initialize(&FrameFormat::new(4, 4, PixelEncoding::Rgba8), 1)
            .unwrap();
        let frame = FrameBuffer::from_rgba(4, 4, vec![99u8; 64]).unwrap();
        let out = filter.render_frame(&frame).unwrap();
        assert_eq!(&out.data()[..3], &[0, 0, 0]);
    }
}
