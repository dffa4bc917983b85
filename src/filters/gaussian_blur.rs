// SPDX-License-Identifier: GPL-3.0-only

//! Separable Gaussian blur (specialized operator)

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
    filter_type: FilterType::GaussianBlur,
    id: uuid::uuid!("b1f68e2d-40a9-4c57-93d8-5e21c7f0a864"),
    title: "Gaussian Blur",
    settings_panel: "gaussian_blur_settings",
    kernel: FilterKind::SpecializedOp,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Effects,
};

pub struct GaussianBlur {
    resources: RenderResources,
    params: Arc<ParameterStore>,
}

impl GaussianBlur {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            params,
        }
    }
}

impl Renderer for GaussianBlur {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let sigma = self
            .params
            .get_double(&DESCRIPTOR.id, InputField::Radius, 3.0) as f32;
        specialized::run(SpecializedOp::GaussianBlur { sigma }, src)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::Radius]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::Radius => Some((InputType::Double, ParamValue::Double(3.0))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_blur_spreads_impulse() {
        let mut filter = GaussianBlur::new(Arc::new(ParameterStore::in_memory()));
        filter
            .initialize(&FrameFormat::new(9, 9, PixelEncoding::Rgba8), 1)
            .unwrap();

        let mut data = vec![0u8; 9 * 9 * 4];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        let center = (4 * 9 + 4) * 4;
        data[center] = 255;
        let frame = FrameBuffer::from_rgba(9, 9, data).unwrap();
        let out = filter.render_frame(&frame).unwrap();

        let neighbor = (4 * 9 + 5) * 4;
        assert!(out.data()[center] < 255);
        assert!(out.data()[neighbor] > 0);
    }
}
