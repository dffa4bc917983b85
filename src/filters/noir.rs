// SPDX-License-Identifier: GPL-3.0-only

//! Dramatic high-contrast black and white (declarative graph)
//!
//! Grayscale conversion, then contrast applied in linear light so shadows
//! do not crush the way a plain sRGB curve would.

use std::sync::Arc;

use crate::backends::graph::{ColorConversion, GraphBackend, ImageOp};
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::Noir,
    id: uuid::uuid!("c8e4b2f6-0d13-4a87-b3e5-9f61d2c47a58"),
    title: "Noir",
    settings_panel: "noir_settings",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Gray,
};

pub struct Noir {
    resources: RenderResources,
    backend: GraphBackend,
    params: Arc<ParameterStore>,
}

impl Noir {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }

    fn build_ops(&self) -> Vec<ImageOp> {
        let contrast = self
            .params
            .get_double(&DESCRIPTOR.id, InputField::InputContrast, 1.6) as f32;
        vec![
            ImageOp::GrayscaleWeights([0.299, 0.587, 0.114]),
            ImageOp::ColorConvert(ColorConversion::SrgbToLinear),
            ImageOp::Contrast { amount: contrast },
            ImageOp::ColorConvert(ColorConversion::LinearToSrgb),
        ]
    }
}

impl Renderer for Noir {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let ops = self.build_ops();
        self.backend.run(&ops, src, &self.resources)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::InputContrast]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::InputContrast => Some((InputType::Double, ParamValue::Double(1.6))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_output_is_monochrome_with_more_contrast() {
        let mut filter = Noir::new(Arc::new(ParameterStore::in_memory()));
        filter
            .initialize(&FrameFormat::new(2, 1, PixelEncoding::Rgba8), 1)
            .unwrap();
        let frame =
            FrameBuffer::from_rgba(2, 1, vec![200, 180, 160, 255, 60, 50, 70, 255]).unwrap();
        let out = filter.render_frame(&frame).unwrap();

        let bright = out.data()[0];
        let dark = out.data()[4];
        for px in out.data().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
        // contrast widens the spread between the two samples
        assert!(bright as i16 - dark as i16 > 140);
    }
}
