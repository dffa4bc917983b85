// SPDX-License-Identifier: GPL-3.0-only

//! Per-channel color inversion (custom compute kernel)

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::backends::compute::ComputeBackend;
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::gpu::GpuContext;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::ColorInverter,
    id: uuid::uuid!("d2c55b18-9e47-4f0b-a631-28c9f47e03bd"),
    title: "Color Inverter",
    settings_panel: "color_inverter_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Colors,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct InvertParams {
    width: u32,
    height: u32,
    invert_r: u32,
    invert_g: u32,
    invert_b: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

pub struct ColorInverter {
    resources: RenderResources,
    backend: ComputeBackend,
    params: Arc<ParameterStore>,
}

impl ColorInverter {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_image(
                "color_invert",
                cpu_kernel,
                gpu,
                std::mem::size_of::<InvertParams>(),
            )?,
            params,
        })
    }

    fn pack(&self, width: u32, height: u32) -> InvertParams {
        let id = &DESCRIPTOR.id;
        InvertParams {
            width,
            height,
            invert_r: self.params.get_bool(id, InputField::InvertRed, true) as u32,
            invert_g: self.params.get_bool(id, InputField::InvertGreen, true) as u32,
            invert_b: self.params.get_bool(id, InputField::InvertBlue, true) as u32,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        }
    }
}

fn cpu_kernel(params: &[u8], src: &[u8], _width: u32, _height: u32, out: &mut [u8]) {
    let p: &InvertParams = bytemuck::from_bytes(params);
    for (s, d) in src.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        d[0] = if p.invert_r != 0 { 255 - s[0] } else { s[0] };
        d[1] = if p.invert_g != 0 { 255 - s[1] } else { s[1] };
        d[2] = if p.invert_b != 0 { 255 - s[2] } else { s[2] };
        d[3] = s[3];
    }
}

impl Renderer for ColorInverter {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, path: RenderPath) -> RenderResult<FrameBuffer> {
        let params = self.pack(src.width(), src.height());
        self.backend
            .run_image(&self.resources, bytemuck::bytes_of(&params), src, path)
    }

    fn teardown(&mut self) {
        self.backend.release_image_cache();
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![
            InputField::InvertRed,
            InputField::InvertGreen,
            InputField::InvertBlue,
        ]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::InvertRed | InputField::InvertGreen | InputField::InvertBlue => {
                Some((InputType::Bool, ParamValue::Bool(true)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_full_inversion() {
        let mut filter = ColorInverter::new(None, Arc::new(ParameterStore::in_memory())).unwrap();
        filter
            .initialize(&FrameFormat::new(2, 2, PixelEncoding::Rgba8), 1)
            .unwrap();
        let frame = FrameBuffer::from_rgba(2, 2, vec![0u8; 16]).unwrap();
        let out = filter.render_frame(&frame).unwrap();
        for px in out.data().chunks_exact(4) {
            assert_eq!(&px[..3], &[255, 255, 255]);
        }
    }

    #[test]
    fn test_selective_inversion_via_params() {
        let params = Arc::new(ParameterStore::in_memory());
        params.set_field(&DESCRIPTOR.id, InputField::InvertGreen, ParamValue::Bool(false));
        params.set_field(&DESCRIPTOR.id, InputField::InvertBlue, ParamValue::Bool(false));

        let mut filter = ColorInverter::new(None, params).unwrap();
        filter
            .initialize(&FrameFormat::new(1, 1, PixelEncoding::Rgba8), 1)
            .unwrap();
        let frame = FrameBuffer::from_rgba(1, 1, vec![10, 20, 30, 255]).unwrap();
        let out = filter.render_frame(&frame).unwrap();
        assert_eq!(&out.data()[..4], &[245, 20, 30, 255]);
    }
}
