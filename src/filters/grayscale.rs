// SPDX-License-Identifier: GPL-3.0-only

//! Weighted grayscale conversion (custom compute kernel)

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
    filter_type: FilterType::Grayscale,
    id: uuid::uuid!("6a76fc03-e4e4-4192-82b6-40cf8e520861"),
    title: "Grayscale",
    settings_panel: "grayscale_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Gray,
};

/// Kernel parameters, binary-copied into the uniform buffer
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GrayscaleParams {
    width: u32,
    height: u32,
    command: u32,
    _pad: u32,
    r_mul: f32,
    g_mul: f32,
    b_mul: f32,
    _pad2: f32,
}

pub struct Grayscale {
    resources: RenderResources,
    backend: ComputeBackend,
    params: Arc<ParameterStore>,
}

impl Grayscale {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_image(
                "grayscale",
                cpu_kernel,
                gpu,
                std::mem::size_of::<GrayscaleParams>(),
            )?,
            params,
        })
    }

    fn pack(&self, width: u32, height: u32) -> GrayscaleParams {
        let id = &DESCRIPTOR.id;
        GrayscaleParams {
            width,
            height,
            command: self.params.get_int(id, InputField::Command, 0).max(0) as u32,
            _pad: 0,
            r_mul: self.params.get_double(id, InputField::RAdjustment, 0.3) as f32,
            g_mul: self.params.get_double(id, InputField::GAdjustment, 0.5) as f32,
            b_mul: self.params.get_double(id, InputField::BAdjustment, 0.2) as f32,
            _pad2: 0.0,
        }
    }
}

/// CPU reference for the `grayscale` kernel; arithmetic matches the WGSL
fn cpu_kernel(params: &[u8], src: &[u8], _width: u32, _height: u32, out: &mut [u8]) {
    let p: &GrayscaleParams = bytemuck::from_bytes(params);
    for (s, d) in src.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let r = s[0] as f32 / 255.0;
        let g = s[1] as f32 / 255.0;
        let b = s[2] as f32 / 255.0;
        let gray = match p.command {
            1 => 0.299 * r + 0.587 * g + 0.114 * b,
            2 => r.max(g).max(b),
            3 => (r + g + b) / 3.0,
            _ => (r * p.r_mul + g * p.g_mul + b * p.b_mul).clamp(0.0, 1.0),
        };
        let level = (gray * 255.0).round() as u8;
        d[0] = level;
        d[1] = level;
        d[2] = level;
        d[3] = s[3];
    }
}

impl Renderer for Grayscale {
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
            InputField::Command,
            InputField::RAdjustment,
            InputField::GAdjustment,
            InputField::BAdjustment,
        ]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::Command => Some((InputType::Int, ParamValue::Int(0))),
            InputField::RAdjustment => Some((InputType::Double, ParamValue::Double(0.3))),
            InputField::GAdjustment => Some((InputType::Double, ParamValue::Double(0.5))),
            InputField::BAdjustment => Some((InputType::Double, ParamValue::Double(0.2))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_mid_gray_stays_uniform() {
        let mut filter = Grayscale::new(None, Arc::new(ParameterStore::in_memory())).unwrap();
        let format = FrameFormat::new(4, 4, PixelEncoding::Rgba8);
        filter.initialize(&format, 2).unwrap();

        let frame = FrameBuffer::from_rgba(4, 4, vec![128u8; 64]).unwrap();
        let out = filter.render_frame(&frame).unwrap();
        assert_eq!(out.width(), 4);
        for px in out.data().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    #[should_panic(expected = "before initialize")]
    fn test_render_before_initialize_panics() {
        let mut filter = Grayscale::new(None, Arc::new(ParameterStore::in_memory())).unwrap();
        let frame = FrameBuffer::from_rgba(2, 2, vec![0u8; 16]).unwrap();
        let _ = filter.render_frame(&frame);
    }
}
