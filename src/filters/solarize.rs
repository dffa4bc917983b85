// SPDX-License-Identifier: GPL-3.0-only

//! Solarization (custom compute kernel)

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
    filter_type: FilterType::Solarize,
    id: uuid::uuid!("40e83f7a-16dc-4b95-8d03-b52c1a69e7f4"),
    title: "Solarize",
    settings_panel: "solarize_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Effects,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SolarizeParams {
    width: u32,
    height: u32,
    threshold: f32,
    if_greater: u32,
}

pub struct Solarize {
    resources: RenderResources,
    backend: ComputeBackend,
    params: Arc<ParameterStore>,
}

impl Solarize {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_image(
                "solarize",
                cpu_kernel,
                gpu,
                std::mem::size_of::<SolarizeParams>(),
            )?,
            params,
        })
    }

    fn pack(&self, width: u32, height: u32) -> SolarizeParams {
        let id = &DESCRIPTOR.id;
        SolarizeParams {
            width,
            height,
            threshold: self.params.get_normal(id, InputField::SolarizeThreshold, 0.5) as f32,
            if_greater: self.params.get_bool(id, InputField::SolarizeIfGreater, true) as u32,
        }
    }
}

fn cpu_kernel(params: &[u8], src: &[u8], _width: u32, _height: u32, out: &mut [u8]) {
    let p: &SolarizeParams = bytemuck::from_bytes(params);
    for (s, d) in src.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let r = s[0] as f32 / 255.0;
        let g = s[1] as f32 / 255.0;
        let b = s[2] as f32 / 255.0;
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let crossed = if p.if_greater != 0 {
            luma > p.threshold
        } else {
            luma < p.threshold
        };
        if crossed {
            d[0] = 255 - s[0];
            d[1] = 255 - s[1];
            d[2] = 255 - s[2];
        } else {
            d[..3].copy_from_slice(&s[..3]);
        }
        d[3] = s[3];
    }
}

impl Renderer for Solarize {
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
        vec![InputField::SolarizeThreshold, InputField::SolarizeIfGreater]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::SolarizeThreshold => Some((InputType::Normal, ParamValue::Double(0.5))),
            InputField::SolarizeIfGreater => Some((InputType::Bool, ParamValue::Bool(true))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_bright_pixels_invert_dark_pixels_hold() {
        let mut filter = Solarize::new(None, Arc::new(ParameterStore::in_memory())).unwrap();
        filter
            .initialize(&FrameFormat::new(2, 1, PixelEncoding::Rgba8), 1)
            .unwrap();
        let frame =
            FrameBuffer::from_rgba(2, 1, vec![250, 250, 250, 255, 10, 10, 10, 255]).unwrap();
        let out = filter.render_frame(&frame).unwrap();
        assert_eq!(&out.data()[..4], &[5, 5, 5, 255]);
        assert_eq!(&out.data()[4..8], &[10, 10, 10, 255]);
    }
}
