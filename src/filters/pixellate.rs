// SPDX-License-Identifier: GPL-3.0-only

//! Block pixellation (custom compute kernel)

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
    filter_type: FilterType::Pixellate,
    id: uuid::uuid!("83b0d6c5-f24a-4917-a5be-60d7e2c84f39"),
    title: "Pixellate",
    settings_panel: "pixellate_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Tiles,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PixellateParams {
    width: u32,
    height: u32,
    block_width: u32,
    block_height: u32,
}

pub struct Pixellate {
    resources: RenderResources,
    backend: ComputeBackend,
    params: Arc<ParameterStore>,
}

impl Pixellate {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_image(
                "pixellate",
                cpu_kernel,
                gpu,
                std::mem::size_of::<PixellateParams>(),
            )?,
            params,
        })
    }

    fn pack(&self, width: u32, height: u32) -> PixellateParams {
        let id = &DESCRIPTOR.id;
        PixellateParams {
            width,
            height,
            block_width: self.params.get_int(id, InputField::BlockWidth, 16).max(1) as u32,
            block_height: self.params.get_int(id, InputField::BlockHeight, 16).max(1) as u32,
        }
    }
}

fn cpu_kernel(params: &[u8], src: &[u8], width: u32, height: u32, out: &mut [u8]) {
    let p: &PixellateParams = bytemuck::from_bytes(params);
    let bw = p.block_width.max(1) as usize;
    let bh = p.block_height.max(1) as usize;
    let w = width as usize;
    for row in 0..height as usize {
        let sample_row = row - row % bh;
        for col in 0..w {
            let sample_col = col - col % bw;
            let s = (sample_row * w + sample_col) * 4;
            let d = (row * w + col) * 4;
            out[d..d + 4].copy_from_slice(&src[s..s + 4]);
        }
    }
}

impl Renderer for Pixellate {
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
        vec![InputField::BlockWidth, InputField::BlockHeight]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::BlockWidth | InputField::BlockHeight => {
                Some((InputType::Int, ParamValue::Int(16)))
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
    fn test_blocks_take_origin_sample() {
        let params = Arc::new(ParameterStore::in_memory());
        params.set_field(&DESCRIPTOR.id, InputField::BlockWidth, ParamValue::Int(2));
        params.set_field(&DESCRIPTOR.id, InputField::BlockHeight, ParamValue::Int(2));

        let mut filter = Pixellate::new(None, params).unwrap();
        filter
            .initialize(&FrameFormat::new(2, 2, PixelEncoding::Rgba8), 1)
            .unwrap();

        let frame = FrameBuffer::from_rgba(
            2,
            2,
            vec![
                9, 9, 9, 255, 50, 50, 50, 255, //
                80, 80, 80, 255, 120, 120, 120, 255,
            ],
        )
        .unwrap();
        let out = filter.render_frame(&frame).unwrap();
        for px in out.data().chunks_exact(4) {
            assert_eq!(&px[..3], &[9, 9, 9]);
        }
    }
}
