// SPDX-License-Identifier: GPL-3.0-only

//! Procedural checkerboard generator (custom compute kernel)
//!
//! Output-only: on the live path it replaces the camera image entirely, and
//! `generate()` produces a standalone board for export.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::warn;

use crate::backends::compute::ComputeBackend;
use crate::constants::{DEFAULT_GENERATOR_HEIGHT, DEFAULT_GENERATOR_WIDTH};
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::gpu::GpuContext;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::Checkerboard,
    id: uuid::uuid!("f5a219d8-3c70-4e86-b94d-17e08a52c6b3"),
    title: "Checkerboard",
    settings_panel: "checkerboard_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::OUTPUT_ONLY,
    targets: ALL_TARGETS,
    group: FilterGroup::Generators,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CheckerboardParams {
    width: u32,
    height: u32,
    cell_width: u32,
    cell_height: u32,
    color0: [f32; 4],
    color1: [f32; 4],
}

pub struct Checkerboard {
    resources: RenderResources,
    backend: ComputeBackend,
    params: Arc<ParameterStore>,
}

impl Checkerboard {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_image(
                "checkerboard",
                cpu_kernel,
                gpu,
                std::mem::size_of::<CheckerboardParams>(),
            )?,
            params,
        })
    }

    fn pack(&self, width: u32, height: u32) -> CheckerboardParams {
        let id = &DESCRIPTOR.id;
        CheckerboardParams {
            width,
            height,
            cell_width: self.params.get_int(id, InputField::GridX, 32).max(1) as u32,
            cell_height: self.params.get_int(id, InputField::GridY, 32).max(1) as u32,
            color0: self
                .params
                .get_color(id, InputField::GridColor, [0.0, 0.0, 0.0, 1.0]),
            color1: self
                .params
                .get_color(id, InputField::GridBackground, [1.0, 1.0, 1.0, 1.0]),
        }
    }
}

fn cpu_kernel(params: &[u8], _src: &[u8], width: u32, height: u32, out: &mut [u8]) {
    let p: &CheckerboardParams = bytemuck::from_bytes(params);
    let cw = p.cell_width.max(1) as usize;
    let ch = p.cell_height.max(1) as usize;
    let encode = |c: [f32; 4]| -> [u8; 4] {
        [
            (c[0].clamp(0.0, 1.0) * 255.0).round() as u8,
            (c[1].clamp(0.0, 1.0) * 255.0).round() as u8,
            (c[2].clamp(0.0, 1.0) * 255.0).round() as u8,
            (c[3].clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    };
    let c0 = encode(p.color0);
    let c1 = encode(p.color1);
    for row in 0..height as usize {
        for col in 0..width as usize {
            let parity = (col / cw + row / ch) % 2;
            let px = if parity == 1 { c1 } else { c0 };
            let d = (row * width as usize + col) * 4;
            out[d..d + 4].copy_from_slice(&px);
        }
    }
}

impl Renderer for Checkerboard {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, path: RenderPath) -> RenderResult<FrameBuffer> {
        // Generator: only the source dimensions matter
        let params = self.pack(src.width(), src.height());
        self.backend
            .run_image(&self.resources, bytemuck::bytes_of(&params), src, path)
    }

    fn teardown(&mut self) {
        self.backend.release_image_cache();
    }

    fn generate(&mut self) -> Option<image::RgbaImage> {
        let (width, height) = match &self.resources.output_format {
            Some(format) => (format.width, format.height),
            None => (DEFAULT_GENERATOR_WIDTH, DEFAULT_GENERATOR_HEIGHT),
        };
        let blank = FrameBuffer::from_rgba(
            width,
            height,
            vec![0u8; (width * height * 4) as usize],
        )
        .ok()?;
        match self.render_canonical(&blank, RenderPath::Still) {
            Ok(out) => out.to_image().ok(),
            Err(e) => {
                warn!(error = %e, "Checkerboard generation failed");
                None
            }
        }
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![
            InputField::GridX,
            InputField::GridY,
            InputField::GridColor,
            InputField::GridBackground,
        ]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::GridX | InputField::GridY => Some((InputType::Int, ParamValue::Int(32))),
            InputField::GridColor => {
                Some((InputType::Color, ParamValue::Color([0.0, 0.0, 0.0, 1.0])))
            }
            InputField::GridBackground => {
                Some((InputType::Color, ParamValue::Color([1.0, 1.0, 1.0, 1.0])))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_alternates_cells() {
        let params = Arc::new(ParameterStore::in_memory());
        params.set_field(&DESCRIPTOR.id, InputField::GridX, ParamValue::Int(1));
        params.set_field(&DESCRIPTOR.id, InputField::GridY, ParamValue::Int(1));

        let mut filter = Checkerboard::new(None, params).unwrap();
        let board = filter.generate().unwrap();
        assert_eq!(board.width(), DEFAULT_GENERATOR_WIDTH);

        let a = board.get_pixel(0, 0);
        let b = board.get_pixel(1, 0);
        assert_ne!(a, b);
        let c = board.get_pixel(1, 1);
        assert_eq!(a, c);
    }
}
