// SPDX-License-Identifier: GPL-3.0-only

//! Pixel population count (custom compute kernel)
//!
//! Counts pixels within a per-channel tolerance of a target color.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::warn;

use crate::backends::compute::ComputeBackend;
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::gpu::GpuContext;
use crate::params::{InputField, InputType, ParamValue, ParameterStore};
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, LIVE_AND_VIDEO,
};
use crate::render::{
    renderer_boilerplate, QueryRequest, QueryResults, QueryValue, RenderPath, RenderResources,
    Renderer,
};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::PixelCounter,
    id: uuid::uuid!("2e9c7a41-d85f-4b30-8c16-a4f3d19b75e0"),
    title: "Pixel Counter",
    settings_panel: "pixel_counter_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::INPUT_ONLY,
    targets: LIVE_AND_VIDEO,
    group: FilterGroup::Measurement,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PixelCountParams {
    width: u32,
    height: u32,
    tolerance: f32,
    _pad: u32,
    target: [f32; 4],
}

pub struct PixelCounter {
    resources: RenderResources,
    backend: ComputeBackend,
    params: Arc<ParameterStore>,
}

impl PixelCounter {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_query(
                "pixel_count",
                cpu_kernel,
                gpu,
                std::mem::size_of::<PixelCountParams>(),
            )?,
            params,
        })
    }
}

fn cpu_kernel(params: &[u8], src: &[u8], _width: u32, _height: u32, out: &mut [u8]) {
    let p: &PixelCountParams = bytemuck::from_bytes(params);
    let mut matching = 0u32;
    let mut total = 0u32;
    for px in src.chunks_exact(4) {
        let diff_r = (px[0] as f32 / 255.0 - p.target[0]).abs();
        let diff_g = (px[1] as f32 / 255.0 - p.target[1]).abs();
        let diff_b = (px[2] as f32 / 255.0 - p.target[2]).abs();
        if diff_r.max(diff_g).max(diff_b) <= p.tolerance {
            matching += 1;
        }
        total += 1;
    }
    out[0..4].copy_from_slice(&matching.to_le_bytes());
    out[4..8].copy_from_slice(&total.to_le_bytes());
}

impl Renderer for PixelCounter {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let mut out = self.resources.acquire_output(src.data().len());
        out.copy_from_slice(src.data());
        FrameBuffer::from_rgba(src.width(), src.height(), out)
    }

    fn teardown(&mut self) {
        self.backend.release_image_cache();
    }

    fn query(&mut self, frame: &FrameBuffer, request: &QueryRequest) -> Option<QueryResults> {
        assert!(
            self.initialized() || self.initialized_for_image(),
            "Pixel Counter query called before initialize"
        );

        let src = match frame.normalize_to_rgba() {
            Ok(src) => src,
            Err(e) => {
                warn!(error = %e, "Pixel Counter could not normalize input");
                return None;
            }
        };

        let id = &DESCRIPTOR.id;
        let target = self
            .params
            .get_color(id, InputField::HighlightColor, [1.0, 1.0, 1.0, 1.0]);
        let tolerance = request.double(
            "Tolerance",
            self.params.get_normal(id, InputField::InputThreshold, 0.02),
        ) as f32;

        let params = PixelCountParams {
            width: src.width(),
            height: src.height(),
            tolerance,
            _pad: 0,
            target,
        };

        let bytes = match self.backend.run_query(
            bytemuck::bytes_of(&params),
            &src,
            8,
            (src.width(), src.height()),
        ) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Pixel Counter query failed");
                return None;
            }
        };

        let matching = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let total = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        let mut results = QueryResults::new();
        results.insert("MatchingPixels".to_string(), QueryValue::Int(matching as i64));
        results.insert("TotalPixels".to_string(), QueryValue::Int(total as i64));
        results.insert("TargetColor".to_string(), QueryValue::Color(target));
        Some(results)
    }

    fn supported_fields(&self) -> Vec<InputField> {
        vec![InputField::HighlightColor, InputField::InputThreshold]
    }

    fn default_field_value(&self, field: InputField) -> Option<(InputType, ParamValue)> {
        match field {
            InputField::HighlightColor => {
                Some((InputType::Color, ParamValue::Color([1.0, 1.0, 1.0, 1.0])))
            }
            InputField::InputThreshold => Some((InputType::Normal, ParamValue::Double(0.02))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_counts_matching_pixels() {
        let params = Arc::new(ParameterStore::in_memory());
        params.set_field(
            &DESCRIPTOR.id,
            InputField::HighlightColor,
            ParamValue::Color([1.0, 0.0, 0.0, 1.0]),
        );

        let mut filter = PixelCounter::new(None, params).unwrap();
        filter
            .initialize(&FrameFormat::new(2, 1, PixelEncoding::Rgba8), 1)
            .unwrap();

        let frame =
            FrameBuffer::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
        let results = filter.query(&frame, &QueryRequest::new()).unwrap();
        assert_eq!(results.get("MatchingPixels"), Some(&QueryValue::Int(1)));
        assert_eq!(results.get("TotalPixels"), Some(&QueryValue::Int(2)));
    }
}
