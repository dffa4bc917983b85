// SPDX-License-Identifier: GPL-3.0-only

//! Block statistics measurement (custom compute kernel)
//!
//! Input-only: `query` returns one record per block instead of an image.
//! The live render entry passes frames through untouched so the preview
//! keeps running while a measurement overlay reads the records.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::warn;

use crate::backends::compute::ComputeBackend;
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::gpu::GpuContext;
use crate::params::ParameterStore;
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, LIVE_AND_VIDEO,
};
use crate::render::{
    renderer_boilerplate, QueryRequest, QueryResults, QueryValue, RenderPath, RenderResources,
    Renderer,
};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::BlockMean,
    id: uuid::uuid!("06e66eec-61b8-4b99-8bf2-788b52b5afce"),
    title: "Block Mean",
    settings_panel: "block_mean_settings",
    kernel: FilterKind::CustomCompute,
    ports: Ports::INPUT_ONLY,
    targets: LIVE_AND_VIDEO,
    group: FilterGroup::Measurement,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlockMeanParams {
    width: u32,
    height: u32,
    block_width: u32,
    block_height: u32,
    calc_mean: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

pub struct BlockMean {
    resources: RenderResources,
    backend: ComputeBackend,
    #[allow(dead_code)]
    params: Arc<ParameterStore>,
}

impl BlockMean {
    pub fn new(gpu: Option<Arc<GpuContext>>, params: Arc<ParameterStore>) -> RenderResult<Self> {
        Ok(Self {
            resources: RenderResources::new(),
            backend: ComputeBackend::for_query(
                "block_mean",
                cpu_kernel,
                gpu,
                std::mem::size_of::<BlockMeanParams>(),
            )?,
            params,
        })
    }
}

/// CPU reference for the `block_mean` kernel
fn cpu_kernel(params: &[u8], src: &[u8], width: u32, height: u32, out: &mut [u8]) {
    let p: &BlockMeanParams = bytemuck::from_bytes(params);
    let bw = p.block_width.max(1) as usize;
    let bh = p.block_height.max(1) as usize;
    let w = width as usize;
    let h = height as usize;
    let blocks_x = w.div_ceil(bw);
    let blocks_y = h.div_ceil(bh);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let mut sum = [0.0f32; 4];
            let mut count = 0.0f32;
            for row in (by * bh)..((by + 1) * bh).min(h) {
                for col in (bx * bw)..((bx + 1) * bw).min(w) {
                    let idx = (row * w + col) * 4;
                    for ch in 0..4 {
                        sum[ch] += src[idx + ch] as f32 / 255.0;
                    }
                    count += 1.0;
                }
            }
            if p.calc_mean != 0 && count > 0.0 {
                for ch in &mut sum {
                    *ch /= count;
                }
            }
            let record = (by * blocks_x + bx) * 16;
            for (ch, value) in sum.iter().enumerate() {
                out[record + ch * 4..record + ch * 4 + 4]
                    .copy_from_slice(&value.to_le_bytes());
            }
        }
    }
}

fn decode_records(bytes: &[u8]) -> Vec<[f32; 4]> {
    bytes
        .chunks_exact(16)
        .map(|chunk| {
            let mut record = [0.0f32; 4];
            for (ch, value) in record.iter_mut().enumerate() {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(&chunk[ch * 4..ch * 4 + 4]);
                *value = f32::from_le_bytes(raw);
            }
            record
        })
        .collect()
}

impl Renderer for BlockMean {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        // Measurement filters leave the image untouched
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
            "Block Mean query called before initialize"
        );

        let src = match frame.normalize_to_rgba() {
            Ok(src) => src,
            Err(e) => {
                warn!(error = %e, "Block Mean could not normalize input");
                return None;
            }
        };

        let block_width = request.int("Width", 16).max(1) as u32;
        let block_height = request.int("Height", 16).max(1) as u32;
        let calc_mean = request.bool("CalculateMean", true);

        let blocks_x = src.width().div_ceil(block_width);
        let blocks_y = src.height().div_ceil(block_height);
        let out_len = (blocks_x * blocks_y * 16) as usize;

        let params = BlockMeanParams {
            width: src.width(),
            height: src.height(),
            block_width,
            block_height,
            calc_mean: calc_mean as u32,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        };

        let bytes = match self.backend.run_query(
            bytemuck::bytes_of(&params),
            &src,
            out_len,
            (blocks_x, blocks_y),
        ) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Block Mean query failed");
                return None;
            }
        };

        let mut results = QueryResults::new();
        results.insert(
            "BlockMeans".to_string(),
            QueryValue::ColorList(decode_records(&bytes)),
        );
        results.insert(
            "HorizontalBlocks".to_string(),
            QueryValue::Int(blocks_x as i64),
        );
        results.insert(
            "VerticalBlocks".to_string(),
            QueryValue::Int(blocks_y as i64),
        );
        Some(results)
    }
}
