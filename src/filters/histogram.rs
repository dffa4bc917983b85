// SPDX-License-Identifier: GPL-3.0-only

//! Luminance histogram measurement (specialized operator)
//!
//! Input-only: `query` returns the 256-bin histogram and its brightness
//! summary while the live frame passes through untouched.

use std::sync::Arc;

use tracing::warn;

use crate::backends::specialized;
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::params::ParameterStore;
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, LIVE_AND_VIDEO,
};
use crate::render::{
    renderer_boilerplate, QueryRequest, QueryResults, QueryValue, RenderPath, RenderResources,
    Renderer,
};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::Histogram,
    id: uuid::uuid!("67a3c1f0-8e5b-4d49-a2d7-c94b08f163e5"),
    title: "Histogram",
    settings_panel: "histogram_settings",
    kernel: FilterKind::SpecializedOp,
    ports: Ports::INPUT_ONLY,
    targets: LIVE_AND_VIDEO,
    group: FilterGroup::Measurement,
};

pub struct Histogram {
    resources: RenderResources,
    #[allow(dead_code)]
    params: Arc<ParameterStore>,
}

impl Histogram {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            params,
        }
    }
}

impl Renderer for Histogram {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        let mut out = self.resources.acquire_output(src.data().len());
        out.copy_from_slice(src.data());
        FrameBuffer::from_rgba(src.width(), src.height(), out)
    }

    fn query(&mut self, frame: &FrameBuffer, _request: &QueryRequest) -> Option<QueryResults> {
        assert!(
            self.initialized() || self.initialized_for_image(),
            "Histogram query called before initialize"
        );

        let src = match frame.normalize_to_rgba() {
            Ok(src) => src,
            Err(e) => {
                warn!(error = %e, "Histogram could not normalize input");
                return None;
            }
        };

        let (bins, summary) = match specialized::luminance_histogram(&src) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Histogram accumulation failed");
                return None;
            }
        };

        let mut results = QueryResults::new();
        results.insert("Bins".to_string(), QueryValue::CountList(bins));
        results.insert(
            "MeanLuminance".to_string(),
            QueryValue::Double(summary.mean as f64),
        );
        results.insert(
            "MedianLuminance".to_string(),
            QueryValue::Double(summary.median as f64),
        );
        results.insert(
            "Percentile5".to_string(),
            QueryValue::Double(summary.percentile_5 as f64),
        );
        results.insert(
            "Percentile95".to_string(),
            QueryValue::Double(summary.percentile_95 as f64),
        );
        Some(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFormat, PixelEncoding};

    #[test]
    fn test_uniform_input_single_bin() {
        let mut filter = Histogram::new(Arc::new(ParameterStore::in_memory()));
        filter
            .initialize(&FrameFormat::new(8, 8, PixelEncoding::Rgba8), 1)
            .unwrap();
        let frame = FrameBuffer::from_rgba(8, 8, vec![128u8; 8 * 8 * 4]).unwrap();
        let results = filter.query(&frame, &QueryRequest::new()).unwrap();

        let Some(QueryValue::CountList(bins)) = results.get("Bins") else {
            panic!("missing bins");
        };
        assert_eq!(bins[128], 64);
        assert_eq!(bins.iter().sum::<u64>(), 64);
    }
}
