// SPDX-License-Identifier: GPL-3.0-only

//! Identity filter (declarative graph)
//!
//! Does nothing, on purpose. Keeps the preview path exercised with the
//! same pool and adapter machinery every other filter uses.

use std::sync::Arc;

use crate::backends::graph::GraphBackend;
use crate::errors::RenderResult;
use crate::frame::FrameBuffer;
use crate::params::ParameterStore;
use crate::registry::{
    FilterDescriptor, FilterGroup, FilterKind, FilterType, Ports, ALL_TARGETS,
};
use crate::render::{renderer_boilerplate, RenderPath, RenderResources, Renderer};

pub static DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    filter_type: FilterType::PassThrough,
    id: uuid::uuid!("9a45c4c3-7a3e-4e0a-9b52-6a8f27a1f3d1"),
    title: "Pass Through",
    settings_panel: "no_parameters",
    kernel: FilterKind::DeclarativeGraph,
    ports: Ports::BOTH,
    targets: ALL_TARGETS,
    group: FilterGroup::Standard,
};

pub struct PassThrough {
    resources: RenderResources,
    backend: GraphBackend,
    #[allow(dead_code)]
    params: Arc<ParameterStore>,
}

impl PassThrough {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            resources: RenderResources::new(),
            backend: GraphBackend::new(),
            params,
        }
    }
}

impl Renderer for PassThrough {
    renderer_boilerplate!(DESCRIPTOR);

    fn render_canonical(&mut self, src: &FrameBuffer, _path: RenderPath) -> RenderResult<FrameBuffer> {
        self.backend.run(&[], src, &self.resources)
    }
}
