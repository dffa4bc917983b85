// SPDX-License-Identifier: GPL-3.0-only

//! Engine context: one parameter store, one registry, one GPU probe
//!
//! An [`Engine`] is an explicitly constructed context object. Multiple
//! engines coexist in one process (each with its own registry and store),
//! which keeps tests isolated and lets an embedding application run a
//! preview engine next to an export engine.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::RenderResult;
use crate::gpu::{self, GpuContext};
use crate::params::{ParameterStore, SettingsStore};
use crate::registry::{FilterRegistry, FilterType};
use crate::render::FilterInstance;

/// Shared engine context
pub struct Engine {
    gpu: Option<Arc<GpuContext>>,
    params: Arc<ParameterStore>,
    registry: FilterRegistry,
}

impl Engine {
    /// Build an engine, probing once for a compute device
    ///
    /// Without a GPU the engine still works: compute filters run their CPU
    /// reference kernels.
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        let gpu = match pollster::block_on(gpu::create_compute_device("prism_engine")) {
            Ok(ctx) => {
                info!(adapter = %ctx.adapter_name, backend = ?ctx.backend, "Engine using GPU compute");
                Some(Arc::new(ctx))
            }
            Err(e) => {
                warn!(error = %e, "No GPU adapter; compute filters fall back to CPU");
                None
            }
        };
        Self::build(store, gpu)
    }

    /// Build an engine that never touches the GPU
    pub fn software(store: Box<dyn SettingsStore>) -> Self {
        Self::build(store, None)
    }

    /// Engine with in-memory settings, the common test configuration
    pub fn with_memory_settings() -> Self {
        Self::software(Box::new(crate::params::MemoryStore::new()))
    }

    fn build(store: Box<dyn SettingsStore>, gpu: Option<Arc<GpuContext>>) -> Self {
        Self {
            gpu,
            params: Arc::new(ParameterStore::new(store)),
            registry: FilterRegistry::new(),
        }
    }

    /// Instantiate a live filter for `filter_type`
    ///
    /// The instance is shared: the capture thread renders through it while
    /// the UI thread queries it.
    pub fn create_filter(&self, filter_type: FilterType) -> RenderResult<Arc<FilterInstance>> {
        let descriptor = self
            .registry
            .descriptor(filter_type)
            .expect("every filter type is cataloged");
        let renderer =
            self.registry
                .create_renderer(filter_type, self.gpu.clone(), Arc::clone(&self.params))?;
        Ok(Arc::new(FilterInstance::new(
            descriptor,
            Arc::clone(&self.params),
            renderer,
        )))
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_engines_do_not_share_state() {
        let a = Engine::with_memory_settings();
        let b = Engine::with_memory_settings();

        let id = a.registry().descriptor(FilterType::Sepia).unwrap().id;
        a.params().set_field(
            &id,
            crate::params::InputField::SepiaToneLevel,
            crate::params::ParamValue::Double(0.25),
        );

        assert!(a
            .params()
            .has_field(&id, crate::params::InputField::SepiaToneLevel));
        assert!(!b
            .params()
            .has_field(&id, crate::params::InputField::SepiaToneLevel));
    }

    #[test]
    fn test_create_filter_yields_uninitialized_instance() {
        let engine = Engine::with_memory_settings();
        let instance = engine.create_filter(FilterType::Noir).unwrap();
        assert!(!instance.initialized());
        assert_eq!(instance.filter_type(), FilterType::Noir);
    }
}
