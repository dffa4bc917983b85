// SPDX-License-Identifier: GPL-3.0-only

//! GPU device plumbing shared by the custom-compute backends
//!
//! Provides device/queue creation, dimension-cached texture/buffer
//! allocation, dispatch-size math, and async buffer readback. The engine
//! probes for a device once; compute filters either bind to it or fall back
//! to their CPU reference kernels.

use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::WORKGROUP_SIZE;

/// A compute device/queue pair shared by every custom-compute filter of one
/// engine
#[derive(Debug)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, etc.)
    pub backend: wgpu::Backend,
}

/// Create a wgpu device and queue for compute work.
///
/// # Arguments
///
/// * `label` - A label for the device (for debugging)
pub async fn create_compute_device(label: &str) -> Result<GpuContext, String> {
    info!(label = label, "Creating GPU device for compute");

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| "Failed to find suitable GPU adapter".to_string())?;

    let adapter_info = adapter.get_info();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        "GPU adapter selected for compute"
    );

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some(label),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )
        .await
        .map_err(|e| format!("Failed to create GPU device: {}", e))?;

    Ok(GpuContext {
        device: Arc::new(device),
        queue: Arc::new(queue),
        adapter_name: adapter_info.name,
        backend: adapter_info.backend,
    })
}

/// Cached resource dimensions - avoids reallocation when dimensions match
#[derive(Default, Clone, Copy, PartialEq, Debug)]
pub struct CachedDimensions {
    pub width: u32,
    pub height: u32,
}

impl CachedDimensions {
    /// Check if dimensions have changed and need update
    pub fn needs_update(&self, width: u32, height: u32) -> bool {
        self.width != width || self.height != height
    }

    /// Update cached dimensions
    pub fn update(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Check if dimensions are initialized (non-zero)
    pub fn is_initialized(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Calculate compute shader dispatch size (workgroups needed)
///
/// Rounds up so partial tiles at the right/bottom edges are covered.
#[inline]
pub fn compute_dispatch_size(dimension: u32) -> u32 {
    dimension.div_ceil(WORKGROUP_SIZE)
}

/// Per-format GPU objects for one compute filter binding
///
/// Holds the input texture, output storage buffer, and staging buffer for
/// one set of frame dimensions. Owned by a resource pool (live path) or by
/// the filter's image-path state, and torn down with its owner, so a cache
/// never outlives the format it was sized for.
#[derive(Default)]
pub struct TextureCache {
    dims: CachedDimensions,
    pub input_texture: Option<wgpu::Texture>,
    pub output_buffer: Option<wgpu::Buffer>,
    pub staging_buffer: Option<wgpu::Buffer>,
}

impl TextureCache {
    /// Ensure resources are allocated for the given dimensions
    pub fn ensure(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if !self.dims.needs_update(width, height) {
            return;
        }

        debug!(width, height, "Allocating compute texture cache");

        let buffer_size = (width as u64) * (height as u64) * 4;

        self.input_texture = Some(device.create_texture(&wgpu::TextureDescriptor {
            label: Some("filter_input_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }));

        self.output_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("filter_output_buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }));

        self.staging_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("filter_staging_buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        }));

        self.dims.update(width, height);
    }
}

/// Helper for async buffer readback (map, poll, read, unmap)
///
/// The common pattern used to read compute results back from GPU buffers.
pub async fn read_buffer_async(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
) -> Result<Vec<u8>, String> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    let _ = device.poll(wgpu::Maintain::Wait);

    receiver
        .await
        .map_err(|_| "Failed to receive buffer mapping".to_string())?
        .map_err(|e| format!("Failed to map buffer: {:?}", e))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_dimensions() {
        let mut dims = CachedDimensions::default();
        assert!(!dims.is_initialized());
        assert!(dims.needs_update(640, 480));

        dims.update(640, 480);
        assert!(dims.is_initialized());
        assert!(!dims.needs_update(640, 480));
        assert!(dims.needs_update(1280, 720));
    }

    #[test]
    fn test_compute_dispatch_size() {
        assert_eq!(compute_dispatch_size(640), 40);
        assert_eq!(compute_dispatch_size(641), 41);
        assert_eq!(compute_dispatch_size(16), 1);
        assert_eq!(compute_dispatch_size(1), 1);
    }

    #[test]
    fn test_create_compute_device() {
        // Requires a GPU, so it may be skipped in CI
        match pollster::block_on(create_compute_device("test_device")) {
            Ok(ctx) => {
                assert!(!ctx.adapter_name.is_empty());
            }
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
            }
        }
    }
}
