// SPDX-License-Identifier: GPL-3.0-only

//! Custom compute kernels behind the render contract
//!
//! A [`ComputeBackend`] binds one named WGSL kernel, compiled into a
//! pipeline once at construction. Per call it packs the filter's parameters
//! into a fixed-layout uniform (one binary copy), binds the source texture
//! and destination storage buffer from the owning path's texture cache, and
//! dispatches a 2D grid sized by dividing the surface dimensions by the
//! workgroup size, rounding up to cover partial tiles.
//!
//! When the engine found no GPU adapter, the same packed parameter bytes
//! drive the kernel's CPU reference implementation instead, so filters
//! behave identically with software rendering.

use std::sync::Arc;

use tracing::debug;

use crate::errors::{RenderError, RenderResult};
use crate::frame::FrameBuffer;
use crate::gpu::{compute_dispatch_size, read_buffer_async, GpuContext, TextureCache};
use crate::render::{RenderPath, RenderResources};
use crate::shaders;

/// CPU reference implementation of an image kernel
///
/// Receives the packed parameter bytes, the RGBA source, and the RGBA
/// destination (same dimensions).
pub type CpuImageKernel = fn(params: &[u8], src: &[u8], width: u32, height: u32, out: &mut [u8]);

/// CPU reference implementation of a measurement kernel
///
/// Writes raw result records into `out`, mirroring the GPU storage buffer
/// byte-for-byte.
pub type CpuQueryKernel = fn(params: &[u8], src: &[u8], width: u32, height: u32, out: &mut [u8]);

enum KernelRole {
    Image(CpuImageKernel),
    Query(CpuQueryKernel),
}

/// One compiled compute kernel binding, GPU-backed or CPU-reference
pub struct ComputeBackend {
    kernel_name: &'static str,
    role: KernelRole,
    gpu: Option<GpuBinding>,
    /// Texture cache for the independent still-image/generation path; the
    /// live path uses the cache owned by the instance's resource pool.
    image_cache: TextureCache,
}

struct GpuBinding {
    ctx: Arc<GpuContext>,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
}

impl ComputeBackend {
    /// Bind an image kernel
    pub fn for_image(
        kernel_name: &'static str,
        cpu: CpuImageKernel,
        gpu: Option<Arc<GpuContext>>,
        param_size: usize,
    ) -> RenderResult<Self> {
        Self::build(kernel_name, KernelRole::Image(cpu), gpu, param_size)
    }

    /// Bind a measurement kernel
    pub fn for_query(
        kernel_name: &'static str,
        cpu: CpuQueryKernel,
        gpu: Option<Arc<GpuContext>>,
        param_size: usize,
    ) -> RenderResult<Self> {
        Self::build(kernel_name, KernelRole::Query(cpu), gpu, param_size)
    }

    fn build(
        kernel_name: &'static str,
        role: KernelRole,
        gpu: Option<Arc<GpuContext>>,
        param_size: usize,
    ) -> RenderResult<Self> {
        // The named kernel must exist even on the CPU path; a typo here is
        // a configuration fault, not something to discover mid-stream.
        let source = shaders::kernel_source(kernel_name).ok_or_else(|| {
            RenderError::Configuration(format!("no compute kernel named {}", kernel_name))
        })?;

        let gpu = match gpu {
            Some(ctx) => Some(GpuBinding::compile(kernel_name, source, ctx, param_size)),
            None => None,
        };

        Ok(Self {
            kernel_name,
            role,
            gpu,
            image_cache: TextureCache::default(),
        })
    }

    /// True when this binding dispatches to the GPU
    pub fn is_gpu(&self) -> bool {
        self.gpu.is_some()
    }

    /// Drop the still-path texture cache
    pub fn release_image_cache(&mut self) {
        self.image_cache = TextureCache::default();
    }

    /// Run the image kernel over a canonical RGBA source
    pub fn run_image(
        &mut self,
        resources: &RenderResources,
        params: &[u8],
        src: &FrameBuffer,
        path: RenderPath,
    ) -> RenderResult<FrameBuffer> {
        let KernelRole::Image(cpu) = &self.role else {
            return Err(RenderError::Configuration(format!(
                "{} is a measurement kernel, not an image kernel",
                self.kernel_name
            )));
        };

        let (width, height) = (src.width(), src.height());
        let out_len = (width as usize) * (height as usize) * 4;

        let data = match &self.gpu {
            Some(gpu) => match path {
                // The live path's GPU objects live in the pool's cache so a
                // format change tears them down with the pool.
                RenderPath::Live => {
                    let pool = resources.live_pool()?;
                    pool.with_texture_cache(|slot| {
                        let cache = slot.get_or_insert_with(TextureCache::default);
                        gpu.dispatch_image(cache, params, src)
                    })?
                }
                RenderPath::Still => gpu.dispatch_image(&mut self.image_cache, params, src)?,
            },
            None => {
                let mut out = resources.acquire_output(out_len);
                cpu(params, src.data(), width, height, &mut out);
                out
            }
        };

        FrameBuffer::from_rgba(width, height, data)
    }

    /// Run the measurement kernel, returning raw record bytes
    ///
    /// `dispatch` is the 2D invocation grid in work items (pixels or
    /// blocks, kernel-dependent); the result buffer is zeroed before the
    /// kernel runs.
    pub fn run_query(
        &mut self,
        params: &[u8],
        src: &FrameBuffer,
        out_len: usize,
        dispatch: (u32, u32),
    ) -> RenderResult<Vec<u8>> {
        let KernelRole::Query(cpu) = &self.role else {
            return Err(RenderError::Configuration(format!(
                "{} is an image kernel, not a measurement kernel",
                self.kernel_name
            )));
        };

        match &self.gpu {
            Some(gpu) => gpu.dispatch_query(&mut self.image_cache, params, src, out_len, dispatch),
            None => {
                let mut out = vec![0u8; out_len];
                cpu(params, src.data(), src.width(), src.height(), &mut out);
                Ok(out)
            }
        }
    }
}

impl GpuBinding {
    /// Compile the kernel into a pipeline; done exactly once per binding
    fn compile(
        kernel_name: &str,
        source: &'static str,
        ctx: Arc<GpuContext>,
        param_size: usize,
    ) -> Self {
        debug!(kernel = kernel_name, "Compiling compute pipeline");

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kernel_name),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("filter_bind_group_layout"),
                    entries: &[
                        // Input texture
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        // Output storage buffer
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // Parameter uniform
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("filter_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel_name),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("filter_uniform_buffer"),
            size: param_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            ctx,
            pipeline,
            bind_group_layout,
            uniform_buffer,
        }
    }

    fn upload_source(&self, texture: &wgpu::Texture, src: &FrameBuffer) {
        self.ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            src.data(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(src.width() * 4),
                rows_per_image: Some(src.height()),
            },
            wgpu::Extent3d {
                width: src.width(),
                height: src.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    fn dispatch_image(
        &self,
        cache: &mut TextureCache,
        params: &[u8],
        src: &FrameBuffer,
    ) -> RenderResult<Vec<u8>> {
        let (width, height) = (src.width(), src.height());
        cache.ensure(&self.ctx.device, width, height);

        let input_texture = cache
            .input_texture
            .as_ref()
            .ok_or(RenderError::TransientResource)?;
        let output_buffer = cache
            .output_buffer
            .as_ref()
            .ok_or(RenderError::TransientResource)?;
        let staging_buffer = cache
            .staging_buffer
            .as_ref()
            .ok_or(RenderError::TransientResource)?;

        self.upload_source(input_texture, src);
        self.ctx.queue.write_buffer(&self.uniform_buffer, 0, params);

        let input_view = input_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("filter_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("filter_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("filter_compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(width),
                compute_dispatch_size(height),
                1,
            );
        }

        let buffer_size = (width as u64) * (height as u64) * 4;
        encoder.copy_buffer_to_buffer(output_buffer, 0, staging_buffer, 0, buffer_size);
        self.ctx.queue.submit(Some(encoder.finish()));

        pollster::block_on(read_buffer_async(&self.ctx.device, staging_buffer))
            .map_err(RenderError::Configuration)
    }

    fn dispatch_query(
        &self,
        cache: &mut TextureCache,
        params: &[u8],
        src: &FrameBuffer,
        out_len: usize,
        dispatch: (u32, u32),
    ) -> RenderResult<Vec<u8>> {
        let (width, height) = (src.width(), src.height());
        cache.ensure(&self.ctx.device, width, height);

        let input_texture = cache
            .input_texture
            .as_ref()
            .ok_or(RenderError::TransientResource)?;

        self.upload_source(input_texture, src);
        self.ctx.queue.write_buffer(&self.uniform_buffer, 0, params);

        // Record buffers are small and query-shaped, so they are created
        // per call rather than cached.
        let records_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("query_records_buffer"),
            size: out_len as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let staging_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("query_staging_buffer"),
            size: out_len as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        self.ctx
            .queue
            .write_buffer(&records_buffer, 0, &vec![0u8; out_len]);

        let input_view = input_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("query_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: records_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("query_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("query_compute_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(dispatch.0),
                compute_dispatch_size(dispatch.1),
                1,
            );
        }
        encoder.copy_buffer_to_buffer(&records_buffer, 0, &staging_buffer, 0, out_len as u64);
        self.ctx.queue.submit(Some(encoder.finish()));

        pollster::block_on(read_buffer_async(&self.ctx.device, &staging_buffer))
            .map_err(RenderError::Configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_image(_p: &[u8], src: &[u8], _w: u32, _h: u32, out: &mut [u8]) {
        out.copy_from_slice(src);
    }

    #[test]
    fn test_unknown_kernel_is_configuration_error() {
        let err = ComputeBackend::for_image("no_such_kernel", noop_image, None, 16)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Configuration(_)));
    }

    #[test]
    fn test_cpu_fallback_runs_reference_kernel() {
        let mut backend = ComputeBackend::for_image("grayscale", noop_image, None, 32).unwrap();
        assert!(!backend.is_gpu());

        let src = FrameBuffer::from_rgba(2, 2, vec![9u8; 16]).unwrap();
        let out = backend
            .run_image(
                &RenderResources::new(),
                &[0u8; 32],
                &src,
                RenderPath::Still,
            )
            .unwrap();
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_role_mismatch_rejected() {
        let mut backend = ComputeBackend::for_image("grayscale", noop_image, None, 32).unwrap();
        let src = FrameBuffer::from_rgba(2, 2, vec![0u8; 16]).unwrap();
        let err = backend.run_query(&[0u8; 32], &src, 16, (2, 2)).err().unwrap();
        assert!(matches!(err, RenderError::Configuration(_)));
    }
}
