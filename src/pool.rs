// SPDX-License-Identifier: GPL-3.0-only

//! Format-matched output surface pools
//!
//! A pool is created from one exact [`FrameFormat`] and is only ever valid
//! for that format: a format change tears the whole pool down and builds a
//! new one. Handing out a surface from a stale pool would give the frame
//! sink mis-sized buffers, so partial reuse is structurally impossible here.

use std::sync::Mutex;

use tracing::debug;

use crate::constants::{MAX_FRAME_DIMENSION, POOL_FREE_LIST_FACTOR};
use crate::errors::{RenderError, RenderResult};
use crate::frame::{ColorPrimaries, FrameFormat};
use crate::gpu::TextureCache;

/// A reusable pool of output surfaces sized and encoded for one frame format
///
/// Also owns the color space derived from the format and, for GPU-backed
/// filters, the texture cache bound to the same device allocation lifetime.
pub struct ResourcePool {
    format: FrameFormat,
    color_space: ColorPrimaries,
    surface_len: usize,
    free: Mutex<Vec<Vec<u8>>>,
    max_free: usize,
    texture_cache: Mutex<Option<TextureCache>>,
}

impl ResourcePool {
    /// Create a pool for `format`, pre-allocating `buffer_count_hint`
    /// output surfaces
    pub fn new(format: FrameFormat, buffer_count_hint: usize) -> RenderResult<Self> {
        if format.width == 0 || format.height == 0 {
            return Err(RenderError::Allocation(format!(
                "cannot build a pool for zero-sized format {}",
                format
            )));
        }
        if format.width > MAX_FRAME_DIMENSION || format.height > MAX_FRAME_DIMENSION {
            return Err(RenderError::Allocation(format!(
                "format {} exceeds the {} pixel dimension limit",
                format, MAX_FRAME_DIMENSION
            )));
        }

        // Output surfaces are always canonical RGBA regardless of the
        // input encoding.
        let surface_len = format.as_rgba().buffer_len();
        let color_space = format.primaries;

        let mut free = Vec::with_capacity(buffer_count_hint);
        for _ in 0..buffer_count_hint {
            free.push(vec![0u8; surface_len]);
        }

        debug!(
            format = %format,
            surfaces = buffer_count_hint,
            surface_bytes = surface_len,
            "Resource pool created"
        );

        Ok(Self {
            format,
            color_space,
            surface_len,
            free: Mutex::new(free),
            max_free: buffer_count_hint.max(1) * POOL_FREE_LIST_FACTOR,
            texture_cache: Mutex::new(None),
        })
    }

    /// The exact format this pool was built for
    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub fn color_space(&self) -> ColorPrimaries {
        self.color_space
    }

    /// Byte length of the RGBA surfaces this pool hands out
    pub fn surface_len(&self) -> usize {
        self.surface_len
    }

    /// Take an output surface, reusing a recycled one when available
    pub fn acquire(&self) -> Vec<u8> {
        let mut free = self.free.lock().expect("pool free list poisoned");
        match free.pop() {
            Some(mut buf) => {
                buf.clear();
                buf.resize(self.surface_len, 0);
                buf
            }
            None => vec![0u8; self.surface_len],
        }
    }

    /// Return a surface for reuse
    ///
    /// Surfaces whose capacity no longer matches the pool format are
    /// dropped; the free list is bounded so a burst cannot pin memory.
    pub fn recycle(&self, buf: Vec<u8>) {
        if buf.capacity() < self.surface_len {
            return;
        }
        let mut free = self.free.lock().expect("pool free list poisoned");
        if free.len() < self.max_free {
            free.push(buf);
        }
    }

    /// Number of surfaces currently idle on the free list
    pub fn idle_surfaces(&self) -> usize {
        self.free.lock().expect("pool free list poisoned").len()
    }

    /// Run `f` with this pool's texture cache slot
    ///
    /// The cache is created lazily by the first compute dispatch and dies
    /// with the pool, which ties GPU object lifetime to the format.
    pub fn with_texture_cache<R>(&self, f: impl FnOnce(&mut Option<TextureCache>) -> R) -> R {
        let mut slot = self.texture_cache.lock().expect("texture cache poisoned");
        f(&mut slot)
    }
}

impl std::fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("format", &self.format)
            .field("color_space", &self.color_space)
            .field("idle_surfaces", &self.idle_surfaces())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelEncoding;

    fn format_1080p() -> FrameFormat {
        FrameFormat::new(1920, 1080, PixelEncoding::Rgba8)
    }

    #[test]
    fn test_preallocates_hint_surfaces() {
        let pool = ResourcePool::new(format_1080p(), 3).unwrap();
        assert_eq!(pool.idle_surfaces(), 3);
        assert_eq!(pool.surface_len(), 1920 * 1080 * 4);
    }

    #[test]
    fn test_acquire_and_recycle() {
        let pool = ResourcePool::new(FrameFormat::new(4, 4, PixelEncoding::Rgba8), 1).unwrap();
        let buf = pool.acquire();
        assert_eq!(buf.len(), 64);
        assert_eq!(pool.idle_surfaces(), 0);
        pool.recycle(buf);
        assert_eq!(pool.idle_surfaces(), 1);
    }

    #[test]
    fn test_recycle_rejects_mismatched_capacity() {
        let pool = ResourcePool::new(FrameFormat::new(4, 4, PixelEncoding::Rgba8), 0).unwrap();
        pool.recycle(vec![0u8; 8]);
        assert_eq!(pool.idle_surfaces(), 0);
    }

    #[test]
    fn test_zero_sized_format_fails() {
        let err = ResourcePool::new(FrameFormat::new(0, 1080, PixelEncoding::Rgba8), 3)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Allocation(_)));
    }

    #[test]
    fn test_oversized_format_fails() {
        let err = ResourcePool::new(
            FrameFormat::new(MAX_FRAME_DIMENSION + 1, 16, PixelEncoding::Rgba8),
            1,
        )
        .err()
        .unwrap();
        assert!(matches!(err, RenderError::Allocation(_)));
    }

    #[test]
    fn test_nv12_input_pools_rgba_output() {
        // Output surfaces are canonical RGBA even for subsampled input
        let pool = ResourcePool::new(FrameFormat::new(4, 4, PixelEncoding::Nv12), 1).unwrap();
        assert_eq!(pool.surface_len(), 64);
    }
}
