// SPDX-License-Identifier: GPL-3.0-only
// Shared frame and surface types for the rendering engine

//! Frame formats and pixel surfaces
//!
//! Everything downstream of the frame source works on one canonical surface
//! kind: tightly packed 8-bit RGBA. Other encodings delivered by capture
//! pipelines (BGRA, NV12, grayscale) are normalized into RGBA before a
//! filter's backend runs.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{RenderError, RenderResult};

/// Pixel encoding of a frame delivered by a frame source
///
/// RGBA is the canonical format used throughout the engine after
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelEncoding {
    /// RGBA - 32-bit with alpha (4 bytes per pixel), canonical
    Rgba8,
    /// BGRA - 32-bit with alpha (B G R A byte order), common camera output
    Bgra8,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    Nv12,
    /// Gray8 - 8-bit grayscale, monochrome and IR cameras
    Gray8,
}

impl PixelEncoding {
    /// Average bytes per pixel (accounting for chroma subsampling)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::Rgba8 | Self::Bgra8 => 4.0,
            Self::Nv12 => 1.5,
            Self::Gray8 => 1.0,
        }
    }

    /// Check if this encoding requires a normalization pass before filtering
    pub fn needs_conversion(&self) -> bool {
        !matches!(self, Self::Rgba8)
    }
}

/// Color primaries attached to a frame format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorPrimaries {
    #[default]
    Srgb,
    DisplayP3,
}

/// Description of a video frame: dimensions plus pixel encoding
///
/// A change in any field invalidates every resource pool derived from the
/// previous format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
    pub encoding: PixelEncoding,
    pub primaries: ColorPrimaries,
}

impl FrameFormat {
    /// Create a format with sRGB primaries
    pub fn new(width: u32, height: u32, encoding: PixelEncoding) -> Self {
        Self {
            width,
            height,
            encoding,
            primaries: ColorPrimaries::Srgb,
        }
    }

    /// Canonical RGBA format with the same dimensions
    pub fn as_rgba(&self) -> Self {
        Self {
            encoding: PixelEncoding::Rgba8,
            ..self.clone()
        }
    }

    /// Expected byte length of a buffer holding one frame in this format
    pub fn buffer_len(&self) -> usize {
        let pixels = self.width as usize * self.height as usize;
        match self.encoding {
            PixelEncoding::Rgba8 | PixelEncoding::Bgra8 => pixels * 4,
            PixelEncoding::Nv12 => pixels + pixels / 2,
            PixelEncoding::Gray8 => pixels,
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {:?}", self.width, self.height, self.encoding)
    }
}

/// A single pixel surface
///
/// Data is reference counted so a frame can be handed to the display path
/// and an encoder without copying.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    format: FrameFormat,
    data: Arc<[u8]>,
}

impl FrameBuffer {
    /// Wrap raw bytes in a surface, validating the length against the format
    pub fn new(format: FrameFormat, data: Vec<u8>) -> RenderResult<Self> {
        if data.len() != format.buffer_len() {
            return Err(RenderError::Conversion(format!(
                "buffer length {} does not match format {} (expected {})",
                data.len(),
                format,
                format.buffer_len()
            )));
        }
        Ok(Self {
            format,
            data: Arc::from(data),
        })
    }

    /// Build a canonical RGBA surface from raw RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> RenderResult<Self> {
        Self::new(
            FrameFormat::new(width, height, PixelEncoding::Rgba8),
            data,
        )
    }

    /// Build a canonical surface from an `image` crate RGBA buffer
    pub fn from_image(image: &image::RgbaImage) -> Self {
        let format = FrameFormat::new(image.width(), image.height(), PixelEncoding::Rgba8);
        Self {
            format,
            data: Arc::from(image.as_raw().clone()),
        }
    }

    /// Convert a canonical surface into an `image` crate RGBA buffer
    pub fn to_image(&self) -> RenderResult<image::RgbaImage> {
        if self.format.encoding != PixelEncoding::Rgba8 {
            return Err(RenderError::Conversion(format!(
                "cannot view {} surface as RGBA image",
                self.format
            )));
        }
        image::RgbaImage::from_raw(self.format.width, self.format.height, self.data.to_vec())
            .ok_or_else(|| RenderError::Conversion("RGBA buffer size mismatch".into()))
    }

    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width
    }

    pub fn height(&self) -> u32 {
        self.format.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Normalize this surface to the canonical RGBA encoding
    ///
    /// Surfaces already in RGBA are returned as a cheap clone (shared data).
    pub fn normalize_to_rgba(&self) -> RenderResult<FrameBuffer> {
        match self.format.encoding {
            PixelEncoding::Rgba8 => Ok(self.clone()),
            PixelEncoding::Bgra8 => {
                let mut out = self.data.to_vec();
                for px in out.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                FrameBuffer::from_rgba(self.width(), self.height(), out)
            }
            PixelEncoding::Gray8 => {
                let mut out = Vec::with_capacity(self.data.len() * 4);
                for &y in self.data.iter() {
                    out.extend_from_slice(&[y, y, y, 255]);
                }
                FrameBuffer::from_rgba(self.width(), self.height(), out)
            }
            PixelEncoding::Nv12 => self.nv12_to_rgba(),
        }
    }

    fn nv12_to_rgba(&self) -> RenderResult<FrameBuffer> {
        let width = self.width() as usize;
        let height = self.height() as usize;
        if width % 2 != 0 || height % 2 != 0 {
            return Err(RenderError::Conversion(format!(
                "NV12 requires even dimensions, got {}",
                self.format
            )));
        }
        let y_size = width * height;
        let y_plane = &self.data[..y_size];
        let uv_plane = &self.data[y_size..];

        let mut out = vec![0u8; y_size * 4];
        for row in 0..height {
            for col in 0..width {
                let y_val = y_plane[row * width + col] as f32 / 255.0;
                let uv_idx = (row / 2) * width + (col / 2) * 2;
                let u_val = uv_plane.get(uv_idx).copied().unwrap_or(128) as f32 / 255.0 - 0.5;
                let v_val = uv_plane.get(uv_idx + 1).copied().unwrap_or(128) as f32 / 255.0 - 0.5;

                let (r, g, b) = yuv_to_rgb(y_val, u_val, v_val);
                let dst = (row * width + col) * 4;
                out[dst] = (r * 255.0) as u8;
                out[dst + 1] = (g * 255.0) as u8;
                out[dst + 2] = (b * 255.0) as u8;
                out[dst + 3] = 255;
            }
        }
        FrameBuffer::from_rgba(self.width() as u32, self.height() as u32, out)
    }
}

/// YUV to RGB conversion (BT.601)
#[inline]
pub(crate) fn yuv_to_rgb(y: f32, u: f32, v: f32) -> (f32, f32, f32) {
    let r = (y + 1.402 * v).clamp(0.0, 1.0);
    let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 1.0);
    let b = (y + 1.772 * u).clamp(0.0, 1.0);
    (r, g, b)
}
