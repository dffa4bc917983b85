// SPDX-License-Identifier: GPL-3.0-only

//! Declarative image-operator graphs
//!
//! Graph filters assemble a short chain of built-in operators per call from
//! their current parameter values, then hand the chain to [`GraphBackend`]
//! for execution over canonical RGBA surfaces. The backend itself is
//! stateless apart from a reusable scratch buffer.

use crate::errors::{RenderError, RenderResult};
use crate::frame::FrameBuffer;
use crate::render::RenderResources;

/// One built-in operator in a filter's chain
#[derive(Debug, Clone)]
pub enum ImageOp {
    /// Replace the canvas with a solid color
    SolidColor([f32; 4]),
    /// Replace the canvas with a linear gradient between two colors;
    /// points are in normalized 0..1 coordinates
    LinearGradient {
        start: (f32, f32),
        end: (f32, f32),
        color0: [f32; 4],
        color1: [f32; 4],
    },
    /// Weighted channel mix to gray
    GrayscaleWeights([f32; 3]),
    /// Classic sepia tone, `level` 0..1 blends with the original
    SepiaTone { level: f32 },
    /// Contrast about mid-gray
    Contrast { amount: f32 },
    /// Saturation scale about luminance
    Saturation { amount: f32 },
    /// Rotate hue by `radians`
    HueRotate { radians: f32 },
    /// Map luminance onto a two-color ramp
    GradientMap { color0: [f32; 4], color1: [f32; 4] },
    /// Darken toward the edges; radii are normalized distances from center
    RadialShade {
        center: (f32, f32),
        inner: f32,
        outer: f32,
    },
    /// Cut a region out of the canvas (changes canvas dimensions)
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    FlipHorizontal,
    /// Render `ops` against the original source, then draw the result over
    /// the canvas at `origin`
    Composite { ops: Vec<ImageOp>, origin: (u32, u32) },
    /// Transfer-function conversion applied per channel
    ColorConvert(ColorConversion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorConversion {
    SrgbToLinear,
    LinearToSrgb,
}

/// Executes operator chains; reuses one scratch buffer across calls
#[derive(Default)]
pub struct GraphBackend {
    scratch: Vec<u8>,
}

/// A canvas the chain mutates in place
struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GraphBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run an operator chain over a canonical RGBA source
    ///
    /// The output surface comes from the instance's pool when its size
    /// matches the final canvas.
    pub fn run(
        &mut self,
        ops: &[ImageOp],
        src: &FrameBuffer,
        resources: &RenderResources,
    ) -> RenderResult<FrameBuffer> {
        let mut canvas = Canvas {
            width: src.width(),
            height: src.height(),
            data: {
                let mut buf = resources.acquire_output(src.data().len());
                buf.copy_from_slice(src.data());
                buf
            },
        };

        for op in ops {
            self.apply(op, &mut canvas, src)?;
        }

        FrameBuffer::from_rgba(canvas.width, canvas.height, canvas.data)
    }

    fn apply(&mut self, op: &ImageOp, canvas: &mut Canvas, src: &FrameBuffer) -> RenderResult<()> {
        match op {
            ImageOp::SolidColor(color) => {
                let px = encode(*color);
                for out in canvas.data.chunks_exact_mut(4) {
                    out.copy_from_slice(&px);
                }
            }
            ImageOp::LinearGradient {
                start,
                end,
                color0,
                color1,
            } => {
                let (dx, dy) = (end.0 - start.0, end.1 - start.1);
                let len_sq = (dx * dx + dy * dy).max(1e-6);
                let (w, h) = (canvas.width as f32, canvas.height as f32);
                for row in 0..canvas.height {
                    for col in 0..canvas.width {
                        let tx = (col as f32 + 0.5) / w;
                        let ty = (row as f32 + 0.5) / h;
                        let t = (((tx - start.0) * dx + (ty - start.1) * dy) / len_sq)
                            .clamp(0.0, 1.0);
                        let px = encode(mix(*color0, *color1, t));
                        let idx = ((row * canvas.width + col) * 4) as usize;
                        canvas.data[idx..idx + 4].copy_from_slice(&px);
                    }
                }
            }
            ImageOp::GrayscaleWeights(weights) => {
                let [wr, wg, wb] = *weights;
                map_pixels(&mut canvas.data, |[r, g, b, a]| {
                    let gray = (r * wr + g * wg + b * wb).clamp(0.0, 1.0);
                    [gray, gray, gray, a]
                });
            }
            ImageOp::SepiaTone { level } => {
                let level = level.clamp(0.0, 1.0);
                map_pixels(&mut canvas.data, |[r, g, b, a]| {
                    let sr = (r * 0.393 + g * 0.769 + b * 0.189).min(1.0);
                    let sg = (r * 0.349 + g * 0.686 + b * 0.168).min(1.0);
                    let sb = (r * 0.272 + g * 0.534 + b * 0.131).min(1.0);
                    [
                        r + (sr - r) * level,
                        g + (sg - g) * level,
                        b + (sb - b) * level,
                        a,
                    ]
                });
            }
            ImageOp::Contrast { amount } => {
                let amount = *amount;
                map_pixels(&mut canvas.data, |[r, g, b, a]| {
                    [
                        ((r - 0.5) * amount + 0.5).clamp(0.0, 1.0),
                        ((g - 0.5) * amount + 0.5).clamp(0.0, 1.0),
                        ((b - 0.5) * amount + 0.5).clamp(0.0, 1.0),
                        a,
                    ]
                });
            }
            ImageOp::Saturation { amount } => {
                let amount = *amount;
                map_pixels(&mut canvas.data, |[r, g, b, a]| {
                    let luma = luminance(r, g, b);
                    [
                        (luma + (r - luma) * amount).clamp(0.0, 1.0),
                        (luma + (g - luma) * amount).clamp(0.0, 1.0),
                        (luma + (b - luma) * amount).clamp(0.0, 1.0),
                        a,
                    ]
                });
            }
            ImageOp::HueRotate { radians } => {
                // Rotation about the gray axis in RGB space
                let (sin, cos) = radians.sin_cos();
                let third = 1.0 / 3.0;
                let rt3 = (1.0f32 / 3.0).sqrt();
                let m = [
                    cos + (1.0 - cos) * third,
                    third * (1.0 - cos) - rt3 * sin,
                    third * (1.0 - cos) + rt3 * sin,
                ];
                map_pixels(&mut canvas.data, |[r, g, b, a]| {
                    [
                        (r * m[0] + g * m[1] + b * m[2]).clamp(0.0, 1.0),
                        (r * m[2] + g * m[0] + b * m[1]).clamp(0.0, 1.0),
                        (r * m[1] + g * m[2] + b * m[0]).clamp(0.0, 1.0),
                        a,
                    ]
                });
            }
            ImageOp::GradientMap { color0, color1 } => {
                let (c0, c1) = (*color0, *color1);
                map_pixels(&mut canvas.data, |[r, g, b, a]| {
                    let mut px = mix(c0, c1, luminance(r, g, b));
                    px[3] = a;
                    px
                });
            }
            ImageOp::RadialShade {
                center,
                inner,
                outer,
            } => {
                let (w, h) = (canvas.width as f32, canvas.height as f32);
                let (inner, outer) = (*inner, (*outer).max(*inner + 1e-4));
                for row in 0..canvas.height {
                    for col in 0..canvas.width {
                        let dx = (col as f32 + 0.5) / w - center.0;
                        let dy = (row as f32 + 0.5) / h - center.1;
                        let dist = (dx * dx + dy * dy).sqrt();
                        let shade = 1.0 - smoothstep(inner, outer, dist);
                        let idx = ((row * canvas.width + col) * 4) as usize;
                        for ch in 0..3 {
                            let v = canvas.data[idx + ch] as f32 / 255.0 * shade;
                            canvas.data[idx + ch] = (v * 255.0).round() as u8;
                        }
                    }
                }
            }
            ImageOp::Crop {
                x,
                y,
                width,
                height,
            } => {
                if x + width > canvas.width || y + height > canvas.height {
                    return Err(RenderError::Conversion(format!(
                        "crop {}x{}+{}+{} exceeds canvas {}x{}",
                        width, height, x, y, canvas.width, canvas.height
                    )));
                }
                self.scratch.clear();
                self.scratch.reserve((width * height * 4) as usize);
                for row in *y..y + height {
                    let start = ((row * canvas.width + x) * 4) as usize;
                    self.scratch
                        .extend_from_slice(&canvas.data[start..start + (width * 4) as usize]);
                }
                canvas.width = *width;
                canvas.height = *height;
                canvas.data.clear();
                canvas.data.extend_from_slice(&self.scratch);
            }
            ImageOp::FlipHorizontal => {
                let row_len = (canvas.width * 4) as usize;
                for row in canvas.data.chunks_exact_mut(row_len) {
                    let pixels = canvas.width as usize;
                    for col in 0..pixels / 2 {
                        let left = col * 4;
                        let right = (pixels - 1 - col) * 4;
                        for ch in 0..4 {
                            row.swap(left + ch, right + ch);
                        }
                    }
                }
            }
            ImageOp::Composite { ops, origin } => {
                // The nested chain runs against the original source, on a
                // fresh backend so the shared scratch is not clobbered.
                let top = GraphBackend::new().run(ops, src, &RenderResources::new())?;
                let (ox, oy) = *origin;
                for row in 0..top.height().min(canvas.height.saturating_sub(oy)) {
                    for col in 0..top.width().min(canvas.width.saturating_sub(ox)) {
                        let s = ((row * top.width() + col) * 4) as usize;
                        let d = (((row + oy) * canvas.width + (col + ox)) * 4) as usize;
                        canvas.data[d..d + 4].copy_from_slice(&top.data()[s..s + 4]);
                    }
                }
            }
            ImageOp::ColorConvert(conversion) => {
                let conversion = *conversion;
                map_pixels(&mut canvas.data, |[r, g, b, a]| match conversion {
                    ColorConversion::SrgbToLinear => {
                        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b), a]
                    }
                    ColorConversion::LinearToSrgb => {
                        [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b), a]
                    }
                });
            }
        }
        Ok(())
    }
}

/// Apply a per-pixel transform in f32 space
fn map_pixels(data: &mut [u8], f: impl Fn([f32; 4]) -> [f32; 4]) {
    for px in data.chunks_exact_mut(4) {
        let rgba = [
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        ];
        px.copy_from_slice(&encode(f(rgba)));
    }
}

#[inline]
fn encode(rgba: [f32; 4]) -> [u8; 4] {
    [
        (rgba[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgba[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgba[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgba[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

#[inline]
fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Rec. 601 luminance
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(v: f32) -> f32 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_frame(width: u32, height: u32, px: [u8; 4]) -> FrameBuffer {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&px);
        }
        FrameBuffer::from_rgba(width, height, data).unwrap()
    }

    #[test]
    fn test_grayscale_weights_equalize_channels() {
        let src = uniform_frame(4, 4, [200, 100, 50, 255]);
        let out = GraphBackend::new()
            .run(
                &[ImageOp::GrayscaleWeights([0.299, 0.587, 0.114])],
                &src,
                &RenderResources::new(),
            )
            .unwrap();
        for px in out.data().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_crop_changes_dimensions() {
        let src = uniform_frame(8, 4, [10, 20, 30, 255]);
        let out = GraphBackend::new()
            .run(
                &[ImageOp::Crop {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                }],
                &src,
                &RenderResources::new(),
            )
            .unwrap();
        assert_eq!(out.width(), 4);
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn test_crop_out_of_bounds_fails() {
        let src = uniform_frame(4, 4, [0, 0, 0, 255]);
        let result = GraphBackend::new().run(
            &[ImageOp::Crop {
                x: 2,
                y: 0,
                width: 4,
                height: 4,
            }],
            &src,
            &RenderResources::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_mirror_chain_reflects_left_half() {
        // left half red, right half blue; mirroring left onto right makes
        // the whole canvas red
        let mut data = Vec::new();
        for _row in 0..2 {
            for col in 0..4 {
                if col < 2 {
                    data.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    data.extend_from_slice(&[0, 0, 255, 255]);
                }
            }
        }
        let src = FrameBuffer::from_rgba(4, 2, data).unwrap();
        let out = GraphBackend::new()
            .run(
                &[ImageOp::Composite {
                    ops: vec![
                        ImageOp::Crop {
                            x: 0,
                            y: 0,
                            width: 2,
                            height: 2,
                        },
                        ImageOp::FlipHorizontal,
                    ],
                    origin: (2, 0),
                }],
                &src,
                &RenderResources::new(),
            )
            .unwrap();
        assert_eq!(out.width(), 4);
        for px in out.data().chunks_exact(4) {
            assert_eq!(&px[..3], &[255, 0, 0]);
        }
    }

    #[test]
    fn test_gradient_map_endpoints() {
        let black = uniform_frame(1, 1, [0, 0, 0, 255]);
        let out = GraphBackend::new()
            .run(
                &[ImageOp::GradientMap {
                    color0: [0.1, 0.1, 0.4, 1.0],
                    color1: [1.0, 0.9, 0.5, 1.0],
                }],
                &black,
                &RenderResources::new(),
            )
            .unwrap();
        let px = &out.data()[..4];
        assert_eq!(px, &[26, 26, 102, 255]);
    }

    #[test]
    fn test_color_convert_round_trip() {
        let src = uniform_frame(2, 2, [180, 90, 45, 255]);
        let out = GraphBackend::new()
            .run(
                &[
                    ImageOp::ColorConvert(ColorConversion::SrgbToLinear),
                    ImageOp::ColorConvert(ColorConversion::LinearToSrgb),
                ],
                &src,
                &RenderResources::new(),
            )
            .unwrap();
        for (a, b) in src.data().iter().zip(out.data().iter()) {
            assert!((*a as i16 - *b as i16).abs() <= 1);
        }
    }
}
