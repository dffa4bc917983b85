// SPDX-License-Identifier: GPL-3.0-only

//! Fixed, library-optimized image operators
//!
//! These operators need only a source surface and a small parameter struct:
//! no kernel compilation, no operator graph. Separable blur comes from the
//! `image` crate's optimized implementation; the edge detector, windowed
//! median, and histogram accumulator are the engine's own fixed operators.

use crate::constants::HISTOGRAM_BINS;
use crate::errors::{RenderError, RenderResult};
use crate::frame::FrameBuffer;

/// The fixed operator a specialized filter invokes
#[derive(Debug, Clone, Copy)]
pub enum SpecializedOp {
    /// Separable Gaussian blur with the given sigma
    GaussianBlur { sigma: f32 },
    /// Sobel edge detection on luminance; `intensity` scales the response
    Sobel { intensity: f32 },
    /// Windowed median per channel; `window` is the half-width
    Median { window: u32 },
}

/// Run a fixed operator over a canonical RGBA source
pub fn run(op: SpecializedOp, src: &FrameBuffer) -> RenderResult<FrameBuffer> {
    let (width, height) = (src.width(), src.height());
    let out = match op {
        SpecializedOp::GaussianBlur { sigma } => {
            let img = src.to_image()?;
            let blurred = image::imageops::blur(&img, sigma.max(0.01));
            blurred.into_raw()
        }
        SpecializedOp::Sobel { intensity } => sobel(src.data(), width, height, intensity),
        SpecializedOp::Median { window } => median(src.data(), width, height, window.max(1)),
    };
    FrameBuffer::from_rgba(width, height, out)
}

/// Sample luminance with edge clamping
#[inline]
fn luma_at(data: &[u8], width: u32, height: u32, x: i64, y: i64) -> f32 {
    let x = x.clamp(0, width as i64 - 1) as usize;
    let y = y.clamp(0, height as i64 - 1) as usize;
    let idx = (y * width as usize + x) * 4;
    let r = data[idx] as f32 / 255.0;
    let g = data[idx + 1] as f32 / 255.0;
    let b = data[idx + 2] as f32 / 255.0;
    0.299 * r + 0.587 * g + 0.114 * b
}

fn sobel(data: &[u8], width: u32, height: u32, intensity: f32) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    for row in 0..height as i64 {
        for col in 0..width as i64 {
            let tl = luma_at(data, width, height, col - 1, row - 1);
            let tm = luma_at(data, width, height, col, row - 1);
            let tr = luma_at(data, width, height, col + 1, row - 1);
            let ml = luma_at(data, width, height, col - 1, row);
            let mr = luma_at(data, width, height, col + 1, row);
            let bl = luma_at(data, width, height, col - 1, row + 1);
            let bm = luma_at(data, width, height, col, row + 1);
            let br = luma_at(data, width, height, col + 1, row + 1);

            let gx = -tl - 2.0 * ml - bl + tr + 2.0 * mr + br;
            let gy = -tl - 2.0 * tm - tr + bl + 2.0 * bm + br;
            let edge = ((gx * gx + gy * gy).sqrt() * intensity).clamp(0.0, 1.0);

            let idx = ((row * width as i64 + col) * 4) as usize;
            let level = (edge * 255.0).round() as u8;
            out[idx] = level;
            out[idx + 1] = level;
            out[idx + 2] = level;
            out[idx + 3] = data[idx + 3];
        }
    }
    out
}

fn median(data: &[u8], width: u32, height: u32, window: u32) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    let w = width as i64;
    let h = height as i64;
    let half = window as i64;
    let mut samples: Vec<u8> = Vec::with_capacity(((2 * half + 1) * (2 * half + 1)) as usize);
    for row in 0..h {
        for col in 0..w {
            let idx = ((row * w + col) * 4) as usize;
            for ch in 0..3 {
                samples.clear();
                for dy in -half..=half {
                    for dx in -half..=half {
                        let sx = (col + dx).clamp(0, w - 1) as usize;
                        let sy = (row + dy).clamp(0, h - 1) as usize;
                        samples.push(data[(sy * w as usize + sx) * 4 + ch]);
                    }
                }
                samples.sort_unstable();
                out[idx + ch] = samples[samples.len() / 2];
            }
            out[idx + 3] = data[idx + 3];
        }
    }
    out
}

/// Histogram-derived brightness summary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrightnessSummary {
    /// Average luminance 0..1
    pub mean: f32,
    /// Approximate median luminance 0..1
    pub median: f32,
    /// 5th percentile (shadow level)
    pub percentile_5: f32,
    /// 95th percentile (highlight level)
    pub percentile_95: f32,
}

/// Accumulate a 256-bin luminance histogram and its summary metrics
pub fn luminance_histogram(src: &FrameBuffer) -> RenderResult<(Vec<u64>, BrightnessSummary)> {
    if src.data().len() % 4 != 0 {
        return Err(RenderError::Conversion(
            "histogram input must be RGBA".into(),
        ));
    }
    let mut bins = vec![0u64; HISTOGRAM_BINS];
    let mut sum = 0.0f64;
    let mut total = 0u64;
    for px in src.data().chunks_exact(4) {
        let r = px[0] as f32 / 255.0;
        let g = px[1] as f32 / 255.0;
        let b = px[2] as f32 / 255.0;
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        let bin = ((luma * 255.0).round() as usize).min(HISTOGRAM_BINS - 1);
        bins[bin] += 1;
        sum += luma as f64;
        total += 1;
    }

    if total == 0 {
        return Ok((bins, BrightnessSummary::default()));
    }

    let percentile = |fraction: f64| -> f32 {
        let target = (total as f64 * fraction).ceil() as u64;
        let mut seen = 0u64;
        for (bin, &count) in bins.iter().enumerate() {
            seen += count;
            if seen >= target {
                return bin as f32 / 255.0;
            }
        }
        1.0
    };

    let summary = BrightnessSummary {
        mean: (sum / total as f64) as f32,
        median: percentile(0.5),
        percentile_5: percentile(0.05),
        percentile_95: percentile(0.95),
    };
    Ok((bins, summary))
}
