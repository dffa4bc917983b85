// SPDX-License-Identifier: GPL-3.0-only

//! WGSL kernel sources for the custom-compute backend
//!
//! Every kernel shares one binding layout: input texture at 0, output
//! storage buffer at 1, parameter uniform at 2, entry point `main`.
//! Image kernels write packed RGBA words; measurement kernels write raw
//! records.

/// Resolve a kernel name to its WGSL source
///
/// Unknown names surface as a configuration error at filter construction.
pub fn kernel_source(name: &str) -> Option<&'static str> {
    match name {
        "grayscale" => Some(include_str!("grayscale.wgsl")),
        "color_invert" => Some(include_str!("color_invert.wgsl")),
        "solarize" => Some(include_str!("solarize.wgsl")),
        "pixellate" => Some(include_str!("pixellate.wgsl")),
        "checkerboard" => Some(include_str!("checkerboard.wgsl")),
        "block_mean" => Some(include_str!("block_mean.wgsl")),
        "pixel_count" => Some(include_str!("pixel_count.wgsl")),
        _ => None,
    }
}

/// Names of every shipped kernel, for validation sweeps
pub const KERNEL_NAMES: &[&str] = &[
    "grayscale",
    "color_invert",
    "solarize",
    "pixellate",
    "checkerboard",
    "block_mean",
    "pixel_count",
];
