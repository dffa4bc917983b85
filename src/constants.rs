// SPDX-License-Identifier: GPL-3.0-only

//! Engine-wide constants and defaults

/// Default number of output surfaces pre-allocated by a resource pool
pub const DEFAULT_BUFFER_COUNT_HINT: usize = 3;

/// Upper bound on surfaces kept on a pool's free list (multiplier on the hint)
pub const POOL_FREE_LIST_FACTOR: usize = 2;

/// Largest frame dimension a resource pool will accept
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Compute shader workgroup size (16x16 threads per workgroup)
pub const WORKGROUP_SIZE: u32 = 16;

/// Canvas size used by `generate()` when no frame format has been seen yet
pub const DEFAULT_GENERATOR_WIDTH: u32 = 512;
pub const DEFAULT_GENERATOR_HEIGHT: u32 = 512;

/// Maximum star count for a filter rating
pub const MAX_RATING_STARS: u8 = 5;

/// Number of bins in the luminance histogram operator
pub const HISTOGRAM_BINS: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_size_is_power_of_two() {
        assert!(WORKGROUP_SIZE.is_power_of_two());
    }

    #[test]
    fn test_default_hint_nonzero() {
        assert!(DEFAULT_BUFFER_COUNT_HINT > 0);
    }
}
