// SPDX-License-Identifier: GPL-3.0-only

//! Concrete filter implementations
//!
//! One module per filter, each binding a descriptor to one backend. The
//! registry instantiates them through [`crate::registry::FilterRegistry`].

pub mod block_mean;
pub mod checkerboard;
pub mod color_inverter;
pub mod false_color;
pub mod gaussian_blur;
pub mod grayscale;
pub mod histogram;
pub mod hue_adjust;
pub mod linear_gradient;
pub mod median;
pub mod mirror;
pub mod noir;
pub mod pass_through;
pub mod pixel_counter;
pub mod pixellate;
pub mod sepia;
pub mod sobel;
pub mod solarize;
pub mod vignette;

use crate::registry::FilterDescriptor;

/// Every shipped filter descriptor, in catalog order
pub fn all_descriptors() -> &'static [&'static FilterDescriptor] {
    static ALL: &[&FilterDescriptor] = &[
        &pass_through::DESCRIPTOR,
        &sepia::DESCRIPTOR,
        &noir::DESCRIPTOR,
        &hue_adjust::DESCRIPTOR,
        &false_color::DESCRIPTOR,
        &vignette::DESCRIPTOR,
        &mirror::DESCRIPTOR,
        &linear_gradient::DESCRIPTOR,
        &grayscale::DESCRIPTOR,
        &color_inverter::DESCRIPTOR,
        &solarize::DESCRIPTOR,
        &pixellate::DESCRIPTOR,
        &checkerboard::DESCRIPTOR,
        &block_mean::DESCRIPTOR,
        &pixel_counter::DESCRIPTOR,
        &gaussian_blur::DESCRIPTOR,
        &sobel::DESCRIPTOR,
        &median::DESCRIPTOR,
        &histogram::DESCRIPTOR,
    ];
    ALL
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptor_ids_unique() {
        let mut ids = HashSet::new();
        let mut titles = HashSet::new();
        for descriptor in all_descriptors() {
            assert!(ids.insert(descriptor.id), "duplicate id {}", descriptor.id);
            assert!(
                titles.insert(descriptor.title),
                "duplicate title {}",
                descriptor.title
            );
        }
    }

    #[test]
    fn test_port_capability_consistency() {
        for descriptor in all_descriptors() {
            // a filter with neither port would be inert
            assert!(descriptor.ports.input || descriptor.ports.output, "{}", descriptor.title);
        }
    }
}
