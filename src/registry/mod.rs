// SPDX-License-Identifier: GPL-3.0-only

//! The static filter catalog
//!
//! Built once per engine as an explicit context object, never a process
//! global, so tests can run several independent engines side by side. The
//! catalog maps FilterType <-> UUID <-> title <-> settings panel <-> kernel
//! tag <-> ports <-> targets <-> group and owns the only mutable piece,
//! the per-filter ratings.

mod descriptor;
mod ratings;

pub use descriptor::{
    FilterDescriptor, FilterGroup, FilterKind, FilterTarget, FilterType, Ports, ALL_TARGETS,
    LIVE_AND_VIDEO,
};
pub use ratings::Rating;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;
use uuid::Uuid;

use crate::errors::RenderResult;
use crate::filters;
use crate::gpu::GpuContext;
use crate::params::ParameterStore;
use crate::render::Renderer;

/// Catalog of filter identity, capability, and rating metadata
pub struct FilterRegistry {
    descriptors: Vec<&'static FilterDescriptor>,
    by_id: HashMap<Uuid, FilterType>,
    by_type: HashMap<FilterType, &'static FilterDescriptor>,
    ratings: Mutex<HashMap<FilterType, Rating>>,
}

impl FilterRegistry {
    /// Build the catalog from the shipped filter set
    pub fn new() -> Self {
        let descriptors: Vec<&'static FilterDescriptor> = filters::all_descriptors().to_vec();
        let mut by_id = HashMap::new();
        let mut by_type = HashMap::new();
        let mut ratings = HashMap::new();
        for descriptor in &descriptors {
            by_id.insert(descriptor.id, descriptor.filter_type);
            by_type.insert(descriptor.filter_type, *descriptor);
            ratings.insert(descriptor.filter_type, Rating::default());
        }

        info!(filters = descriptors.len(), "Filter registry built");

        Self {
            descriptors,
            by_id,
            by_type,
            ratings: Mutex::new(ratings),
        }
    }

    /// All descriptors in catalog order
    pub fn descriptors(&self) -> &[&'static FilterDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, filter_type: FilterType) -> Option<&'static FilterDescriptor> {
        self.by_type.get(&filter_type).copied()
    }

    /// Resolve a stable UUID back to its filter type
    ///
    /// Identity is stable for the process lifetime, which is what lets the
    /// last-used filter be restored across sessions.
    pub fn filter_type_for(&self, id: &Uuid) -> Option<FilterType> {
        self.by_id.get(id).copied()
    }

    pub fn title(&self, filter_type: FilterType) -> Option<&'static str> {
        self.descriptor(filter_type).map(|d| d.title)
    }

    /// Descriptors in one selector-UI group, in catalog order
    pub fn descriptors_in_group(&self, group: FilterGroup) -> Vec<&'static FilterDescriptor> {
        self.descriptors
            .iter()
            .copied()
            .filter(|d| d.group == group)
            .collect()
    }

    /// Filters declaring support for a required target capability
    ///
    /// Used, for example, to offer only Still-capable filters when
    /// exporting a photo.
    pub fn filters_supporting(&self, target: FilterTarget) -> Vec<&'static FilterDescriptor> {
        self.descriptors
            .iter()
            .copied()
            .filter(|d| d.supports_target(target))
            .collect()
    }

    /// Construct a bare renderer for a filter type
    pub fn create_renderer(
        &self,
        filter_type: FilterType,
        gpu: Option<Arc<GpuContext>>,
        params: Arc<ParameterStore>,
    ) -> RenderResult<Box<dyn Renderer>> {
        let renderer: Box<dyn Renderer> = match filter_type {
            FilterType::PassThrough => Box::new(filters::pass_through::PassThrough::new(params)),
            FilterType::Sepia => Box::new(filters::sepia::Sepia::new(params)),
            FilterType::Noir => Box::new(filters::noir::Noir::new(params)),
            FilterType::HueAdjust => Box::new(filters::hue_adjust::HueAdjust::new(params)),
            FilterType::FalseColor => Box::new(filters::false_color::FalseColor::new(params)),
            FilterType::Vignette => Box::new(filters::vignette::Vignette::new(params)),
            FilterType::Mirror => Box::new(filters::mirror::Mirror::new(params)),
            FilterType::LinearGradient => {
                Box::new(filters::linear_gradient::LinearGradient::new(params))
            }
            FilterType::Grayscale => Box::new(filters::grayscale::Grayscale::new(gpu, params)?),
            FilterType::ColorInverter => {
                Box::new(filters::color_inverter::ColorInverter::new(gpu, params)?)
            }
            FilterType::Solarize => Box::new(filters::solarize::Solarize::new(gpu, params)?),
            FilterType::Pixellate => Box::new(filters::pixellate::Pixellate::new(gpu, params)?),
            FilterType::Checkerboard => {
                Box::new(filters::checkerboard::Checkerboard::new(gpu, params)?)
            }
            FilterType::BlockMean => Box::new(filters::block_mean::BlockMean::new(gpu, params)?),
            FilterType::PixelCounter => {
                Box::new(filters::pixel_counter::PixelCounter::new(gpu, params)?)
            }
            FilterType::GaussianBlur => {
                Box::new(filters::gaussian_blur::GaussianBlur::new(params))
            }
            FilterType::Sobel => Box::new(filters::sobel::Sobel::new(params)),
            FilterType::Median => Box::new(filters::median::Median::new(params)),
            FilterType::Histogram => Box::new(filters::histogram::Histogram::new(params)),
        };
        Ok(renderer)
    }

    /// Current rating for a filter
    pub fn rating(&self, filter_type: FilterType) -> Rating {
        self.ratings
            .lock()
            .expect("ratings poisoned")
            .get(&filter_type)
            .copied()
            .unwrap_or_default()
    }

    /// Replace a filter's rating; the only mutation after bootstrap
    pub fn set_rating(&self, filter_type: FilterType, rating: Rating) {
        self.ratings
            .lock()
            .expect("ratings poisoned")
            .insert(filter_type, rating);
    }

    /// Filters flagged as favorites
    pub fn favorites(&self) -> Vec<FilterType> {
        let ratings = self.ratings.lock().expect("ratings poisoned");
        let mut result: Vec<FilterType> = self
            .descriptors
            .iter()
            .filter(|d| {
                ratings
                    .get(&d.filter_type)
                    .map(|r| r.favorite())
                    .unwrap_or(false)
            })
            .map(|d| d.filter_type)
            .collect();
        result.dedup();
        result
    }

    /// Filters rated at least `stars`
    pub fn with_at_least_stars(&self, stars: u8) -> Vec<FilterType> {
        let ratings = self.ratings.lock().expect("ratings poisoned");
        self.descriptors
            .iter()
            .filter(|d| {
                ratings
                    .get(&d.filter_type)
                    .map(|r| r.stars() >= stars)
                    .unwrap_or(false)
            })
            .map(|d| d.filter_type)
            .collect()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_lookup_is_stable() {
        let registry = FilterRegistry::new();
        let id = registry.descriptor(FilterType::Grayscale).unwrap().id;
        for _ in 0..3 {
            assert_eq!(registry.filter_type_for(&id), Some(FilterType::Grayscale));
        }
        assert_eq!(registry.filter_type_for(&Uuid::from_u128(1)), None);
    }

    #[test]
    fn test_group_and_target_queries() {
        let registry = FilterRegistry::new();

        let measurement = registry.descriptors_in_group(FilterGroup::Measurement);
        assert!(!measurement.is_empty());
        for descriptor in measurement {
            assert!(!descriptor.ports.output);
        }

        // measurement filters never offer Still export
        let still = registry.filters_supporting(FilterTarget::Still);
        assert!(still
            .iter()
            .all(|d| d.filter_type != FilterType::BlockMean));
        assert!(still.iter().any(|d| d.filter_type == FilterType::Grayscale));
    }

    #[test]
    fn test_ratings_mutate_and_query() {
        let registry = FilterRegistry::new();
        assert_eq!(registry.rating(FilterType::Noir).stars(), 0);

        registry.set_rating(FilterType::Noir, Rating::new(4, true));
        assert_eq!(registry.rating(FilterType::Noir).stars(), 4);
        assert!(registry.favorites().contains(&FilterType::Noir));
        assert!(registry
            .with_at_least_stars(3)
            .contains(&FilterType::Noir));
        assert!(!registry
            .with_at_least_stars(5)
            .contains(&FilterType::Noir));
    }

    #[test]
    fn test_every_type_constructs() {
        let registry = FilterRegistry::new();
        let params = Arc::new(ParameterStore::in_memory());
        for descriptor in registry.descriptors() {
            let renderer = registry
                .create_renderer(descriptor.filter_type, None, Arc::clone(&params))
                .unwrap();
            assert_eq!(renderer.filter_type(), descriptor.filter_type);
            assert!(!renderer.initialized());
        }
    }
}
