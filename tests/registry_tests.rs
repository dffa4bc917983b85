// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the filter catalog

use prism::{Engine, FilterGroup, FilterKind, FilterTarget, FilterType, Rating};

#[test]
fn test_uuid_lookup_stable_across_calls() {
    let engine = Engine::with_memory_settings();
    let registry = engine.registry();
    let id = registry.descriptor(FilterType::Noir).unwrap().id;

    for _ in 0..10 {
        assert_eq!(registry.filter_type_for(&id), Some(FilterType::Noir));
    }

    // a second engine catalogs the same identities
    let other = Engine::with_memory_settings();
    assert_eq!(other.registry().filter_type_for(&id), Some(FilterType::Noir));
}

#[test]
fn test_catalog_covers_all_backend_kinds() {
    let engine = Engine::with_memory_settings();
    let descriptors = engine.registry().descriptors();

    for kind in [
        FilterKind::DeclarativeGraph,
        FilterKind::CustomCompute,
        FilterKind::SpecializedOp,
    ] {
        assert!(
            descriptors.iter().any(|d| d.kernel == kind),
            "no filter with kernel {:?}",
            kind
        );
    }
}

#[test]
fn test_groups_partition_for_selector_ui() {
    let engine = Engine::with_memory_settings();
    let registry = engine.registry();

    let mut grouped = 0;
    for group in [
        FilterGroup::Standard,
        FilterGroup::Colors,
        FilterGroup::Gray,
        FilterGroup::Effects,
        FilterGroup::Tiles,
        FilterGroup::Generators,
        FilterGroup::Measurement,
    ] {
        grouped += registry.descriptors_in_group(group).len();
    }
    assert_eq!(grouped, registry.descriptors().len());
}

#[test]
fn test_still_export_excludes_measurement_filters() {
    let engine = Engine::with_memory_settings();
    let still = engine.registry().filters_supporting(FilterTarget::Still);
    assert!(!still.is_empty());
    for descriptor in still {
        assert!(descriptor.ports.output, "{}", descriptor.title);
    }
}

#[test]
fn test_settings_panels_are_declared() {
    let engine = Engine::with_memory_settings();
    for descriptor in engine.registry().descriptors() {
        assert!(
            !descriptor.settings_panel.is_empty(),
            "{} has no settings panel",
            descriptor.title
        );
    }
}

#[test]
fn test_rating_is_the_only_mutable_metadata() {
    let engine = Engine::with_memory_settings();
    let registry = engine.registry();

    let before = registry.descriptor(FilterType::Sepia).unwrap();
    registry.set_rating(FilterType::Sepia, Rating::new(5, true));
    let after = registry.descriptor(FilterType::Sepia).unwrap();

    assert_eq!(before.id, after.id);
    assert_eq!(before.title, after.title);
    assert_eq!(registry.rating(FilterType::Sepia).stars(), 5);
    assert!(registry.rating(FilterType::Sepia).favorite());
}

#[test]
fn test_star_queries() {
    let engine = Engine::with_memory_settings();
    let registry = engine.registry();

    registry.set_rating(FilterType::Mirror, Rating::new(2, false));
    registry.set_rating(FilterType::Vignette, Rating::new(4, true));

    let at_least_two = registry.with_at_least_stars(2);
    assert!(at_least_two.contains(&FilterType::Mirror));
    assert!(at_least_two.contains(&FilterType::Vignette));

    let favorites = registry.favorites();
    assert_eq!(favorites, vec![FilterType::Vignette]);
}

#[test]
fn test_supported_fields_have_defaults() {
    let engine = Engine::with_memory_settings();
    for descriptor in engine.registry().descriptors() {
        let filter = engine.create_filter(descriptor.filter_type).unwrap();
        for field in filter.supported_fields() {
            assert!(
                filter.default_field_value(field).is_some(),
                "{} field {:?} has no declared default",
                descriptor.title,
                field
            );
        }
    }
}
