// SPDX-License-Identifier: GPL-3.0-only

//! Filter identity and capability metadata

use uuid::Uuid;

/// Every filter the engine can instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    PassThrough,
    Sepia,
    Noir,
    HueAdjust,
    FalseColor,
    Vignette,
    Mirror,
    LinearGradient,
    Grayscale,
    ColorInverter,
    Solarize,
    Pixellate,
    Checkerboard,
    BlockMean,
    PixelCounter,
    GaussianBlur,
    Sobel,
    Median,
    Histogram,
}

/// Which underlying processing technology implements a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Chain of built-in image operators assembled per call
    DeclarativeGraph,
    /// Custom compute kernel compiled once at construction
    CustomCompute,
    /// Fixed, library-optimized image operator
    SpecializedOp,
}

/// A filter's declared input/output capability
///
/// Pure generators are output-only; measurement filters are input-only and
/// produce derived numbers instead of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ports {
    pub input: bool,
    pub output: bool,
}

impl Ports {
    pub const BOTH: Ports = Ports {
        input: true,
        output: true,
    };
    pub const OUTPUT_ONLY: Ports = Ports {
        input: false,
        output: true,
    };
    pub const INPUT_ONLY: Ports = Ports {
        input: true,
        output: false,
    };
}

/// Where a filter may be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterTarget {
    LiveView,
    Video,
    Still,
}

/// Logical groups of filters for selector UIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterGroup {
    Standard,
    Colors,
    Gray,
    Effects,
    Tiles,
    Generators,
    Measurement,
}

/// Immutable identity and capability record for one filter
///
/// Built once at registry bootstrap and never destroyed. Only the rating
/// (kept separately in the registry) is mutable at runtime.
#[derive(Debug, Clone, Copy)]
pub struct FilterDescriptor {
    pub filter_type: FilterType,
    /// Stable across sessions; used to restore the last selected filter
    pub id: Uuid,
    pub title: &'static str,
    /// Settings panel the UI should present for this filter
    pub settings_panel: &'static str,
    pub kernel: FilterKind,
    pub ports: Ports,
    pub targets: &'static [FilterTarget],
    pub group: FilterGroup,
}

impl FilterDescriptor {
    pub fn supports_target(&self, target: FilterTarget) -> bool {
        self.targets.contains(&target)
    }
}

/// The common target set for interactive filters
pub const ALL_TARGETS: &[FilterTarget] = &[
    FilterTarget::LiveView,
    FilterTarget::Video,
    FilterTarget::Still,
];

/// Targets for measurement filters, which never produce an exportable image
pub const LIVE_AND_VIDEO: &[FilterTarget] = &[FilterTarget::LiveView, FilterTarget::Video];
