// SPDX-License-Identifier: GPL-3.0-only

//! Parameter field identifiers and value types
//!
//! Fields are shared across filters: the same `Radius` field keys the
//! Gaussian blur sigma and the vignette falloff, disambiguated by the
//! filter UUID half of the storage key.

use serde::{Deserialize, Serialize};

/// Identifies one settable parameter of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputField {
    Command,
    RAdjustment,
    GAdjustment,
    BAdjustment,
    InputContrast,
    InputHue,
    InputThreshold,
    EdgeIntensity,
    Center,
    Width,
    Angle,
    Radius,
    BlockWidth,
    BlockHeight,
    WindowSize,
    MirroringDirection,
    HorizontalSide,
    GridX,
    GridY,
    GridColor,
    GridBackground,
    Color0,
    Color1,
    HighlightColor,
    InvertRed,
    InvertGreen,
    InvertBlue,
    SolarizeThreshold,
    SolarizeIfGreater,
    SepiaToneLevel,
}

impl InputField {
    /// Stable name used in storage keys and export metadata
    pub fn key(&self) -> String {
        format!("{:?}", self)
    }
}

/// Expected data type for a parameter field
///
/// `Normal` is a double nominally clamped to 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    Double,
    Int,
    Bool,
    Str,
    Point,
    Color,
    Vector,
    Normal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_is_stable() {
        assert_eq!(InputField::SolarizeThreshold.key(), "SolarizeThreshold");
        assert_eq!(InputField::GridX.key(), "GridX");
    }
}
