// SPDX-License-Identifier: GPL-3.0-only

//! Typed parameter values and their string codec
//!
//! The persistent settings store only understands strings, so every value
//! round-trips through a compact text encoding: points as "x,y", colors as
//! "r,g,b,a", vectors as a comma list. The encoding is the storage format
//! contract with the external key-value store.

use serde::{Deserialize, Serialize};

use super::fields::InputType;

/// A typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Double(f64),
    Int(i64),
    Bool(bool),
    Str(String),
    /// 2D point (x, y)
    Point(f64, f64),
    /// RGBA color, each channel 0.0..=1.0
    Color([f32; 4]),
    /// Free-length numeric vector
    Vector(Vec<f64>),
}

impl ParamValue {
    /// The value's nominal input type
    ///
    /// `Normal` is indistinguishable from `Double` at the value level; the
    /// clamp is applied by the normal-typed accessors.
    pub fn input_type(&self) -> InputType {
        match self {
            ParamValue::Double(_) => InputType::Double,
            ParamValue::Int(_) => InputType::Int,
            ParamValue::Bool(_) => InputType::Bool,
            ParamValue::Str(_) => InputType::Str,
            ParamValue::Point(_, _) => InputType::Point,
            ParamValue::Color(_) => InputType::Color,
            ParamValue::Vector(_) => InputType::Vector,
        }
    }

    /// Encode for the string-keyed settings store
    pub fn encode(&self) -> String {
        match self {
            ParamValue::Double(v) => v.to_string(),
            ParamValue::Int(v) => v.to_string(),
            ParamValue::Bool(v) => v.to_string(),
            ParamValue::Str(v) => v.clone(),
            ParamValue::Point(x, y) => format!("{},{}", x, y),
            ParamValue::Color(c) => format!("{},{},{},{}", c[0], c[1], c[2], c[3]),
            ParamValue::Vector(v) => v
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Decode a stored string as the given type
    pub fn decode(raw: &str, of_type: InputType) -> Option<ParamValue> {
        match of_type {
            InputType::Double => raw.parse().ok().map(ParamValue::Double),
            InputType::Normal => raw
                .parse::<f64>()
                .ok()
                .map(|v| ParamValue::Double(v.clamp(0.0, 1.0))),
            InputType::Int => raw.parse().ok().map(ParamValue::Int),
            InputType::Bool => raw.parse().ok().map(ParamValue::Bool),
            InputType::Str => Some(ParamValue::Str(raw.to_string())),
            InputType::Point => {
                let parts: Vec<f64> = raw
                    .split(',')
                    .map(|p| p.trim().parse())
                    .collect::<Result<_, _>>()
                    .ok()?;
                if parts.len() != 2 {
                    return None;
                }
                Some(ParamValue::Point(parts[0], parts[1]))
            }
            InputType::Color => {
                let parts: Vec<f32> = raw
                    .split(',')
                    .map(|p| p.trim().parse())
                    .collect::<Result<_, _>>()
                    .ok()?;
                if parts.len() != 4 {
                    return None;
                }
                Some(ParamValue::Color([parts[0], parts[1], parts[2], parts[3]]))
            }
            InputType::Vector => {
                if raw.is_empty() {
                    return Some(ParamValue::Vector(Vec::new()));
                }
                let parts: Vec<f64> = raw
                    .split(',')
                    .map(|p| p.trim().parse())
                    .collect::<Result<_, _>>()
                    .ok()?;
                Some(ParamValue::Vector(parts))
            }
        }
    }
}
