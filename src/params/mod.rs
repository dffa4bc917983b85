// SPDX-License-Identifier: GPL-3.0-only

//! Typed, keyed filter settings plus render statistics
//!
//! The store is an explicitly constructed context object shared by the
//! engine, its filters, and the settings UI. Values persist through a
//! [`SettingsStore`] (the external key-value store; persistence mechanics
//! are out of engine scope) with a read-through cache in front of it.
//!
//! `get_*` accessors never write: an unset field yields the caller's
//! default without materializing an entry. Only `set_field` persists.

mod fields;
mod value;

pub use fields::{InputField, InputType};
pub use value::ParamValue;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

/// The external persistent settings store the engine delegates to
///
/// Implementations must be safe to call from the capture and UI threads
/// simultaneously.
pub trait SettingsStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory settings store, the default and the test double
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("settings poisoned").get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("settings poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().expect("settings poisoned").remove(key);
    }
}

/// Running render-call totals for one (filter, path) pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderAccumulator {
    /// Number of completed render calls
    pub count: u64,
    /// Total wall-clock time across those calls
    pub cumulative: Duration,
}

/// Typed parameter storage and render-statistics accumulation
pub struct ParameterStore {
    store: Box<dyn SettingsStore>,
    cache: Mutex<HashMap<String, ParamValue>>,
    stats: Mutex<HashMap<(Uuid, bool), RenderAccumulator>>,
}

impl ParameterStore {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
        }
    }

    /// Store backed only by process memory
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Storage key for a (filter, field) pair
    pub fn storage_name(filter_id: &Uuid, field: InputField) -> String {
        format!("{}_{}", filter_id, field.key())
    }

    /// True if a value has actually been stored for the field
    ///
    /// Reading a field with `get_*` never creates an entry, so this reports
    /// exactly what `set_field` has written.
    pub fn has_field(&self, filter_id: &Uuid, field: InputField) -> bool {
        let key = Self::storage_name(filter_id, field);
        if self.cache.lock().expect("cache poisoned").contains_key(&key) {
            return true;
        }
        self.store.read(&key).is_some()
    }

    /// Drop every cached value, forcing re-reads from the backing store
    pub fn clear_cache(&self) {
        self.cache.lock().expect("cache poisoned").clear();
    }

    /// Persist a field value and refresh the cache
    pub fn set_field(&self, filter_id: &Uuid, field: InputField, value: ParamValue) {
        let key = Self::storage_name(filter_id, field);
        self.store.write(&key, &value.encode());
        self.cache.lock().expect("cache poisoned").insert(key, value);
    }

    /// Remove a stored field value
    pub fn clear_field(&self, filter_id: &Uuid, field: InputField) {
        let key = Self::storage_name(filter_id, field);
        self.store.remove(&key);
        self.cache.lock().expect("cache poisoned").remove(&key);
    }

    /// Fetch a field decoded as `of_type`, without touching defaults
    fn get_field(&self, filter_id: &Uuid, field: InputField, of_type: InputType) -> Option<ParamValue> {
        let key = Self::storage_name(filter_id, field);
        if let Some(hit) = self.cache.lock().expect("cache poisoned").get(&key) {
            return Some(hit.clone());
        }
        let raw = self.store.read(&key)?;
        match ParamValue::decode(&raw, of_type) {
            Some(value) => {
                self.cache
                    .lock()
                    .expect("cache poisoned")
                    .insert(key, value.clone());
                Some(value)
            }
            None => {
                warn!(key = %key, raw = %raw, ?of_type, "Stored parameter failed to decode");
                None
            }
        }
    }

    /// Stored value decoded as `of_type`, with no default substitution
    ///
    /// Used by export hooks that need to distinguish "set" from "default".
    pub fn stored_value(
        &self,
        filter_id: &Uuid,
        field: InputField,
        of_type: InputType,
    ) -> Option<ParamValue> {
        self.get_field(filter_id, field, of_type)
    }

    pub fn get_double(&self, filter_id: &Uuid, field: InputField, default: f64) -> f64 {
        match self.get_field(filter_id, field, InputType::Double) {
            Some(ParamValue::Double(v)) => v,
            Some(ParamValue::Int(v)) => v as f64,
            _ => default,
        }
    }

    /// Double clamped to 0.0..=1.0
    pub fn get_normal(&self, filter_id: &Uuid, field: InputField, default: f64) -> f64 {
        self.get_double(filter_id, field, default).clamp(0.0, 1.0)
    }

    pub fn get_int(&self, filter_id: &Uuid, field: InputField, default: i64) -> i64 {
        match self.get_field(filter_id, field, InputType::Int) {
            Some(ParamValue::Int(v)) => v,
            _ => default,
        }
    }

    pub fn get_bool(&self, filter_id: &Uuid, field: InputField, default: bool) -> bool {
        match self.get_field(filter_id, field, InputType::Bool) {
            Some(ParamValue::Bool(v)) => v,
            _ => default,
        }
    }

    pub fn get_string(&self, filter_id: &Uuid, field: InputField, default: &str) -> String {
        match self.get_field(filter_id, field, InputType::Str) {
            Some(ParamValue::Str(v)) => v,
            _ => default.to_string(),
        }
    }

    pub fn get_point(&self, filter_id: &Uuid, field: InputField, default: (f64, f64)) -> (f64, f64) {
        match self.get_field(filter_id, field, InputType::Point) {
            Some(ParamValue::Point(x, y)) => (x, y),
            _ => default,
        }
    }

    pub fn get_color(&self, filter_id: &Uuid, field: InputField, default: [f32; 4]) -> [f32; 4] {
        match self.get_field(filter_id, field, InputType::Color) {
            Some(ParamValue::Color(c)) => c,
            _ => default,
        }
    }

    pub fn get_vector(&self, filter_id: &Uuid, field: InputField, default: &[f64]) -> Vec<f64> {
        match self.get_field(filter_id, field, InputType::Vector) {
            Some(ParamValue::Vector(v)) => v,
            _ => default.to_vec(),
        }
    }

    /// Add one call and its duration to a filter's running totals
    ///
    /// Written from the capture callback thread (live) and the UI thread
    /// (stills); the mutex serializes both against UI reads.
    pub fn update_render_accumulator(&self, duration: Duration, filter_id: &Uuid, is_still: bool) {
        let mut stats = self.stats.lock().expect("stats poisoned");
        let entry = stats.entry((*filter_id, is_still)).or_default();
        entry.count += 1;
        entry.cumulative += duration;
    }

    /// Reset one accumulator to (0, 0)
    pub fn reset_accumulator(&self, filter_id: &Uuid, is_still: bool) {
        let mut stats = self.stats.lock().expect("stats poisoned");
        stats.insert((*filter_id, is_still), RenderAccumulator::default());
    }

    /// Current totals for one (filter, path) pair
    pub fn render_statistics(&self, filter_id: &Uuid, is_still: bool) -> RenderAccumulator {
        self.stats
            .lock()
            .expect("stats poisoned")
            .get(&(*filter_id, is_still))
            .copied()
            .unwrap_or_default()
    }

    /// Snapshot of every non-empty accumulator, for the performance readout
    pub fn dump_render_data(&self) -> Vec<(Uuid, bool, RenderAccumulator)> {
        let stats = self.stats.lock().expect("stats poisoned");
        let mut rows: Vec<_> = stats
            .iter()
            .filter(|(_, acc)| acc.count > 0)
            .map(|(&(id, is_still), &acc)| (id, is_still, acc))
            .collect();
        rows.sort_by_key(|(id, is_still, _)| (*id, *is_still));
        rows
    }
}
