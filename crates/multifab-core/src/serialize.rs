//! Save and load of a factory's persistent state.
//!
//! Persistent state is a string-keyed compound of [`TagValue`]s, the same
//! shape a host save format stores per tile. Loading is lenient: unknown
//! keys, wrongly typed values and indices beyond this factory's process
//! count are ignored, and out-of-range values are clamped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::factory::Factory;
use crate::fixed::Fixed64;
use crate::item::ItemStack;
use crate::recipe::RecipeLookup;
use crate::tier::{MAX_UPGRADES, Upgrades};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a factory save blob.
pub const SAVE_MAGIC: u32 = 0xFAB0_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

pub const KEY_SORTING: &str = "sorting";
pub const KEY_ENERGY: &str = "energy";
pub const KEY_EXTRA: &str = "extra";
pub const KEY_SPEED_UPGRADES: &str = "speedUpgrades";
pub const KEY_ENERGY_UPGRADES: &str = "energyUpgrades";

pub fn progress_key(process: usize) -> String {
    format!("progress{process}")
}

pub fn input_key(process: usize) -> String {
    format!("input{process}")
}

pub fn output_key(process: usize) -> String {
    format!("output{process}")
}

pub fn secondary_output_key(process: usize) -> String {
    format!("secondaryOutput{process}")
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SAVE_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("save from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Persistent data
// ---------------------------------------------------------------------------

/// A single persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagValue {
    Int(i64),
    Bool(bool),
    Energy(Fixed64),
    Stack(ItemStack),
}

/// String-keyed persistent state of one factory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryData {
    pub entries: BTreeMap<String, TagValue>,
}

impl FactoryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: TagValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.entries.get(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            TagValue::Int(v) => Some(*v),
            other => {
                warn!(key, value = ?other, "expected an integer tag");
                None
            }
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            TagValue::Bool(v) => Some(*v),
            other => {
                warn!(key, value = ?other, "expected a boolean tag");
                None
            }
        }
    }

    pub fn get_energy(&self, key: &str) -> Option<Fixed64> {
        match self.entries.get(key)? {
            TagValue::Energy(v) => Some(*v),
            other => {
                warn!(key, value = ?other, "expected an energy tag");
                None
            }
        }
    }

    pub fn get_stack(&self, key: &str) -> Option<&ItemStack> {
        match self.entries.get(key)? {
            TagValue::Stack(v) => Some(v),
            other => {
                warn!(key, value = ?other, "expected an item stack tag");
                None
            }
        }
    }
}

/// Header prepended to every save blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
}

impl SaveHeader {
    pub fn new() -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SAVE_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveBlob {
    header: SaveHeader,
    data: FactoryData,
}

/// Clamp a persisted integer into `[0, max]`, logging when it was out of range.
fn clamp_persisted(key: &str, value: i64, max: u64) -> u64 {
    let clamped = value.clamp(0, i64::try_from(max).unwrap_or(i64::MAX)) as u64;
    if clamped as i64 != value {
        warn!(key, value, clamped, "persisted value out of range");
    }
    clamped
}

// ---------------------------------------------------------------------------
// Factory save / load
// ---------------------------------------------------------------------------

impl<R: RecipeLookup> Factory<R> {
    /// Capture the persistent state.
    pub fn save_data(&self) -> FactoryData {
        let mut data = FactoryData::new();
        data.put(KEY_SORTING, TagValue::Bool(self.sort.is_enabled()));
        data.put(KEY_ENERGY, TagValue::Energy(self.energy.stored()));
        data.put(KEY_SPEED_UPGRADES, TagValue::Int(i64::from(self.upgrades.speed)));
        data.put(KEY_ENERGY_UPGRADES, TagValue::Int(i64::from(self.upgrades.energy)));
        if let Some(stack) = self.extra.as_ref().and_then(|s| s.stack()) {
            data.put(KEY_EXTRA, TagValue::Stack(stack.clone()));
        }
        for process in &self.processes {
            let i = process.index;
            data.put(progress_key(i), TagValue::Int(process.progress as i64));
            if let Some(stack) = process.input.stack() {
                data.put(input_key(i), TagValue::Stack(stack.clone()));
            }
            if let Some(stack) = process.output.stack() {
                data.put(output_key(i), TagValue::Stack(stack.clone()));
            }
            if let Some(stack) = process.secondary_output.as_ref().and_then(|s| s.stack()) {
                data.put(secondary_output_key(i), TagValue::Stack(stack.clone()));
            }
        }
        data
    }

    /// Restore persistent state. Never fails: bad values are clamped or
    /// defaulted.
    pub fn load_data(&mut self, data: &FactoryData) {
        let upgrade_count = |key: &str| {
            let value = data.get_int(key).unwrap_or(0);
            clamp_persisted(key, value, u64::from(MAX_UPGRADES)) as u8
        };
        self.set_upgrades(Upgrades {
            speed: upgrade_count(KEY_SPEED_UPGRADES),
            energy: upgrade_count(KEY_ENERGY_UPGRADES),
        });

        if let Some(sorting) = data.get_bool(KEY_SORTING) {
            self.sort.set_enabled(sorting);
        }
        if let Some(energy) = data.get_energy(KEY_ENERGY) {
            if energy < Fixed64::ZERO || energy > self.energy.capacity() {
                warn!(energy = %energy, "persisted energy out of range");
            }
            self.energy.set_stored(energy);
        }

        if let Some(slot) = self.extra.as_mut() {
            slot.set_stack(data.get_stack(KEY_EXTRA).cloned());
        }

        let ticks_required = self.ticks_required;
        for process in &mut self.processes {
            let i = process.index;
            let key = progress_key(i);
            process.progress = data
                .get_int(&key)
                .map_or(0, |v| clamp_persisted(&key, v, ticks_required));
            process.input.set_stack(data.get_stack(&input_key(i)).cloned());
            process.output.set_stack(data.get_stack(&output_key(i)).cloned());
            if let Some(slot) = process.secondary_output.as_mut() {
                slot.set_stack(data.get_stack(&secondary_output_key(i)).cloned());
            }
            process.cached = None;
            process.active = false;
        }
        self.sort.mark_needed();
        self.publish_snapshot();
    }

    /// Encode the persistent state into a versioned binary blob.
    pub fn save(&self) -> Result<Vec<u8>, SerializeError> {
        let blob = SaveBlob {
            header: SaveHeader::new(),
            data: self.save_data(),
        };
        bitcode::serialize(&blob).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Decode a blob produced by [`Factory::save`] and restore it.
    ///
    /// Only an undecodable blob or a wrong header is an error; the state
    /// inside is applied leniently via [`Factory::load_data`].
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), DeserializeError> {
        let blob: SaveBlob =
            bitcode::deserialize(bytes).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        blob.header.validate()?;
        self.load_data(&blob.data);
        Ok(())
    }
}
