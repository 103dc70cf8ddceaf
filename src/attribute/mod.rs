//! Attribute registry — named performance attributes, their aliases,
//! initial values, and input transforms.
//!
//! The registry is built once before evaluation and only read afterwards.
//! Current attribute values do not live here; they live in the
//! [`PerformanceState`](crate::state::PerformanceState) as
//! [`AttributeValues`], so independent score evaluations never share
//! mutable state.

pub mod transform;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

pub use transform::Transform;

pub const TEMPO: &str = "tempo";
pub const DURATION: &str = "duration";
pub const OCTAVE: &str = "octave";
pub const QUANTIZATION: &str = "quantization";
pub const VOLUME: &str = "volume";
pub const PANNING: &str = "panning";

/// An attribute input as written in the score: a number or a symbol such as `>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Symbol(String),
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Symbol(s.to_string())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Symbol(s) => write!(f, "'{s}'"),
        }
    }
}

/// A registered attribute.
#[derive(Clone)]
pub struct AttributeDefinition {
    pub name: String,
    pub aliases: Vec<String>,
    pub initial: f64,
    pub transform: Transform,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, initial: f64, transform: Transform) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            initial,
            transform,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Canonical name followed by every alias.
    fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Current value of every attribute, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeValues(BTreeMap<String, f64>);

impl AttributeValues {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Lookup table from attribute names and aliases to definitions.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    definitions: Vec<AttributeDefinition>,
    by_key: HashMap<String, usize>,
}

impl AttributeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in attribute table.
    ///
    /// | attribute    | aliases          | initial | transform  |
    /// |--------------|------------------|---------|------------|
    /// | tempo        |                  | 120     | positive   |
    /// | duration     |                  | 1 beat  | positive   |
    /// | octave       |                  | 4       | octave     |
    /// | quantization | quant, quantize  | 0.9     | percentage |
    /// | volume       | vol              | 1.0     | percentage |
    /// | panning      | pan              | 0.5     | percentage |
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for def in builtin_definitions() {
            registry.insert(def);
        }
        registry
    }

    /// Add a definition. Fails if its name or any alias is already taken.
    pub fn register(&mut self, definition: AttributeDefinition) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for key in definition.keys() {
            if self.by_key.contains_key(key) || seen.contains(&key) {
                return Err(EvalError::DuplicateAlias(key.to_string()));
            }
            seen.push(key);
        }
        self.insert(definition);
        Ok(())
    }

    fn insert(&mut self, definition: AttributeDefinition) {
        let idx = self.definitions.len();
        for key in definition.keys() {
            self.by_key.insert(key.to_string(), idx);
        }
        self.definitions.push(definition);
    }

    /// Look up a definition by canonical name or alias.
    pub fn resolve(&self, key: &str) -> Result<&AttributeDefinition> {
        self.by_key
            .get(key)
            .map(|&idx| &self.definitions[idx])
            .ok_or_else(|| EvalError::UnknownAttribute(key.to_string()))
    }

    /// Run an attribute's transform against `raw` and the stored value,
    /// store the result, and return `(canonical name, new value)`.
    pub fn apply(
        &self,
        key: &str,
        raw: &RawValue,
        values: &mut AttributeValues,
    ) -> Result<(String, f64)> {
        let def = self.resolve(key)?;
        let current = values.get(&def.name).unwrap_or(def.initial);
        let value = (def.transform)(def.name.as_str(), raw, current)?;
        values.set(def.name.clone(), value);
        Ok((def.name.clone(), value))
    }

    /// Replace an attribute's initial value, validated through its transform.
    pub fn with_initial(mut self, key: &str, raw: &RawValue) -> Result<Self> {
        let idx = *self
            .by_key
            .get(key)
            .ok_or_else(|| EvalError::UnknownAttribute(key.to_string()))?;
        let def = &mut self.definitions[idx];
        def.initial = (def.transform)(def.name.as_str(), raw, def.initial)?;
        Ok(self)
    }

    /// Fresh values for the start of a score.
    pub fn initial_values(&self) -> AttributeValues {
        let mut values = AttributeValues::default();
        for def in &self.definitions {
            values.set(def.name.clone(), def.initial);
        }
        values
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }
}

impl fmt::Debug for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

fn builtin_definitions() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::new(TEMPO, 120.0, transform::positive),
        AttributeDefinition::new(DURATION, 1.0, transform::positive),
        AttributeDefinition::new(OCTAVE, 4.0, transform::octave),
        AttributeDefinition::new(QUANTIZATION, 0.9, transform::percentage)
            .with_aliases(&["quant", "quantize"]),
        AttributeDefinition::new(VOLUME, 1.0, transform::percentage).with_aliases(&["vol"]),
        AttributeDefinition::new(PANNING, 0.5, transform::percentage).with_aliases(&["pan"]),
    ]
}
