//! Instruction tree consumed by the evaluator.
//!
//! A parser (outside this crate) produces these. Grouping constructs nest
//! instructions; everything else is a leaf.

use serde::{Deserialize, Serialize};

use crate::attribute::RawValue;
use crate::state::DurationSpec;
use crate::theory::Accidental;

/// A note to sound at the current offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSpec {
    pub letter: char,
    #[serde(default)]
    pub accidentals: Vec<Accidental>,
    #[serde(default)]
    pub duration: Option<DurationSpec>,
    /// Sound the full duration (legato into the next note).
    #[serde(default)]
    pub slur: bool,
}

impl NoteSpec {
    pub fn new(letter: char) -> Self {
        Self {
            letter,
            accidentals: Vec::new(),
            duration: None,
            slur: false,
        }
    }

    /// Set an explicit note value, e.g. `4` for a quarter note.
    pub fn length(mut self, denominator: u32) -> Self {
        self.duration = Some(DurationSpec::note_length(denominator));
        self
    }

    pub fn duration(mut self, duration: DurationSpec) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn sharp(mut self) -> Self {
        self.accidentals.push(Accidental::Sharp);
        self
    }

    pub fn flat(mut self) -> Self {
        self.accidentals.push(Accidental::Flat);
        self
    }

    pub fn slurred(mut self) -> Self {
        self.slur = true;
        self
    }
}

/// A silence at the current offset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RestSpec {
    #[serde(default)]
    pub duration: Option<DurationSpec>,
}

impl RestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, denominator: u32) -> Self {
        self.duration = Some(DurationSpec::note_length(denominator));
        self
    }
}

/// One `name = value` attribute assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSetting {
    pub name: String,
    pub value: RawValue,
}

impl AttributeSetting {
    pub fn new(name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named voice inside a voice group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSpec {
    pub id: u32,
    pub instructions: Vec<Instruction>,
}

/// A single instruction in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Note(NoteSpec),
    Rest(RestSpec),
    SetAttribute(AttributeSetting),
    SetAttributes(Vec<AttributeSetting>),
    /// Members start together; the cursor resumes after the shortest.
    Chord(Vec<Instruction>),
    /// Parallel voices; the cursor resumes after the longest.
    Voices(Vec<VoiceSpec>),
    /// Remember the current offset under a name.
    Marker(String),
    /// Jump the cursor to a remembered offset.
    AtMarker(String),
}

impl Instruction {
    pub fn note(spec: NoteSpec) -> Self {
        Self::Note(spec)
    }

    pub fn rest(spec: RestSpec) -> Self {
        Self::Rest(spec)
    }

    pub fn set(name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        Self::SetAttribute(AttributeSetting::new(name, value))
    }

    /// Whether this is an attribute change, the only kind of instruction
    /// allowed before the first instrument call.
    pub fn is_attribute_change(&self) -> bool {
        matches!(self, Self::SetAttribute(_) | Self::SetAttributes(_))
    }
}
