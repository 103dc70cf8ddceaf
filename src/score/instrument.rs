//! Instrument references and the catalog of instruments a score may name.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How an instrument call names its instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentReference {
    /// Catalog name, or a nickname bound earlier in the score.
    pub name: String,
    /// Select this numbered instance directly.
    #[serde(default)]
    pub number: Option<u32>,
    /// Bind (or reuse) a nickname for the resolved instance.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Always spawn a new instance, even without a nickname.
    #[serde(default)]
    pub new_instance: bool,
}

impl InstrumentReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: None,
            nickname: None,
            new_instance: false,
        }
    }

    pub fn nicknamed(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn numbered(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    pub fn fresh(mut self) -> Self {
        self.new_instance = true;
        self
    }
}

/// Instruments that may be referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentCatalog {
    names: BTreeSet<String>,
}

impl InstrumentCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for InstrumentCatalog {
    fn default() -> Self {
        Self::new(default_instrument_names().iter().copied())
    }
}

/// General-MIDI style instrument names.
pub fn default_instrument_names() -> &'static [&'static str] {
    &[
        "piano",
        "electric-piano",
        "harpsichord",
        "celesta",
        "glockenspiel",
        "vibraphone",
        "marimba",
        "xylophone",
        "organ",
        "accordion",
        "harmonica",
        "acoustic-guitar",
        "electric-guitar",
        "acoustic-bass",
        "electric-bass",
        "violin",
        "viola",
        "cello",
        "contrabass",
        "harp",
        "timpani",
        "choir",
        "trumpet",
        "trombone",
        "tuba",
        "french-horn",
        "saxophone",
        "oboe",
        "bassoon",
        "clarinet",
        "piccolo",
        "flute",
        "recorder",
        "pan-flute",
        "sitar",
        "banjo",
        "shamisen",
        "koto",
        "kalimba",
        "bagpipes",
        "steel-drums",
        "percussion",
    ]
}
