//! Event data model — the resolved, time-stamped output of evaluation.
//!
//! An [`Event`] is one of a closed set of variants. Events are immutable once
//! produced and are appended to instrument timelines in evaluation order.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::beat::Beat;

/// One numbered occurrence of a named instrument (e.g. the second violin).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct InstrumentInstance {
    pub name: String,
    pub number: u32,
}

impl InstrumentInstance {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

impl fmt::Display for InstrumentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.number)
    }
}

impl From<InstrumentInstance> for String {
    fn from(instance: InstrumentInstance) -> String {
        instance.to_string()
    }
}

/// A sounded note.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// Start position on the score's time axis.
    pub offset: Beat,
    /// Instrument instances playing this note.
    pub instruments: BTreeSet<InstrumentInstance>,
    /// Volume fraction (0.0–1.0).
    pub volume: f64,
    /// Panning fraction (0.0 = left, 1.0 = right).
    pub panning: f64,
    /// Frequency in Hz.
    pub pitch: f64,
    /// Sounded length in milliseconds, after quantization.
    pub duration: f64,
}

/// A silent span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rest {
    pub offset: Beat,
    /// Length in milliseconds at the tempo in effect.
    pub duration: f64,
}

/// A performance attribute taking a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub offset: Beat,
    /// Canonical attribute name.
    pub attribute: String,
    pub value: f64,
}

/// Notes that start together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chord {
    pub offset: Beat,
    pub notes: Vec<Note>,
}

/// A single event on an instrument timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Note(Note),
    Rest(Rest),
    AttributeChange(AttributeChange),
    Chord(Chord),
}

impl Event {
    /// Where this event sits on the time axis.
    pub fn offset(&self) -> Beat {
        match self {
            Event::Note(n) => n.offset,
            Event::Rest(r) => r.offset,
            Event::AttributeChange(a) => a.offset,
            Event::Chord(c) => c.offset,
        }
    }

    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Event::Note(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_rest(&self) -> Option<&Rest> {
        match self {
            Event::Rest(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_attribute_change(&self) -> Option<&AttributeChange> {
        match self {
            Event::AttributeChange(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_chord(&self) -> Option<&Chord> {
        match self {
            Event::Chord(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_at(beats: f64) -> Note {
        Note {
            offset: Beat::from_beats_f64(beats),
            instruments: BTreeSet::from([InstrumentInstance::new("piano", 1)]),
            volume: 1.0,
            panning: 0.5,
            pitch: 440.0,
            duration: 450.0,
        }
    }

    #[test]
    fn instance_display() {
        assert_eq!(InstrumentInstance::new("violin", 2).to_string(), "violin#2");
    }

    #[test]
    fn instances_order_by_name_then_number() {
        let mut set = BTreeSet::new();
        set.insert(InstrumentInstance::new("violin", 2));
        set.insert(InstrumentInstance::new("piano", 1));
        set.insert(InstrumentInstance::new("violin", 1));
        let ordered: Vec<String> = set.iter().map(|i| i.to_string()).collect();
        assert_eq!(ordered, vec!["piano#1", "violin#1", "violin#2"]);
    }

    #[test]
    fn offset_of_each_variant() {
        let note = Event::Note(note_at(1.0));
        let rest = Event::Rest(Rest {
            offset: Beat::from_beats(2),
            duration: 500.0,
        });
        let change = Event::AttributeChange(AttributeChange {
            offset: Beat::from_beats(3),
            attribute: "tempo".into(),
            value: 90.0,
        });
        let chord = Event::Chord(Chord {
            offset: Beat::from_beats(4),
            notes: vec![note_at(4.0)],
        });
        assert_eq!(note.offset(), Beat::from_beats(1));
        assert_eq!(rest.offset(), Beat::from_beats(2));
        assert_eq!(change.offset(), Beat::from_beats(3));
        assert_eq!(chord.offset(), Beat::from_beats(4));
    }

    #[test]
    fn accessors_match_variant() {
        let note = Event::Note(note_at(0.0));
        assert!(note.as_note().is_some());
        assert!(note.as_rest().is_none());
        assert!(note.as_chord().is_none());
        assert!(note.as_attribute_change().is_none());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Event::Note(note_at(0.5))).unwrap();
        assert_eq!(json["type"], "note");
        assert_eq!(json["offset"], 0.5);
        assert_eq!(json["instruments"][0], "piano#1");
    }
}
