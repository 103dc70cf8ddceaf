//! Evaluated events — offsets, the event sum type, and per-instrument timelines.

pub mod beat;
pub mod timeline;
pub mod types;

pub use beat::{Beat, TICKS_PER_BEAT};
pub use timeline::Timeline;
pub use types::{AttributeChange, Chord, Event, InstrumentInstance, Note, Rest};
