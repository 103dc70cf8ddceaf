//! Per-instrument event storage.
//!
//! Events are kept in insertion order, which is evaluation order. Chords and
//! voices can interleave offsets, so renderers that need time order ask for
//! [`Timeline::chronological`], a stable sort that leaves simultaneous events
//! in the order they were produced.

use serde::Serialize;

use super::beat::Beat;
use super::types::{Event, Note};

/// An instrument's events in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    events: Vec<Event>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Append a batch of events, preserving their order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events ordered by offset. Ties keep insertion order.
    pub fn chronological(&self) -> Vec<&Event> {
        let mut ordered: Vec<&Event> = self.events.iter().collect();
        ordered.sort_by_key(|e| e.offset());
        ordered
    }

    /// Every sounded note, with chord members flattened in place.
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.events.iter().flat_map(|e| match e {
            Event::Note(n) => std::slice::from_ref(n).iter(),
            Event::Chord(c) => c.notes.iter(),
            Event::Rest(_) | Event::AttributeChange(_) => Default::default(),
        })
    }

    /// Latest start offset on the timeline, or zero when empty.
    pub fn last_offset(&self) -> Beat {
        self.events
            .iter()
            .map(Event::offset)
            .max()
            .unwrap_or(Beat::ZERO)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
