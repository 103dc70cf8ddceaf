//! Event evaluator — walks the instruction tree against one performance state.
//!
//! Each instruction reads and updates the shared [`PerformanceState`] and
//! appends the events it produces to the caller's output buffer. Grouping
//! constructs live in [`group`].

pub mod group;
pub mod instruction;

use std::collections::HashMap;
use std::sync::Arc;

use log::trace;

use crate::attribute::{AttributeRegistry, RawValue};
use crate::error::{EvalError, Result};
use crate::event::{AttributeChange, Beat, Event, Note, Rest};
use crate::state::PerformanceState;
use crate::theory;

pub use group::VoiceGroup;
pub use instruction::{AttributeSetting, Instruction, NoteSpec, RestSpec, VoiceSpec};

/// Evaluates instructions in source order.
pub struct Evaluator {
    registry: Arc<AttributeRegistry>,
    state: PerformanceState,
    markers: HashMap<String, f64>,
}

impl Evaluator {
    /// Create an evaluator with a fresh state drawn from `registry`.
    pub fn new(registry: Arc<AttributeRegistry>) -> Self {
        let state = PerformanceState::new(&registry);
        Self {
            registry,
            state,
            markers: HashMap::new(),
        }
    }

    pub fn state(&self) -> &PerformanceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PerformanceState {
        &mut self.state
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    /// Evaluate a sequence of instructions and return the events they produce.
    pub fn eval_all(&mut self, instructions: &[Instruction]) -> Result<Vec<Event>> {
        let mut out = Vec::new();
        for instruction in instructions {
            self.eval(instruction, &mut out)?;
        }
        Ok(out)
    }

    /// Evaluate one instruction, appending its events to `out`.
    pub fn eval(&mut self, instruction: &Instruction, out: &mut Vec<Event>) -> Result<()> {
        match instruction {
            Instruction::Note(spec) => out.push(self.note(spec)?),
            Instruction::Rest(spec) => out.push(self.rest(spec)?),
            Instruction::SetAttribute(setting) => {
                out.push(self.set_attribute(&setting.name, &setting.value)?)
            }
            Instruction::SetAttributes(settings) => out.extend(self.set_attributes(settings)?),
            Instruction::Chord(members) => out.extend(self.chord(members)?),
            Instruction::Voices(voices) => out.extend(self.voices(voices)?.into_events()),
            Instruction::Marker(name) => self.place_marker(name),
            Instruction::AtMarker(name) => self.jump_to_marker(name)?,
        }
        Ok(())
    }

    /// Sound a note at the current offset and advance past its full length.
    pub fn note(&mut self, spec: &NoteSpec) -> Result<Event> {
        let pitch = theory::pitch_frequency(spec.letter, &spec.accidentals, self.state.octave())?;
        let duration = self.state.resolve_duration(spec.duration.as_ref())?;
        let quantization = if spec.slur || duration.slurred {
            1.0
        } else {
            self.state.quantization()
        };
        let note = Note {
            offset: self.state.current_offset(),
            instruments: self.state.active_instruments.clone(),
            volume: self.state.volume(),
            panning: self.state.panning(),
            pitch,
            duration: duration.millis * quantization,
        };
        trace!("note {:.3} Hz at {} for {:.1} ms", pitch, note.offset, note.duration);
        self.state.advance(duration.beats);
        Ok(Event::Note(note))
    }

    /// Emit a rest at the current offset and advance past it.
    pub fn rest(&mut self, spec: &RestSpec) -> Result<Event> {
        let duration = self.state.resolve_duration(spec.duration.as_ref())?;
        let rest = Rest {
            offset: self.state.current_offset(),
            duration: duration.millis,
        };
        trace!("rest at {} for {:.1} ms", rest.offset, rest.duration);
        self.state.advance(duration.beats);
        Ok(Event::Rest(rest))
    }

    /// Change one attribute. The event sits at the current offset, which
    /// does not move.
    pub fn set_attribute(&mut self, name: &str, value: &RawValue) -> Result<Event> {
        let (attribute, value) =
            self.registry
                .apply(name, value, self.state.attributes_mut())?;
        trace!("{attribute} = {value} at {}", self.state.current_offset());
        Ok(Event::AttributeChange(AttributeChange {
            offset: self.state.current_offset(),
            attribute,
            value,
        }))
    }

    /// Change several attributes in order, one event each.
    pub fn set_attributes(&mut self, settings: &[AttributeSetting]) -> Result<Vec<Event>> {
        settings
            .iter()
            .map(|s| self.set_attribute(&s.name, &s.value))
            .collect()
    }

    fn place_marker(&mut self, name: &str) {
        trace!("marker '{name}' at {}", self.state.current_offset());
        self.markers.insert(name.to_string(), self.state.position());
    }

    fn jump_to_marker(&mut self, name: &str) -> Result<()> {
        let position = *self
            .markers
            .get(name)
            .ok_or_else(|| EvalError::UnknownMarker(name.to_string()))?;
        self.state.jump(self.state.position(), position);
        Ok(())
    }

    /// Offset recorded for a marker, if any.
    pub fn marker(&self, name: &str) -> Option<Beat> {
        self.markers.get(name).map(|&p| Beat::from_beats_f64(p))
    }
}
