//! Performance state — the mutable context every instruction reads and updates.
//!
//! One `PerformanceState` exists per score evaluation. It holds the current
//! attribute values, the offset cursor, and the set of instrument instances
//! that newly produced events belong to.
//!
//! The cursor is an exact beat position. It is rounded to a [`Beat`] only
//! when an event is stamped, so lengths that do not fall on a tick (sevenths,
//! millisecond durations) never accumulate rounding error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::attribute::{self, AttributeRegistry, AttributeValues};
use crate::error::{EvalError, Result};
use crate::event::{Beat, InstrumentInstance};
use crate::theory;

/// One tied piece of a written duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationComponent {
    /// A note value such as `4` (quarter) or `8` with `dots` dots.
    NoteLength {
        denominator: u32,
        #[serde(default)]
        dots: u32,
    },
    /// A raw beat count.
    Beats(f64),
    /// Wall-clock milliseconds, converted at the tempo in effect.
    Millis(f64),
}

/// A written duration: tied components, optionally slurred into the next note.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationSpec {
    pub components: Vec<DurationComponent>,
    #[serde(default)]
    pub slurred: bool,
}

impl DurationSpec {
    pub fn note_length(denominator: u32) -> Self {
        Self {
            components: vec![DurationComponent::NoteLength {
                denominator,
                dots: 0,
            }],
            slurred: false,
        }
    }

    pub fn dotted(denominator: u32, dots: u32) -> Self {
        Self {
            components: vec![DurationComponent::NoteLength { denominator, dots }],
            slurred: false,
        }
    }

    pub fn tied(components: Vec<DurationComponent>) -> Self {
        Self {
            components,
            slurred: false,
        }
    }
}

/// A duration resolved against the current tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDuration {
    pub beats: f64,
    pub millis: f64,
    pub slurred: bool,
}

/// The current performance context.
#[derive(Debug, Clone)]
pub struct PerformanceState {
    attributes: AttributeValues,
    /// Where the next event starts, in beats.
    position: f64,
    /// Where the previous event started, in beats.
    last_position: f64,
    pub active_instruments: BTreeSet<InstrumentInstance>,
}

impl PerformanceState {
    /// A fresh state seeded with the registry's initial values.
    pub fn new(registry: &AttributeRegistry) -> Self {
        Self {
            attributes: registry.initial_values(),
            position: 0.0,
            last_position: 0.0,
            active_instruments: BTreeSet::new(),
        }
    }

    /// Where the next event starts.
    pub fn current_offset(&self) -> Beat {
        Beat::from_beats_f64(self.position)
    }

    /// Where the previous event started.
    pub fn last_offset(&self) -> Beat {
        Beat::from_beats_f64(self.last_position)
    }

    /// Unrounded cursor position in beats.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Move the cursor without recording a previous event.
    pub fn set_position(&mut self, beats: f64) {
        self.position = beats;
    }

    /// Place the cursor at `to`, recording `from` as the last offset.
    pub fn jump(&mut self, from: f64, to: f64) {
        self.last_position = from;
        self.position = to;
    }

    pub fn attributes(&self) -> &AttributeValues {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeValues {
        &mut self.attributes
    }

    fn number(&self, name: &str, fallback: f64) -> f64 {
        self.attributes.get(name).unwrap_or(fallback)
    }

    /// Beats per minute.
    pub fn tempo(&self) -> f64 {
        self.number(attribute::TEMPO, 120.0)
    }

    /// Default note length in beats.
    pub fn duration(&self) -> f64 {
        self.number(attribute::DURATION, 1.0)
    }

    pub fn octave(&self) -> i32 {
        self.number(attribute::OCTAVE, 4.0) as i32
    }

    pub fn quantization(&self) -> f64 {
        self.number(attribute::QUANTIZATION, 0.9)
    }

    pub fn volume(&self) -> f64 {
        self.number(attribute::VOLUME, 1.0)
    }

    pub fn panning(&self) -> f64 {
        self.number(attribute::PANNING, 0.5)
    }

    /// Sum tied components into one duration and make it the new default.
    pub fn combined_duration(&mut self, spec: &DurationSpec) -> Result<ResolvedDuration> {
        let tempo = self.tempo();
        let mut beats = 0.0;
        for component in &spec.components {
            beats += match *component {
                DurationComponent::NoteLength { denominator: 0, .. } => {
                    return Err(EvalError::out_of_range(attribute::DURATION, "1/0"));
                }
                DurationComponent::NoteLength { denominator, dots } => {
                    theory::note_length(denominator, dots)
                }
                DurationComponent::Beats(b) => b,
                DurationComponent::Millis(ms) => theory::millis_to_beats(ms, tempo),
            };
        }
        if !(beats > 0.0 && beats.is_finite()) {
            return Err(EvalError::out_of_range(attribute::DURATION, beats));
        }
        self.attributes.set(attribute::DURATION, beats);
        Ok(ResolvedDuration {
            beats,
            millis: theory::beats_to_millis(beats, tempo),
            slurred: spec.slurred,
        })
    }

    /// The explicit duration if given, otherwise the current default.
    pub fn resolve_duration(&mut self, spec: Option<&DurationSpec>) -> Result<ResolvedDuration> {
        match spec {
            Some(spec) => self.combined_duration(spec),
            None => {
                let beats = self.duration();
                Ok(ResolvedDuration {
                    beats,
                    millis: theory::beats_to_millis(beats, self.tempo()),
                    slurred: false,
                })
            }
        }
    }

    /// Record the current offset as the last one and move past `beats`.
    pub fn advance(&mut self, beats: f64) {
        self.jump(self.position, self.position + beats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn state() -> PerformanceState {
        PerformanceState::new(&AttributeRegistry::builtin())
    }

    #[test]
    fn fresh_state_defaults() {
        let s = state();
        assert_eq!(s.tempo(), 120.0);
        assert_eq!(s.duration(), 1.0);
        assert_eq!(s.octave(), 4);
        assert_eq!(s.quantization(), 0.9);
        assert_eq!(s.volume(), 1.0);
        assert_eq!(s.panning(), 0.5);
        assert_eq!(s.current_offset(), Beat::ZERO);
        assert!(s.active_instruments.is_empty());
    }

    #[test]
    fn combined_duration_sums_ties() {
        let mut s = state();
        let spec = DurationSpec::tied(vec![
            DurationComponent::NoteLength {
                denominator: 4,
                dots: 0,
            },
            DurationComponent::NoteLength {
                denominator: 8,
                dots: 1,
            },
        ]);
        let d = s.combined_duration(&spec).unwrap();
        assert_approx_eq!(d.beats, 1.75);
        assert_approx_eq!(d.millis, 875.0);
        assert!(!d.slurred);
    }

    #[test]
    fn combined_duration_becomes_default() {
        let mut s = state();
        s.combined_duration(&DurationSpec::note_length(2)).unwrap();
        assert_approx_eq!(s.duration(), 2.0);
        let next = s.resolve_duration(None).unwrap();
        assert_approx_eq!(next.beats, 2.0);
        assert_approx_eq!(next.millis, 1000.0);
    }

    #[test]
    fn millis_component_uses_tempo() {
        let mut s = state();
        s.attributes_mut().set(attribute::TEMPO, 60.0);
        let d = s
            .combined_duration(&DurationSpec::tied(vec![DurationComponent::Millis(1500.0)]))
            .unwrap();
        assert_approx_eq!(d.beats, 1.5);
        assert_approx_eq!(d.millis, 1500.0);
    }

    #[test]
    fn zero_denominator_rejected() {
        let mut s = state();
        let err = s.combined_duration(&DurationSpec::note_length(0)).unwrap_err();
        assert!(matches!(err, EvalError::OutOfRange { .. }));
        assert_eq!(s.duration(), 1.0);
    }

    #[test]
    fn empty_duration_rejected() {
        let mut s = state();
        assert!(s.combined_duration(&DurationSpec::default()).is_err());
    }

    #[test]
    fn slur_flag_carried() {
        let mut s = state();
        let mut spec = DurationSpec::note_length(4);
        spec.slurred = true;
        assert!(s.combined_duration(&spec).unwrap().slurred);
    }

    #[test]
    fn advance_tracks_last_offset() {
        let mut s = state();
        s.advance(1.0);
        s.advance(0.5);
        assert_eq!(s.last_offset(), Beat::from_beats(1));
        assert_eq!(s.current_offset(), Beat::from_beats_f64(1.5));
    }

    #[test]
    fn sevenths_do_not_drift() {
        let mut s = state();
        for _ in 0..7 {
            let d = s
                .combined_duration(&DurationSpec::note_length(7))
                .unwrap();
            s.advance(d.beats);
        }
        assert_approx_eq!(s.position(), 4.0, 1e-9);
        assert_eq!(s.current_offset(), Beat::from_beats(4));
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let mut s = state();
        let spec = DurationSpec::tied(vec![DurationComponent::Beats(1e17)]);
        for _ in 0..2 {
            let d = s.combined_duration(&spec).unwrap();
            s.advance(d.beats);
        }
        assert!(s.last_offset() <= s.current_offset());
    }
}
