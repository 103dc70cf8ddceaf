//! Music-theory functions: note lengths, tempo conversion, pitch.
//!
//! Everything here is pure. The evaluator supplies whatever state (tempo,
//! octave) a calculation needs.

pub mod pitch;

pub use pitch::{midi_note, pitch_frequency, Accidental};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Length in beats of a note written with the given denominator and dots.
///
/// A quarter note (`4`) is one beat. Each dot adds half of the previous
/// term, so the series `4/d * (1 + 1/2 + 1/4 + ...)` approaches `8/d`.
pub fn note_length(denominator: u32, dots: u32) -> f64 {
    let base = 4.0 / denominator as f64;
    (0..=dots).map(|k| base / 2f64.powi(k as i32)).sum()
}

/// Milliseconds spanned by `beats` at `tempo` beats per minute.
pub fn beats_to_millis(beats: f64, tempo: f64) -> f64 {
    beats * MILLIS_PER_MINUTE / tempo
}

/// Beats spanned by `millis` at `tempo` beats per minute.
pub fn millis_to_beats(millis: f64, tempo: f64) -> f64 {
    millis * tempo / MILLIS_PER_MINUTE
}
