//! Pitch resolution — letter, accidentals, and octave to MIDI number and Hz.

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Concert A (MIDI 69) in Hz.
const A4_HZ: f64 = 440.0;
const A4_MIDI: i32 = 69;

/// A semitone adjustment applied to a pitch letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    #[serde(alias = "-", alias = "b")]
    Flat,
    #[serde(alias = "+", alias = "#")]
    Sharp,
}

impl Accidental {
    fn semitones(self) -> i32 {
        match self {
            Self::Flat => -1,
            Self::Sharp => 1,
        }
    }
}

/// Semitones above C for a pitch letter (case-insensitive).
fn letter_offset(letter: char) -> Result<i32> {
    match letter.to_ascii_lowercase() {
        'c' => Ok(0),
        'd' => Ok(2),
        'e' => Ok(4),
        'f' => Ok(5),
        'g' => Ok(7),
        'a' => Ok(9),
        'b' => Ok(11),
        other => Err(EvalError::InvalidPitch(format!(
            "unrecognized pitch letter '{other}'"
        ))),
    }
}

/// MIDI note number for a letter, accidentals, and octave.
///
/// C4 (middle C) = 60, A4 = 69. Accidentals apply in order and are not
/// clamped to the MIDI range, but a note number that leaves `i32` is an
/// invalid pitch.
pub fn midi_note(letter: char, accidentals: &[Accidental], octave: i32) -> Result<i32> {
    let out_of_range = || EvalError::InvalidPitch(format!("octave {octave} out of range"));
    let semitone = letter_offset(letter)?;
    let base = octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|c| c.checked_add(semitone))
        .ok_or_else(out_of_range)?;
    accidentals
        .iter()
        .try_fold(base, |midi, accidental| midi.checked_add(accidental.semitones()))
        .ok_or_else(out_of_range)
}

/// Equal-tempered frequency in Hz for a letter, accidentals, and octave.
pub fn pitch_frequency(letter: char, accidentals: &[Accidental], octave: i32) -> Result<f64> {
    let midi = midi_note(letter, accidentals, octave)?;
    let hz = A4_HZ * 2f64.powf((midi as f64 - A4_MIDI as f64) / 12.0);
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(EvalError::InvalidPitch(format!("octave {octave} out of range")))
    }
}
