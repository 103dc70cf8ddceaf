//! Score offsets measured in integer ticks.
//!
//! Offsets are stored at 960 PPQN so that chord and voice resynchronization
//! compare exact values. The evaluator's cursor is kept in beats and rounded
//! to ticks once, when an event is stamped. Arithmetic saturates at both ends.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::Serialize;

/// Ticks per beat. 960 divides cleanly by 2, 3, 4, 5, 6, 8, 10, 12, 15, 16, 32, 64.
pub const TICKS_PER_BEAT: u64 = 960;

/// A position (or span) on the score's shared time axis.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(into = "f64")]
pub struct Beat {
    ticks: u64,
}

impl Beat {
    /// The start of every timeline.
    pub const ZERO: Beat = Beat { ticks: 0 };

    /// Create a `Beat` from a raw tick count.
    pub fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    /// Create a `Beat` from whole beats.
    pub fn from_beats(beats: u32) -> Self {
        Self {
            ticks: beats as u64 * TICKS_PER_BEAT,
        }
    }

    /// Create a `Beat` from a fractional beat count, rounded to the nearest tick.
    /// Negative inputs clamp to zero.
    pub fn from_beats_f64(beats: f64) -> Self {
        Self {
            ticks: (beats.max(0.0) * TICKS_PER_BEAT as f64).round() as u64,
        }
    }

    pub fn ticks(self) -> u64 {
        self.ticks
    }

    /// Convert to a floating-point beat value.
    pub fn as_beats_f64(self) -> f64 {
        self.ticks as f64 / TICKS_PER_BEAT as f64
    }
}

impl Ord for Beat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks.cmp(&other.ticks)
    }
}

impl PartialOrd for Beat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Beat {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            ticks: self.ticks.saturating_add(rhs.ticks),
        }
    }
}

impl AddAssign for Beat {
    fn add_assign(&mut self, rhs: Self) {
        self.ticks = self.ticks.saturating_add(rhs.ticks);
    }
}

impl Sub for Beat {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            ticks: self.ticks.saturating_sub(rhs.ticks),
        }
    }
}

impl From<Beat> for f64 {
    fn from(beat: Beat) -> f64 {
        beat.as_beats_f64()
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_beats_f64())
    }
}
