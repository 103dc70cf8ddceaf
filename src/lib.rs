//! Partitura — semantic evaluation of music-notation instruction streams.
//!
//! Takes already-parsed score instructions (notes, rests, chords, voices,
//! attribute changes, instrument calls) and produces a [`Score`]: one
//! time-stamped event timeline per instrument instance.

pub mod attribute;
pub mod config;
pub mod error;
pub mod eval;
pub mod event;
pub mod score;
pub mod state;
pub mod theory;

pub use error::{EvalError, Result};
pub use score::{evaluate, evaluate_with, Score, ScoreProgram};
