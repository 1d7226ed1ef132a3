//! DSP primitives — pure Rust, sample-by-sample synthesis.
//!
//! No audio assets exist anywhere in the engine: every buffer is
//! synthesized at runtime from the specs in this module. The same code
//! serves live playback and the offline WAV audition path.

pub mod buffer;
pub mod envelope;
pub mod noise;
pub mod oscillator;
pub mod renderer;
pub mod synth;
