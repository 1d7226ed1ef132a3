//! Phase-accumulating oscillators for runtime synthesis.

use std::f64::consts::PI;

use super::noise::{NoiseFilter, NoiseSource};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    /// White noise smoothed by the recursive noise filter.
    FilteredNoise,
}

/// One partial of a harmonic stack: a frequency multiplier and its weight.
///
/// Chords and detuned drones are expressed as harmonics over a base
/// frequency; the synthesizer normalizes the summed output by the partial
/// count so stacks never clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub ratio: f64,
    pub weight: f64,
}

impl Harmonic {
    pub fn new(ratio: f64, weight: f64) -> Self {
        Harmonic { ratio, weight }
    }
}

/// A single oscillator voice with its own phase accumulator.
///
/// Square output is scaled to 0.5 for loudness parity with sine; triangle
/// is the piecewise-linear `4*|phase - 0.5| - 1`.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    pub frequency: f64,
    phase: f64,
    sample_rate: f64,
    noise: NoiseSource,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f64, seed: u64) -> Self {
        Oscillator {
            waveform,
            frequency: 440.0,
            phase: 0.0,
            sample_rate,
            noise: NoiseSource::white(seed),
        }
    }

    /// Oscillator whose noise path runs through the given filter cascade.
    pub fn with_noise_filter(sample_rate: f64, seed: u64, filter: NoiseFilter) -> Self {
        Oscillator {
            waveform: Waveform::FilteredNoise,
            frequency: 440.0,
            phase: 0.0,
            sample_rate,
            noise: NoiseSource::new(seed, filter),
        }
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.frequency / self.sample_rate
    }

    /// Generate the next sample in [-1, 1].
    pub fn next_sample(&mut self) -> f64 {
        let sample = match self.waveform {
            Waveform::Sine => (2.0 * PI * self.phase).sin(),
            Waveform::Square => {
                // Half amplitude: a full-scale square reads much louder
                // than a sine at the same peak.
                if (2.0 * PI * self.phase).sin() >= 0.0 {
                    0.5
                } else {
                    -0.5
                }
            }
            Waveform::Triangle => 4.0 * (self.phase - 0.5).abs() - 1.0,
            Waveform::FilteredNoise => self.noise.next_sample(),
        };

        self.phase += self.phase_inc();
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    /// Reset oscillator phase (noise state is left alone).
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
