//! Sound synthesis engine — turns sound specs into sample buffers.
//!
//! Everything audible in the engine comes from here at runtime; there are
//! no audio assets. A spec combines an oscillator (optionally a harmonic
//! stack or filtered noise), an envelope shape, and a duration. Layered
//! specs sum several components with distinct decay constants, which is
//! how the thunk/pop/slam family gets its snap/body/tail character.

use std::collections::HashMap;

use crate::config::EngineConfig;

use super::buffer::SoundBuffer;
use super::envelope::EnvelopeShape;
use super::noise::NoiseFilter;
use super::oscillator::{Harmonic, Oscillator, Waveform};

/// Closed identifier set for named one-shot and loop sounds.
///
/// A closed enum instead of a string registry: unknown names cannot exist,
/// and the mixer's miss path (sound never synthesized) is an explicit
/// `Option` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SoundId {
    Heartbeat,
    Footstep,
    Slide,
    Thunk,
    Pop,
    Slam,
    Chime,
    /// A looping music layer slot owned by the layer manager.
    MusicLayer(u8),
}

impl SoundId {
    /// Stable per-sound seed offset so regeneration reproduces the same
    /// noise stream.
    pub(crate) fn seed_offset(self) -> u64 {
        match self {
            SoundId::Heartbeat => 1,
            SoundId::Footstep => 2,
            SoundId::Slide => 3,
            SoundId::Thunk => 4,
            SoundId::Pop => 5,
            SoundId::Slam => 6,
            SoundId::Chime => 7,
            SoundId::MusicLayer(n) => 100 + n as u64,
        }
    }

    /// The one-shot/loop sounds with a fixed recipe (music layers are
    /// synthesized per style by the layer manager instead).
    pub const ONE_SHOTS: [SoundId; 7] = [
        SoundId::Heartbeat,
        SoundId::Footstep,
        SoundId::Slide,
        SoundId::Thunk,
        SoundId::Pop,
        SoundId::Slam,
        SoundId::Chime,
    ];
}

/// Oscillator half of a sound spec.
#[derive(Debug, Clone)]
pub struct OscillatorSpec {
    pub waveform: Waveform,
    pub frequency: f64,
    /// Extra partials over the base frequency. Empty means a single
    /// fundamental at full weight.
    pub harmonics: Vec<Harmonic>,
    /// Noise filter brightness, used only by `FilteredNoise`.
    pub noise_alpha: f64,
    /// Noise filter cascade depth, used only by `FilteredNoise`.
    pub noise_stages: usize,
}

impl OscillatorSpec {
    pub fn tone(waveform: Waveform, frequency: f64) -> Self {
        OscillatorSpec {
            waveform,
            frequency,
            harmonics: Vec::new(),
            noise_alpha: 0.0,
            noise_stages: 1,
        }
    }

    pub fn noise(alpha: f64, stages: usize) -> Self {
        OscillatorSpec {
            waveform: Waveform::FilteredNoise,
            frequency: 0.0,
            harmonics: Vec::new(),
            noise_alpha: alpha,
            noise_stages: stages,
        }
    }

    pub fn with_harmonics(mut self, harmonics: Vec<Harmonic>) -> Self {
        self.harmonics = harmonics;
        self
    }
}

/// One component of a (possibly layered) sound.
#[derive(Debug, Clone)]
pub struct SoundLayerSpec {
    pub oscillator: OscillatorSpec,
    pub envelope: EnvelopeShape,
    pub gain: f64,
}

/// A complete recipe for one buffer.
#[derive(Debug, Clone)]
pub struct SoundSpec {
    pub layers: Vec<SoundLayerSpec>,
    pub duration: f64,
    pub looping: bool,
    /// Mixed into the synthesizer's base seed for reproducible noise.
    pub seed_offset: u64,
}

impl SoundSpec {
    /// Single-component spec.
    pub fn simple(
        oscillator: OscillatorSpec,
        envelope: EnvelopeShape,
        duration: f64,
    ) -> Self {
        SoundSpec {
            layers: vec![SoundLayerSpec {
                oscillator,
                envelope,
                gain: 1.0,
            }],
            duration,
            looping: false,
            seed_offset: 0,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn with_seed_offset(mut self, offset: u64) -> Self {
        self.seed_offset = offset;
        self
    }
}

/// The synthesis engine. Pure given (spec, seed): the same inputs always
/// produce the same buffer.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    sample_rate: f64,
    base_seed: u64,
    loop_fade_fraction: f64,
}

impl Synthesizer {
    pub fn new(sample_rate: f64, base_seed: u64) -> Self {
        Synthesizer {
            sample_rate,
            base_seed,
            loop_fade_fraction: 0.1,
        }
    }

    pub fn with_loop_fade(mut self, fraction: f64) -> Self {
        self.loop_fade_fraction = fraction.clamp(0.0, 0.5);
        self
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Render a spec to a buffer. Degenerate durations yield an empty
    /// buffer, never an error.
    pub fn synthesize(&self, spec: &SoundSpec) -> SoundBuffer {
        if spec.duration <= 0.0 || self.sample_rate <= 0.0 {
            return SoundBuffer::empty(self.sample_rate);
        }
        let n = (spec.duration * self.sample_rate) as usize;
        if n == 0 {
            return SoundBuffer::empty(self.sample_rate);
        }

        let mut mixed = vec![0.0_f64; n];
        let mut total_gain = 0.0_f64;

        for (li, layer) in spec.layers.iter().enumerate() {
            let seed = self
                .base_seed
                .wrapping_add(spec.seed_offset)
                .wrapping_add(li as u64 * 0x9e37_79b9);
            // Looping buffers must start and end at silence; force a
            // symmetric fade when the recipe didn't already ask for one.
            let envelope = if spec.looping && !layer.envelope.is_fade() {
                EnvelopeShape::loop_fade(self.loop_fade_fraction)
            } else {
                layer.envelope
            };
            self.render_layer(&layer.oscillator, envelope, layer.gain, seed, &mut mixed);
            total_gain += layer.gain;
        }

        // Bound the sum so stacked layers cannot clip.
        let norm = if total_gain > 1.0 { 1.0 / total_gain } else { 1.0 };
        for s in mixed.iter_mut() {
            *s = (*s * norm).clamp(-1.0, 1.0);
        }

        SoundBuffer::new(mixed, self.sample_rate, spec.looping)
    }

    fn render_layer(
        &self,
        spec: &OscillatorSpec,
        envelope: EnvelopeShape,
        gain: f64,
        seed: u64,
        out: &mut [f64],
    ) {
        let n = out.len();
        let denom = (n - 1).max(1) as f64;

        match spec.waveform {
            Waveform::FilteredNoise => {
                let filter = NoiseFilter::new(spec.noise_alpha, spec.noise_stages);
                let mut osc = Oscillator::with_noise_filter(self.sample_rate, seed, filter);
                for (i, s) in out.iter_mut().enumerate() {
                    let p = i as f64 / denom;
                    *s += osc.next_sample() * envelope.amplitude(p) * gain;
                }
            }
            _ => {
                // Harmonic stack: one phase-independent oscillator per
                // partial, normalized by partial count.
                let partials: Vec<Harmonic> = if spec.harmonics.is_empty() {
                    vec![Harmonic::new(1.0, 1.0)]
                } else {
                    spec.harmonics.clone()
                };
                let mut oscs: Vec<Oscillator> = partials
                    .iter()
                    .map(|h| {
                        let mut o = Oscillator::new(spec.waveform, self.sample_rate, seed);
                        o.frequency = spec.frequency * h.ratio;
                        o
                    })
                    .collect();
                let count = partials.len() as f64;
                for (i, s) in out.iter_mut().enumerate() {
                    let p = i as f64 / denom;
                    let mut sum = 0.0;
                    for (o, h) in oscs.iter_mut().zip(partials.iter()) {
                        sum += o.next_sample() * h.weight;
                    }
                    *s += (sum / count) * envelope.amplitude(p) * gain;
                }
            }
        }
    }
}

/// Lazily-synthesized, cached buffers for the closed sound set.
///
/// Buffers are built on first use and replaced only when a timbre
/// parameter changes (see the beat scheduler's regeneration policy);
/// volume and pitch never trigger resynthesis.
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    buffers: HashMap<SoundId, SoundBuffer>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a cached buffer, synthesizing it from its recipe on a miss.
    pub fn get_or_synthesize(
        &mut self,
        id: SoundId,
        synth: &Synthesizer,
        config: &EngineConfig,
    ) -> &SoundBuffer {
        self.buffers
            .entry(id)
            .or_insert_with(|| synth.synthesize(&recipe(id, config, 0.5)))
    }

    pub fn get(&self, id: SoundId) -> Option<&SoundBuffer> {
        self.buffers.get(&id)
    }

    /// Replace a buffer after a timbre change.
    pub fn replace(&mut self, id: SoundId, buffer: SoundBuffer) {
        self.buffers.insert(id, buffer);
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

/// Recipe table: the timbre of every named sound.
///
/// `warmth` in [0, 1] shifts pitch and filter brightness for the sounds
/// that react to it (currently the heartbeat).
pub fn recipe(id: SoundId, config: &EngineConfig, warmth: f64) -> SoundSpec {
    let warmth = warmth.clamp(0.0, 1.0);
    match id {
        SoundId::Heartbeat => {
            // Two-thump body: the lub, a softer lower dub ~150 ms behind
            // it, and a chest-pressure noise tail underneath. Warmer
            // states sit slightly higher.
            let freq = 48.0 + 18.0 * warmth;
            SoundSpec {
                layers: vec![
                    SoundLayerSpec {
                        oscillator: OscillatorSpec::tone(Waveform::Sine, freq),
                        envelope: EnvelopeShape::percussive(0.02, 7.0),
                        gain: 0.9,
                    },
                    SoundLayerSpec {
                        oscillator: OscillatorSpec::tone(Waveform::Sine, freq * 0.9),
                        envelope: EnvelopeShape::percussive_after(0.42, 0.02, 9.0),
                        gain: 0.5,
                    },
                    SoundLayerSpec {
                        oscillator: OscillatorSpec::noise(0.97, 3),
                        envelope: EnvelopeShape::percussive(0.02, 5.0),
                        gain: 0.15,
                    },
                ],
                duration: 0.35,
                looping: false,
                seed_offset: id.seed_offset(),
            }
        }
        SoundId::Footstep => SoundSpec {
            layers: vec![SoundLayerSpec {
                oscillator: OscillatorSpec::noise(0.88, 2),
                envelope: EnvelopeShape::percussive(0.01, 12.0),
                gain: 1.0,
            }],
            duration: 0.12,
            looping: false,
            seed_offset: id.seed_offset(),
        },
        SoundId::Slide => {
            // Long looping friction texture; tuning preset picks the
            // filter coefficient and cascade depth.
            let tuning = config.slide_tuning();
            SoundSpec {
                layers: vec![SoundLayerSpec {
                    oscillator: OscillatorSpec::noise(tuning.filter_alpha, tuning.filter_stages),
                    envelope: EnvelopeShape::loop_fade(config.loop_fade_fraction),
                    gain: 1.0,
                }],
                duration: 1.5,
                looping: true,
                seed_offset: id.seed_offset(),
            }
        }
        SoundId::Thunk => SoundSpec {
            // Body + snap: low tone with a brighter noise transient on top.
            layers: vec![
                SoundLayerSpec {
                    oscillator: OscillatorSpec::tone(Waveform::Sine, 82.0),
                    envelope: EnvelopeShape::percussive(0.01, 9.0),
                    gain: 0.8,
                },
                SoundLayerSpec {
                    oscillator: OscillatorSpec::noise(0.6, 1),
                    envelope: EnvelopeShape::percussive(0.005, 20.0),
                    gain: 0.4,
                },
            ],
            duration: 0.25,
            looping: false,
            seed_offset: id.seed_offset(),
        },
        SoundId::Pop => SoundSpec {
            layers: vec![
                SoundLayerSpec {
                    oscillator: OscillatorSpec::tone(Waveform::Sine, 420.0),
                    envelope: EnvelopeShape::percussive(0.005, 18.0),
                    gain: 0.6,
                },
                SoundLayerSpec {
                    oscillator: OscillatorSpec::noise(0.3, 1),
                    envelope: EnvelopeShape::percussive(0.005, 25.0),
                    gain: 0.5,
                },
            ],
            duration: 0.1,
            looping: false,
            seed_offset: id.seed_offset(),
        },
        SoundId::Slam => SoundSpec {
            // Snap / body / tail at three distinct decay rates.
            layers: vec![
                SoundLayerSpec {
                    oscillator: OscillatorSpec::noise(0.2, 1),
                    envelope: EnvelopeShape::percussive(0.005, 22.0),
                    gain: 0.5,
                },
                SoundLayerSpec {
                    oscillator: OscillatorSpec::tone(Waveform::Sine, 58.0),
                    envelope: EnvelopeShape::percussive(0.01, 6.0),
                    gain: 0.9,
                },
                SoundLayerSpec {
                    oscillator: OscillatorSpec::noise(0.92, 3),
                    envelope: EnvelopeShape::percussive(0.02, 4.0),
                    gain: 0.35,
                },
            ],
            duration: 0.5,
            looping: false,
            seed_offset: id.seed_offset(),
        },
        SoundId::Chime => SoundSpec {
            layers: vec![SoundLayerSpec {
                oscillator: OscillatorSpec::tone(Waveform::Sine, 660.0).with_harmonics(vec![
                    Harmonic::new(1.0, 1.0),
                    Harmonic::new(2.0, 0.5),
                    Harmonic::new(2.99, 0.25),
                ]),
                envelope: EnvelopeShape::percussive(0.01, 4.0),
                gain: 1.0,
            }],
            duration: 1.2,
            looping: false,
            seed_offset: id.seed_offset(),
        },
        // Layer slots have no fixed recipe; asking for one yields a
        // neutral quiet pad rather than failing.
        SoundId::MusicLayer(_) => SoundSpec {
            layers: vec![SoundLayerSpec {
                oscillator: OscillatorSpec::tone(Waveform::Sine, 110.0),
                envelope: EnvelopeShape::loop_fade(config.loop_fade_fraction),
                gain: 0.5,
            }],
            duration: 2.0,
            looping: true,
            seed_offset: id.seed_offset(),
        },
    }
}
