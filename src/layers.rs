//! Music layer manager — a small set of long looping drone/pad layers
//! whose per-layer volume is remixed continuously from game state.
//!
//! Exactly one style's layers are live at a time; switching styles stops
//! the old set in the same call. Intensity builds through remixing, never
//! through resynthesis.

use crate::config::EngineConfig;
use crate::dsp::envelope::EnvelopeShape;
use crate::dsp::oscillator::{Harmonic, Waveform};
use crate::dsp::synth::{OscillatorSpec, SoundId, SoundSpec, Synthesizer};
use crate::mapper::{Smoothed, hard_zero};
use crate::mixer::{Category, Mixer};

/// Discrete music style, chosen by the hosting microgame's mood key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicStyle {
    /// Sparse, cold: single low drone plus a faint pad.
    Drift,
    /// The core two-character tether: drone, pad, and a fifth shimmer.
    Tether,
    /// Full warmth: drone, stacked-third pad, shimmer, and an air layer.
    Bloom,
}

/// Role determines how a layer responds to the mapper's targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    /// Always present; scaled only by the mood's base gain.
    Base,
    /// Scaled by pad gain, modulation factor, and the distance gate.
    Pad,
    /// Like Pad but also follows the pitch target (detune under
    /// disorientation).
    Shimmer,
}

struct LayerDef {
    role: LayerRole,
    spec: SoundSpec,
    /// Design-time gain ceiling for this layer.
    gain: f64,
}

/// One live looping layer with its smoothing state.
#[derive(Debug, Clone)]
pub struct Layer {
    id: SoundId,
    role: LayerRole,
    gain: f64,
    volume: Smoothed,
    pitch: Smoothed,
}

impl Layer {
    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn current_volume(&self) -> f64 {
        self.volume.current()
    }

    pub fn current_pitch(&self) -> f64 {
        self.pitch.current()
    }
}

/// Per-frame targets computed by the engine from game state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerTargets {
    pub base_gain: f64,
    pub pad_gain: f64,
    /// Distance gate in [0, 1]; 0 silences every non-base layer.
    pub distance_gate: f64,
    /// Pitch multiplier for shimmer layers.
    pub pitch: f64,
}

impl Default for LayerTargets {
    fn default() -> Self {
        LayerTargets {
            base_gain: 0.5,
            pad_gain: 0.3,
            distance_gate: 1.0,
            pitch: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeState {
    None,
    Running { remaining: f64, duration: f64 },
    Done,
}

/// Owns the live layer set and pushes smoothed volumes into the mixer.
pub struct LayerManager {
    style: Option<MusicStyle>,
    layers: Vec<Layer>,
    modulation: f64,
    fade: FadeState,
}

impl LayerManager {
    pub fn new() -> Self {
        LayerManager {
            style: None,
            layers: Vec::new(),
            modulation: 1.0,
            fade: FadeState::None,
        }
    }

    pub fn style(&self) -> Option<MusicStyle> {
        self.style
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_active(&self) -> bool {
        self.style.is_some()
    }

    /// Start a style. Any previous style's layers are stopped first, in
    /// this same call, so two styles can never sound together.
    pub fn play(
        &mut self,
        style: MusicStyle,
        synth: &Synthesizer,
        mixer: &mut Mixer,
        config: &EngineConfig,
    ) {
        self.stop(mixer);

        let defs = style_defs(style, config);
        for (i, def) in defs.into_iter().enumerate() {
            let id = SoundId::MusicLayer(i as u8);
            let buffer = synth.synthesize(&def.spec);
            // Layers start silent and fade in through smoothing.
            mixer.play(id, buffer, 0.0, 1.0, Category::Music);
            self.layers.push(Layer {
                id,
                role: def.role,
                gain: def.gain,
                volume: Smoothed::new(0.0, config.volume_smoothing_rate),
                pitch: Smoothed::new(1.0, config.pitch_smoothing_rate),
            });
        }
        self.style = Some(style);
        self.modulation = 1.0;
        self.fade = FadeState::None;
    }

    /// Rescale non-base layers to build or relax intensity. Clamped to
    /// [0, 2]; no buffers are touched.
    pub fn modulate(&mut self, factor: f64) {
        self.modulation = factor.clamp(0.0, 2.0);
    }

    /// Begin a linear master fade to silence; the layers stop when it
    /// lands. A non-positive duration stops immediately.
    pub fn fade_out(&mut self, duration: f64) {
        if self.style.is_none() {
            return;
        }
        if duration <= 0.0 {
            self.fade = FadeState::Done;
        } else {
            self.fade = FadeState::Running {
                remaining: duration,
                duration,
            };
        }
    }

    /// Advance smoothing and push volumes/pitches into the mixer.
    pub fn update(
        &mut self,
        dt: f64,
        targets: &LayerTargets,
        mixer: &mut Mixer,
        config: &EngineConfig,
    ) {
        if self.style.is_none() {
            return;
        }

        let master = match self.fade {
            FadeState::None => 1.0,
            FadeState::Running {
                remaining,
                duration,
            } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.fade = FadeState::Done;
                    0.0
                } else {
                    self.fade = FadeState::Running {
                        remaining,
                        duration,
                    };
                    remaining / duration
                }
            }
            FadeState::Done => 0.0,
        };

        if matches!(self.fade, FadeState::Done) {
            self.stop(mixer);
            return;
        }

        for layer in self.layers.iter_mut() {
            let target = match layer.role {
                LayerRole::Base => targets.base_gain,
                LayerRole::Pad | LayerRole::Shimmer => {
                    targets.pad_gain * self.modulation * targets.distance_gate
                }
            };
            layer.volume.set_target((target * layer.gain).clamp(0.0, 1.0));
            layer.volume.update(dt);

            let pitch_target = match layer.role {
                LayerRole::Shimmer => targets.pitch,
                _ => 1.0,
            };
            layer.pitch.set_target(pitch_target);
            layer.pitch.update(dt);

            let volume = hard_zero(
                layer.volume.current() * master,
                config.hard_zero_threshold,
            );
            mixer.set_voice_volume(layer.id, volume);
            mixer.set_voice_pitch(layer.id, layer.pitch.current());
        }
    }

    /// Stop all layers and drop their voices.
    pub fn stop(&mut self, mixer: &mut Mixer) {
        for layer in self.layers.drain(..) {
            mixer.stop(layer.id);
        }
        self.style = None;
        self.modulation = 1.0;
        self.fade = FadeState::None;
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// The looping buffer recipes for each style's layer set.
fn style_defs(style: MusicStyle, config: &EngineConfig) -> Vec<LayerDef> {
    let loop_env = EnvelopeShape::loop_fade(config.loop_fade_fraction);
    let drone = |freq: f64, seed: u64| {
        SoundSpec::simple(
            OscillatorSpec::tone(Waveform::Sine, freq).with_harmonics(vec![
                Harmonic::new(1.0, 1.0),
                Harmonic::new(1.005, 0.6),
            ]),
            loop_env,
            3.0,
        )
        .looping()
        .with_seed_offset(seed)
    };
    let pad = |freq: f64, ratios: &[f64], seed: u64| {
        SoundSpec::simple(
            OscillatorSpec::tone(Waveform::Triangle, freq)
                .with_harmonics(ratios.iter().map(|&r| Harmonic::new(r, 1.0)).collect()),
            loop_env,
            3.0,
        )
        .looping()
        .with_seed_offset(seed)
    };
    let air = |alpha: f64, seed: u64| {
        SoundSpec::simple(OscillatorSpec::noise(alpha, 3), loop_env, 2.5)
            .looping()
            .with_seed_offset(seed)
    };

    match style {
        MusicStyle::Drift => vec![
            LayerDef {
                role: LayerRole::Base,
                spec: drone(82.41, 200),
                gain: 1.0,
            },
            LayerDef {
                role: LayerRole::Pad,
                spec: pad(164.81, &[1.0, 1.19], 201),
                gain: 0.6,
            },
        ],
        MusicStyle::Tether => vec![
            LayerDef {
                role: LayerRole::Base,
                spec: drone(98.0, 210),
                gain: 1.0,
            },
            LayerDef {
                role: LayerRole::Pad,
                spec: pad(196.0, &[1.0, 1.5], 211),
                gain: 0.7,
            },
            LayerDef {
                role: LayerRole::Shimmer,
                spec: pad(392.0, &[1.0], 212),
                gain: 0.5,
            },
        ],
        MusicStyle::Bloom => vec![
            LayerDef {
                role: LayerRole::Base,
                spec: drone(110.0, 220),
                gain: 1.0,
            },
            LayerDef {
                role: LayerRole::Pad,
                spec: pad(220.0, &[1.0, 1.25, 1.5], 221),
                gain: 0.7,
            },
            LayerDef {
                role: LayerRole::Shimmer,
                spec: pad(440.0, &[1.0, 2.0], 222),
                gain: 0.45,
            },
            LayerDef {
                role: LayerRole::Pad,
                spec: air(0.97, 223),
                gain: 0.3,
            },
        ],
    }
}
