//! The audio engine facade — one context object per scene.
//!
//! Hosts create an engine, `init()` it, feed it `update(dt, inputs)` every
//! frame, and fire one-shots with `play`. Every operation before `init`
//! (or after `reset`) is a safe no-op; nothing in here can fail the caller.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::dsp::buffer::SoundBuffer;
use crate::dsp::synth::{OscillatorSpec, SoundBank, SoundId, SoundSpec, Synthesizer, recipe};
use crate::dsp::envelope::EnvelopeShape;
use crate::dsp::oscillator::{Harmonic, Waveform};
use crate::layers::{LayerManager, LayerTargets, MusicStyle};
use crate::mapper::{GameInputs, Smoothed, distance_falloff, hard_zero, speed_curve};
use crate::mixer::{Category, Mixer};
use crate::scheduler::{BeatScheduler, SchedulerEvent};

/// Mixer category for each named sound.
fn category_for(id: SoundId) -> Category {
    match id {
        SoundId::Heartbeat | SoundId::MusicLayer(_) => Category::Music,
        SoundId::Footstep => Category::Footsteps,
        SoundId::Slide => Category::Slide,
        SoundId::Thunk | SoundId::Pop | SoundId::Slam | SoundId::Chime => Category::Sfx,
    }
}

/// A complete per-scene audio context.
pub struct AudioEngine {
    config: EngineConfig,
    synth: Synthesizer,
    bank: SoundBank,
    mixer: Mixer,
    scheduler: BeatScheduler,
    layers: LayerManager,
    // Chord-tone renders keyed by chord index; dropped when the warmth
    // bucket flips and the table swaps.
    chord_cache: HashMap<usize, SoundBuffer>,
    chord_cache_warm: bool,
    warmth: Smoothed,
    slide_volume: Smoothed,
    slide_pitch: Smoothed,
    initialized: bool,
}

impl AudioEngine {
    /// Build an engine. `seed` drives every noise generator and the beat
    /// jitter; fix it for reproducible output, or seed from wall-clock
    /// time in production.
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        let synth = Synthesizer::new(config.sample_rate, seed)
            .with_loop_fade(config.loop_fade_fraction);
        let mixer = Mixer::new(config.pitch_min, config.pitch_max);
        let scheduler = BeatScheduler::new(
            config.moods.drifting.bpm,
            config.bpm_smoothing_rate,
            config.min_bpm,
            config.chord_tone_beats,
            config.regen_threshold,
            seed.wrapping_add(0xbeaf),
        );
        let slide_pitch_start = config.slide_tuning.pitch_min;
        AudioEngine {
            warmth: Smoothed::new(0.0, config.volume_smoothing_rate),
            slide_volume: Smoothed::new(0.0, config.volume_smoothing_rate),
            slide_pitch: Smoothed::new(slide_pitch_start, config.pitch_smoothing_rate),
            config,
            synth,
            bank: SoundBank::new(),
            mixer,
            scheduler,
            layers: LayerManager::new(),
            chord_cache: HashMap::new(),
            chord_cache_warm: false,
            initialized: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Make the engine ready. Buffers stay lazy; this only arms the
    /// lifecycle so update/play start doing work.
    pub fn init(&mut self) {
        self.initialized = true;
    }

    /// Start a music style. No-op before `init`.
    pub fn start(&mut self, style: MusicStyle) {
        if !self.initialized {
            return;
        }
        self.layers
            .play(style, &self.synth, &mut self.mixer, &self.config);
    }

    /// Fire a named sound. Unknown-at-this-moment buffers are synthesized
    /// lazily; out-of-range volume/pitch clamp silently. Playing a name
    /// that is already live replaces it in this call.
    pub fn play(&mut self, id: SoundId, volume: f64, pitch: f64) {
        if !self.initialized {
            return;
        }
        let buffer = self
            .bank
            .get_or_synthesize(id, &self.synth, &self.config)
            .clone();
        self.mixer
            .play(id, buffer, volume, pitch, category_for(id));
    }

    /// Advance one frame: smooth parameters, run the beat scheduler, and
    /// push the resulting mix state.
    pub fn update(&mut self, dt: f64, inputs: &GameInputs) {
        if !self.initialized || dt <= 0.0 {
            return;
        }

        let profile = self.config.moods.get(inputs.mood).clone();
        self.warmth.set_target(profile.warmth);
        self.warmth.update(dt);
        let warmth = self.warmth.current();

        self.scheduler.set_target_bpm(profile.bpm);
        let events = self.scheduler.update(dt);
        for event in events {
            match event {
                SchedulerEvent::Beat { volume, .. } => {
                    self.trigger_heartbeat(warmth, volume);
                }
                SchedulerEvent::ChordTone { step } => {
                    self.trigger_chord_tone(warmth, step);
                }
            }
        }

        self.update_slide(dt, inputs);

        let targets = LayerTargets {
            base_gain: profile.base_gain,
            pad_gain: profile.pad_gain,
            distance_gate: distance_falloff(
                inputs.distance,
                self.config.distance_near,
                self.config.distance_far,
            ),
            pitch: 1.0 + 0.08 * inputs.intensity.clamp(0.0, 1.0),
        };
        self.layers
            .update(dt, &targets, &mut self.mixer, &self.config);
    }

    fn trigger_heartbeat(&mut self, warmth: f64, volume: f64) {
        // Resynthesize only when the timbre has drifted; re-triggering a
        // freshly regenerated buffer every beat clicks.
        if self.scheduler.needs_regen(warmth) {
            let buffer = self
                .synth
                .synthesize(&recipe(SoundId::Heartbeat, &self.config, warmth));
            self.bank.replace(SoundId::Heartbeat, buffer);
            self.scheduler.mark_regenerated(warmth);
        }
        let buffer = self
            .bank
            .get_or_synthesize(SoundId::Heartbeat, &self.synth, &self.config)
            .clone();
        self.mixer
            .play(SoundId::Heartbeat, buffer, volume, 1.0, Category::Music);
    }

    fn trigger_chord_tone(&mut self, warmth: f64, step: usize) {
        let table = self.config.chords.for_warmth(warmth);
        if table.is_empty() {
            return;
        }
        // The round-robin revisits each chord every cycle, so cache the
        // render per chord index and resynthesize only when warmth crosses
        // into the other bucket.
        let warm_bucket = warmth >= 0.5;
        if warm_bucket != self.chord_cache_warm {
            self.chord_cache.clear();
            self.chord_cache_warm = warm_bucket;
        }
        let idx = step % table.len();
        let buffer = match self.chord_cache.get(&idx) {
            Some(cached) => cached.clone(),
            None => {
                let chord = &table[idx];
                let Some(&root) = chord.first() else {
                    return;
                };
                let harmonics: Vec<Harmonic> = chord
                    .iter()
                    .map(|&f| Harmonic::new(f / root, 1.0))
                    .collect();
                let spec = SoundSpec::simple(
                    OscillatorSpec::tone(Waveform::Sine, root).with_harmonics(harmonics),
                    EnvelopeShape::percussive(0.03, 3.0),
                    2.0,
                )
                .with_seed_offset(50 + idx as u64);
                let buffer = self.synth.synthesize(&spec);
                self.chord_cache.insert(idx, buffer.clone());
                buffer
            }
        };
        self.mixer
            .play_buffer(buffer, 0.35, 1.0, Category::Music);
    }

    fn update_slide(&mut self, dt: f64, inputs: &GameInputs) {
        let ratio = speed_curve(inputs.speed, self.config.max_speed);
        self.slide_volume.set_target(ratio);
        self.slide_volume.update(dt);

        let tuning = &self.config.slide_tuning;
        let pitch_target = tuning.pitch_min + (tuning.pitch_max - tuning.pitch_min) * ratio;
        self.slide_pitch.set_target(pitch_target);
        self.slide_pitch.update(dt);

        let volume = hard_zero(
            self.slide_volume.current(),
            self.config.hard_zero_threshold,
        );
        if volume > 0.0 {
            if self.mixer.voice(SoundId::Slide).is_none() {
                let buffer = self
                    .bank
                    .get_or_synthesize(SoundId::Slide, &self.synth, &self.config)
                    .clone();
                self.mixer.play(
                    SoundId::Slide,
                    buffer,
                    volume,
                    self.slide_pitch.current(),
                    Category::Slide,
                );
            } else {
                self.mixer.set_voice_volume(SoundId::Slide, volume);
                self.mixer
                    .set_voice_pitch(SoundId::Slide, self.slide_pitch.current());
            }
        } else if self.mixer.voice(SoundId::Slide).is_some() {
            // Inaudible: drop the voice rather than mixing silence.
            self.mixer.stop(SoundId::Slide);
        }
    }

    /// Rescale non-base music layers (intensity without resynthesis).
    pub fn modulate(&mut self, factor: f64) {
        self.layers.modulate(factor);
    }

    /// Ramp the music to silence over `duration`, then stop its layers.
    pub fn fade_out(&mut self, duration: f64) {
        self.layers.fade_out(duration);
    }

    pub fn set_volume(&mut self, category: Category, volume: f64) {
        self.mixer.set_volume(category, volume);
    }

    pub fn volume(&self, category: Category) -> f64 {
        self.mixer.volume(category)
    }

    pub fn stop(&mut self, id: SoundId) {
        self.mixer.stop(id);
    }

    pub fn stop_all(&mut self) {
        self.layers.stop(&mut self.mixer);
        self.mixer.stop_all();
    }

    /// Pull mixed audio for whatever output backend the host owns.
    pub fn render(&mut self, out: &mut [f64]) {
        if !self.initialized {
            out.fill(0.0);
            return;
        }
        self.mixer.render(out);
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.active_voices()
    }

    /// Scene teardown: stop everything, drop buffers, return to the
    /// uninitialized state.
    pub fn reset(&mut self) {
        self.stop_all();
        self.scheduler.reset();
        self.bank.clear();
        self.chord_cache.clear();
        self.warmth.snap(0.0);
        self.slide_volume.snap(0.0);
        self.slide_pitch.snap(self.config.slide_tuning.pitch_min);
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MoodState;

    fn engine() -> AudioEngine {
        // Low sample rate keeps buffer synthesis cheap in tests.
        let config = EngineConfig {
            sample_rate: 8000.0,
            ..EngineConfig::default()
        };
        AudioEngine::new(config, 42)
    }

    fn run(e: &mut AudioEngine, seconds: f64, inputs: &GameInputs) {
        let dt = 1.0 / 60.0;
        let steps = (seconds / dt) as usize;
        for _ in 0..steps {
            e.update(dt, inputs);
        }
    }

    #[test]
    fn everything_is_noop_before_init() {
        let mut e = engine();
        e.play(SoundId::Thunk, 1.0, 1.0);
        e.start(MusicStyle::Tether);
        e.update(1.0 / 60.0, &GameInputs::new(MoodState::Drifting));
        assert_eq!(e.active_voices(), 0);

        let mut out = vec![1.0; 64];
        e.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn play_twice_keeps_one_voice() {
        let mut e = engine();
        e.init();
        e.play(SoundId::Thunk, 1.0, 1.0);
        e.play(SoundId::Thunk, 1.0, 1.0);
        assert_eq!(e.active_voices(), 1);
    }

    #[test]
    fn update_produces_heartbeat_audio() {
        let mut e = engine();
        e.init();
        let inputs = GameInputs::new(MoodState::Attuning);
        // Long enough for at least one beat at ~50 BPM.
        run(&mut e, 2.0, &inputs);
        let mut out = vec![0.0; 4096];
        e.render(&mut out);
        assert!(
            out.iter().any(|&s| s != 0.0),
            "heartbeat should be audible after updates"
        );
    }

    #[test]
    fn slide_follows_speed() {
        let mut e = engine();
        e.init();
        let mut inputs = GameInputs::new(MoodState::Approaching);
        inputs.speed = e.config.max_speed;
        run(&mut e, 1.0, &inputs);
        assert!(
            e.mixer.voice(SoundId::Slide).is_some(),
            "slide loop should start while moving"
        );

        inputs.speed = 0.0;
        run(&mut e, 2.0, &inputs);
        assert!(
            e.mixer.voice(SoundId::Slide).is_none(),
            "slide loop should stop once inaudible"
        );
    }

    #[test]
    fn start_switches_styles_atomically() {
        let mut e = engine();
        e.init();
        e.start(MusicStyle::Bloom);
        let bloom_voices = e.active_voices();
        e.start(MusicStyle::Drift);
        assert_eq!(e.layers.style(), Some(MusicStyle::Drift));
        assert!(e.active_voices() < bloom_voices);
    }

    #[test]
    fn category_volume_roundtrip_and_clamp() {
        let mut e = engine();
        e.init();
        e.set_volume(Category::Music, 0.3);
        assert_eq!(e.volume(Category::Music), 0.3);
        e.set_volume(Category::Sfx, 7.0);
        assert_eq!(e.volume(Category::Sfx), 1.0);
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut e = engine();
        e.init();
        e.start(MusicStyle::Tether);
        e.play(SoundId::Pop, 1.0, 1.0);
        e.reset();
        assert!(!e.is_initialized());
        assert_eq!(e.active_voices(), 0);
        // Post-reset calls are no-ops again.
        e.play(SoundId::Pop, 1.0, 1.0);
        assert_eq!(e.active_voices(), 0);
    }

    #[test]
    fn warmth_drift_regenerates_heartbeat() {
        let mut e = engine();
        e.init();
        // Settle cold.
        run(&mut e, 5.0, &GameInputs::new(MoodState::Drifting));
        let cold = e.bank.get(SoundId::Heartbeat).unwrap().clone();
        // Swing fully warm and let the scheduler pass the threshold.
        run(&mut e, 10.0, &GameInputs::new(MoodState::Entwined));
        let warm = e.bank.get(SoundId::Heartbeat).unwrap();
        assert_ne!(
            cold.samples(),
            warm.samples(),
            "heartbeat timbre should regenerate after a large warmth swing"
        );
    }

    #[test]
    fn chord_tones_are_cached_per_chord() {
        let mut e = engine();
        e.init();
        // Long enough for the round-robin to lap the warm table several
        // times; every revisited chord must come from the cache.
        run(&mut e, 40.0, &GameInputs::new(MoodState::Entwined));
        assert!(e.chord_cache_warm);
        assert!(!e.chord_cache.is_empty());
        assert!(e.chord_cache.len() <= e.config.chords.warm.len());

        // Cooling off flips the bucket and invalidates the cache.
        run(&mut e, 40.0, &GameInputs::new(MoodState::Drifting));
        assert!(!e.chord_cache_warm);
        assert!(e.chord_cache.len() <= e.config.chords.cold.len());
    }

    #[test]
    fn identical_seeds_render_identically() {
        let make = || {
            let config = EngineConfig {
                sample_rate: 8000.0,
                ..EngineConfig::default()
            };
            let mut e = AudioEngine::new(config, 7);
            e.init();
            e.start(MusicStyle::Tether);
            let inputs = GameInputs::new(MoodState::Attuning);
            run(&mut e, 2.0, &inputs);
            let mut out = vec![0.0; 2048];
            e.render(&mut out);
            out
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn fade_out_silences_music() {
        let mut e = engine();
        e.init();
        e.start(MusicStyle::Drift);
        let inputs = GameInputs::new(MoodState::Entwined);
        run(&mut e, 2.0, &inputs);
        e.fade_out(0.5);
        run(&mut e, 1.0, &inputs);
        assert!(!e.layers.is_active());
    }
}
