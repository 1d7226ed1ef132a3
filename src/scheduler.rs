//! Beat scheduler — discrete percussion events over a smoothed tempo.
//!
//! The tempo chases a mood-derived target through the same exponential
//! smoothing as every other parameter. Tick boundaries subtract the beat
//! interval instead of resetting the clock, so tempo changes never
//! accumulate drift.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::mapper::Smoothed;

/// Accent strength for a percussion tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    Strong,
    Medium,
    Light,
}

impl Accent {
    /// Base volume for this accent before humanization.
    pub fn base_volume(self) -> f64 {
        match self {
            Accent::Strong => 1.0,
            Accent::Medium => 0.7,
            Accent::Light => 0.45,
        }
    }

    fn for_subdivision(subdivision: u8) -> Self {
        match subdivision {
            0 => Accent::Strong,
            2 => Accent::Medium,
            _ => Accent::Light,
        }
    }
}

/// Events produced by one scheduler update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerEvent {
    /// A percussion/heartbeat tick. `volume` already includes the accent
    /// base and ±10% humanization jitter.
    Beat { subdivision: u8, volume: f64 },
    /// Advance the chord round-robin; `step` increments monotonically.
    ChordTone { step: usize },
}

/// Converts a continuous BPM parameter into discrete tick events.
#[derive(Debug, Clone)]
pub struct BeatScheduler {
    bpm: Smoothed,
    min_bpm: f64,
    elapsed: f64,
    subdivision: u8,
    beat_count: u64,
    chord_tone_beats: u32,
    chord_step: usize,
    warmth_at_last_synth: f64,
    regen_threshold: f64,
    jitter: Pcg32,
}

impl BeatScheduler {
    pub fn new(
        initial_bpm: f64,
        bpm_rate: f64,
        min_bpm: f64,
        chord_tone_beats: u32,
        regen_threshold: f64,
        seed: u64,
    ) -> Self {
        let min_bpm = min_bpm.max(1.0);
        BeatScheduler {
            bpm: Smoothed::new(initial_bpm.max(min_bpm), bpm_rate),
            min_bpm,
            elapsed: 0.0,
            // First fired tick lands on subdivision 0 (strong).
            subdivision: 3,
            beat_count: 0,
            chord_tone_beats: chord_tone_beats.max(1),
            chord_step: 0,
            warmth_at_last_synth: f64::NEG_INFINITY,
            regen_threshold,
            jitter: Pcg32::seed_from_u64(seed),
        }
    }

    /// Tempo target, clamped to the floor so the interval stays finite.
    pub fn set_target_bpm(&mut self, bpm: f64) {
        self.bpm.set_target(bpm.max(self.min_bpm));
    }

    pub fn bpm(&self) -> f64 {
        self.bpm.current()
    }

    pub fn subdivision(&self) -> u8 {
        self.subdivision
    }

    /// Seconds between ticks at the current (smoothed, clamped) tempo.
    pub fn beat_interval(&self) -> f64 {
        60.0 / self.bpm.current().max(self.min_bpm)
    }

    /// Advance by one frame, returning any events that fired.
    pub fn update(&mut self, dt: f64) -> Vec<SchedulerEvent> {
        let mut events = Vec::new();
        if dt <= 0.0 {
            return events;
        }
        self.bpm.update(dt);
        self.elapsed += dt;

        let interval = self.beat_interval();
        // Carry the remainder across ticks instead of resetting, so the
        // long-run tick count tracks wall time.
        while self.elapsed >= interval {
            self.elapsed -= interval;
            self.subdivision = (self.subdivision + 1) % 4;
            self.beat_count += 1;

            let accent = Accent::for_subdivision(self.subdivision);
            let jitter: f64 = self.jitter.random_range(-0.1..=0.1);
            let volume = (accent.base_volume() * (1.0 + jitter)).clamp(0.0, 1.0);
            events.push(SchedulerEvent::Beat {
                subdivision: self.subdivision,
                volume,
            });

            if self.beat_count % self.chord_tone_beats as u64 == 0 {
                events.push(SchedulerEvent::ChordTone {
                    step: self.chord_step,
                });
                self.chord_step += 1;
            }
        }
        events
    }

    /// Whether the heartbeat timbre has drifted far enough to be worth
    /// resynthesizing. Regenerating every beat would both waste time and
    /// click; the threshold amortizes the cost.
    pub fn needs_regen(&self, warmth: f64) -> bool {
        (warmth - self.warmth_at_last_synth).abs() > self.regen_threshold
    }

    pub fn mark_regenerated(&mut self, warmth: f64) {
        self.warmth_at_last_synth = warmth;
    }

    /// Reset clock and counters (scene teardown). Tempo state is kept.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.subdivision = 3;
        self.beat_count = 0;
        self.chord_step = 0;
        self.warmth_at_last_synth = f64::NEG_INFINITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(bpm: f64) -> BeatScheduler {
        let mut s = BeatScheduler::new(bpm, 0.8, 20.0, 4, 0.1, 99);
        s.set_target_bpm(bpm);
        s
    }

    fn count_beats(events: &[SchedulerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SchedulerEvent::Beat { .. }))
            .count()
    }

    #[test]
    fn beat_count_matches_tempo() {
        // 10 simulated seconds at 120 BPM = 20 ticks, give or take one.
        let mut s = scheduler(120.0);
        let dt = 1.0 / 60.0;
        let mut beats = 0;
        for _ in 0..600 {
            beats += count_beats(&s.update(dt));
        }
        let expected = 10.0 / (60.0 / 120.0);
        assert!(
            (beats as f64 - expected).abs() <= 1.0,
            "expected ~{expected} beats, got {beats}"
        );
    }

    #[test]
    fn elapsed_carries_over_instead_of_resetting() {
        let mut s = scheduler(60.0);
        // One beat per second; a frame of 1.25s should fire one beat and
        // keep the 0.25s remainder.
        let events = s.update(1.25);
        assert_eq!(count_beats(&events), 1);
        assert!((s.elapsed - 0.25).abs() < 1e-9, "remainder lost: {}", s.elapsed);
        assert!(s.elapsed < s.beat_interval());
    }

    #[test]
    fn first_beat_is_strong() {
        let mut s = scheduler(60.0);
        let events = s.update(1.0);
        match events[0] {
            SchedulerEvent::Beat { subdivision, .. } => assert_eq!(subdivision, 0),
            _ => panic!("expected a beat"),
        }
    }

    #[test]
    fn accent_pattern_cycles() {
        let mut s = scheduler(60.0);
        let mut subdivisions = Vec::new();
        for _ in 0..4 {
            for e in s.update(1.0) {
                if let SchedulerEvent::Beat { subdivision, .. } = e {
                    subdivisions.push(subdivision);
                }
            }
        }
        assert_eq!(subdivisions, vec![0, 1, 2, 3]);
        assert_eq!(Accent::for_subdivision(0), Accent::Strong);
        assert_eq!(Accent::for_subdivision(2), Accent::Medium);
        assert_eq!(Accent::for_subdivision(1), Accent::Light);
        assert_eq!(Accent::for_subdivision(3), Accent::Light);
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let mut s = scheduler(240.0);
        for _ in 0..200 {
            for e in s.update(0.25) {
                if let SchedulerEvent::Beat {
                    subdivision,
                    volume,
                } = e
                {
                    let base = Accent::for_subdivision(subdivision).base_volume();
                    assert!(
                        volume >= base * 0.9 - 1e-9 && volume <= (base * 1.1).min(1.0) + 1e-9,
                        "volume {volume} outside ±10% of {base}"
                    );
                }
            }
        }
    }

    #[test]
    fn jitter_is_seeded() {
        let collect = |seed: u64| {
            let mut s = BeatScheduler::new(120.0, 0.8, 20.0, 4, 0.1, seed);
            let mut vols = Vec::new();
            for _ in 0..100 {
                for e in s.update(0.5) {
                    if let SchedulerEvent::Beat { volume, .. } = e {
                        vols.push(volume);
                    }
                }
            }
            vols
        };
        assert_eq!(collect(5), collect(5));
        assert_ne!(collect(5), collect(6));
    }

    #[test]
    fn bpm_never_reaches_zero() {
        let mut s = scheduler(60.0);
        s.set_target_bpm(0.0);
        for _ in 0..10_000 {
            s.update(1.0 / 60.0);
        }
        assert!(s.bpm() >= 20.0 - 1e-9, "bpm fell to {}", s.bpm());
        assert!(s.beat_interval() <= 3.0 + 1e-9);
    }

    #[test]
    fn chord_tone_every_fourth_beat() {
        let mut s = scheduler(60.0);
        let mut steps = Vec::new();
        let mut beats = 0;
        for _ in 0..12 {
            for e in s.update(1.0) {
                match e {
                    SchedulerEvent::Beat { .. } => beats += 1,
                    SchedulerEvent::ChordTone { step } => steps.push((beats, step)),
                }
            }
        }
        assert_eq!(steps, vec![(4, 0), (8, 1), (12, 2)]);
    }

    #[test]
    fn regen_threshold_gates_resynthesis() {
        let mut s = scheduler(60.0);
        // Nothing synthesized yet: always regen.
        assert!(s.needs_regen(0.5));
        s.mark_regenerated(0.5);
        assert!(!s.needs_regen(0.55));
        assert!(!s.needs_regen(0.45));
        assert!(s.needs_regen(0.65));
        assert!(s.needs_regen(0.35));
    }

    #[test]
    fn tempo_smoothing_shifts_tick_rate() {
        let mut s = BeatScheduler::new(55.0, 0.8, 20.0, 4, 0.1, 1);
        s.set_target_bpm(72.0);
        let dt = 1.0 / 60.0;
        for _ in 0..180 {
            s.update(dt);
        }
        let progress = (s.bpm() - 55.0) / (72.0 - 55.0);
        assert!(progress >= 0.6, "bpm only moved {progress:.2} in 3s");
    }

    #[test]
    fn zero_dt_fires_nothing() {
        let mut s = scheduler(120.0);
        assert!(s.update(0.0).is_empty());
        assert!(s.update(-1.0).is_empty());
    }
}
