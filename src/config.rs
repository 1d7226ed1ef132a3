//! Engine configuration — every tuning constant the sound design team
//! might want to adjust lives here, with JSON round-trip support.
//!
//! The source games shipped with several hand-tweaked variants of the same
//! synthesis constants (notably the slide texture). Rather than bless one
//! variant, the coefficients are configuration with named presets.

use serde::{Deserialize, Serialize};

use crate::error::AudioError;
use crate::mapper::MoodState;

/// Filter/pitch constants for the slide friction texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideTuning {
    /// One-pole coefficient; higher is darker.
    pub filter_alpha: f64,
    /// Low-pass cascade depth.
    pub filter_stages: usize,
    /// Pitch multiplier at zero speed.
    pub pitch_min: f64,
    /// Pitch multiplier at full speed.
    pub pitch_max: f64,
}

impl SlideTuning {
    /// Darker, rounder variant (the later source tuning).
    pub fn mellow() -> Self {
        SlideTuning {
            filter_alpha: 0.92,
            filter_stages: 3,
            pitch_min: 0.8,
            pitch_max: 1.5,
        }
    }

    /// Airier, hissier variant (the earlier source tuning).
    pub fn bright() -> Self {
        SlideTuning {
            filter_alpha: 0.75,
            filter_stages: 2,
            pitch_min: 0.9,
            pitch_max: 1.8,
        }
    }
}

impl Default for SlideTuning {
    fn default() -> Self {
        Self::mellow()
    }
}

/// Per-mood targets for the scheduler and layer mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodProfile {
    /// Target heartbeat tempo.
    pub bpm: f64,
    /// Target warmth in [0, 1]; drives chord choice and heartbeat timbre.
    pub warmth: f64,
    /// Gain for the base drone layer.
    pub base_gain: f64,
    /// Gain for the pad/shimmer layers.
    pub pad_gain: f64,
}

/// The full mood table. Field per state keeps the JSON flat and obvious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoodProfiles {
    pub drifting: MoodProfile,
    pub approaching: MoodProfile,
    pub attuning: MoodProfile,
    pub entwined: MoodProfile,
}

impl MoodProfiles {
    pub fn get(&self, mood: MoodState) -> &MoodProfile {
        match mood {
            MoodState::Drifting => &self.drifting,
            MoodState::Approaching => &self.approaching,
            MoodState::Attuning => &self.attuning,
            MoodState::Entwined => &self.entwined,
        }
    }
}

impl Default for MoodProfiles {
    fn default() -> Self {
        MoodProfiles {
            drifting: MoodProfile {
                bpm: 50.0,
                warmth: 0.15,
                base_gain: 0.5,
                pad_gain: 0.1,
            },
            approaching: MoodProfile {
                bpm: 60.0,
                warmth: 0.4,
                base_gain: 0.6,
                pad_gain: 0.3,
            },
            attuning: MoodProfile {
                bpm: 72.0,
                warmth: 0.7,
                base_gain: 0.7,
                pad_gain: 0.5,
            },
            entwined: MoodProfile {
                bpm: 84.0,
                warmth: 1.0,
                base_gain: 0.8,
                pad_gain: 0.7,
            },
        }
    }
}

/// Chord frequency tables, bucketed by warmth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChordTable {
    /// Consonant sets, used when warmth >= 0.5.
    pub warm: Vec<Vec<f64>>,
    /// Dissonant sets, used below.
    pub cold: Vec<Vec<f64>>,
}

impl ChordTable {
    /// Pick the table for a warmth bucket.
    pub fn for_warmth(&self, warmth: f64) -> &[Vec<f64>] {
        if warmth >= 0.5 { &self.warm } else { &self.cold }
    }
}

impl Default for ChordTable {
    fn default() -> Self {
        ChordTable {
            // A minor / F major / C major / G major around A3.
            warm: vec![
                vec![220.0, 261.63, 329.63],
                vec![174.61, 220.0, 261.63],
                vec![196.0, 246.94, 293.66],
                vec![220.0, 277.18, 329.63],
            ],
            // Clustered seconds and tritones.
            cold: vec![
                vec![220.0, 233.08, 311.13],
                vec![207.65, 220.0, 293.66],
                vec![196.0, 207.65, 277.18],
            ],
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub sample_rate: f64,
    /// Smoothing rate for layer volumes (fast).
    pub volume_smoothing_rate: f64,
    /// Smoothing rate for pitch (slower, avoids audible flutter).
    pub pitch_smoothing_rate: f64,
    /// Smoothing rate for tempo.
    pub bpm_smoothing_rate: f64,
    /// Tempo floor; the scheduler never runs slower than this.
    pub min_bpm: f64,
    /// Playback pitch multiplier bounds.
    pub pitch_min: f64,
    pub pitch_max: f64,
    /// Warmth drift that forces heartbeat resynthesis.
    pub regen_threshold: f64,
    /// Volumes below this are sent to the mixer as exactly 0.
    pub hard_zero_threshold: f64,
    /// Fraction of a looping buffer faded at each end.
    pub loop_fade_fraction: f64,
    /// Inner radius: full volume for distance-gated layers.
    pub distance_near: f64,
    /// Outer radius: silent at and beyond this distance.
    pub distance_far: f64,
    /// Speed that maps to full slide intensity.
    pub max_speed: f64,
    /// Beats between chord-tone advances.
    pub chord_tone_beats: u32,
    pub slide_tuning: SlideTuning,
    pub moods: MoodProfiles,
    pub chords: ChordTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44_100.0,
            volume_smoothing_rate: 8.0,
            pitch_smoothing_rate: 6.0,
            bpm_smoothing_rate: 0.8,
            min_bpm: 20.0,
            pitch_min: 0.5,
            pitch_max: 2.0,
            regen_threshold: 0.1,
            hard_zero_threshold: 0.01,
            loop_fade_fraction: 0.1,
            distance_near: 60.0,
            distance_far: 300.0,
            max_speed: 240.0,
            chord_tone_beats: 4,
            slide_tuning: SlideTuning::default(),
            moods: MoodProfiles::default(),
            chords: ChordTable::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, AudioError> {
        serde_json::from_str(json).map_err(AudioError::from)
    }

    pub fn to_json(&self) -> Result<String, AudioError> {
        serde_json::to_string_pretty(self).map_err(AudioError::from)
    }

    pub fn slide_tuning(&self) -> &SlideTuning {
        &self.slide_tuning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"sampleRate": 22050.0}"#).unwrap();
        assert_eq!(config.sample_rate, 22050.0);
        assert_eq!(config.min_bpm, 20.0);
        assert_eq!(config.slide_tuning, SlideTuning::mellow());
    }

    #[test]
    fn empty_object_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn slide_presets_differ() {
        assert_ne!(SlideTuning::mellow(), SlideTuning::bright());
    }

    #[test]
    fn chord_bucket_selection() {
        let table = ChordTable::default();
        assert_eq!(table.for_warmth(0.9), &table.warm[..]);
        assert_eq!(table.for_warmth(0.5), &table.warm[..]);
        assert_eq!(table.for_warmth(0.1), &table.cold[..]);
    }

    #[test]
    fn mood_lookup_matches_field() {
        let moods = MoodProfiles::default();
        assert_eq!(moods.get(MoodState::Attuning).bpm, 72.0);
        assert_eq!(moods.get(MoodState::Drifting).bpm, 50.0);
    }
}
