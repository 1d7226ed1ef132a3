//! Procedural adaptive audio for narrative microgames.
//!
//! Everything audible is synthesized sample-by-sample at runtime — there
//! are no audio assets. The engine is driven each frame by continuous
//! gameplay state (distance, speed, intensity) and a discrete mood, which
//! it maps through smoothed parameters into layer volumes, a heartbeat
//! beat scheduler, and one-shot sound effects.
//!
//! Typical host loop:
//!
//! ```
//! use tether_audio::{AudioEngine, EngineConfig, GameInputs, MoodState, MusicStyle, SoundId};
//!
//! let mut engine = AudioEngine::new(EngineConfig::default(), 42);
//! engine.init();
//! engine.start(MusicStyle::Tether);
//!
//! let mut inputs = GameInputs::new(MoodState::Approaching);
//! inputs.distance = 120.0;
//! inputs.speed = 80.0;
//! engine.update(1.0 / 60.0, &inputs);
//! engine.play(SoundId::Footstep, 0.8, 1.0);
//!
//! let mut out = vec![0.0; 512];
//! engine.render(&mut out);
//! ```

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod layers;
pub mod mapper;
pub mod mixer;
pub mod scheduler;

pub use config::{EngineConfig, SlideTuning};
pub use dsp::synth::SoundId;
pub use engine::AudioEngine;
pub use error::AudioError;
pub use layers::MusicStyle;
pub use mapper::{GameInputs, MoodState};
pub use mixer::Category;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
