//! Adaptive parameter mapping — game state in, audio targets out.
//!
//! One smoothing implementation serves every consumer (layer volumes,
//! pitches, tempo); the source games had three slightly different copies
//! of this math and they had drifted apart.

use serde::{Deserialize, Serialize};

/// Discrete relationship state supplied by gameplay each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodState {
    Drifting,
    Approaching,
    Attuning,
    Entwined,
}

/// Continuous gameplay state for one frame of `update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameInputs {
    pub mood: MoodState,
    /// Distance between the two characters, world units.
    pub distance: f64,
    /// Player movement speed, world units per second.
    pub speed: f64,
    /// Normalized emotional intensity in [0, 1].
    pub intensity: f64,
}

impl GameInputs {
    pub fn new(mood: MoodState) -> Self {
        GameInputs {
            mood,
            distance: 0.0,
            speed: 0.0,
            intensity: 0.0,
        }
    }
}

/// A value that chases a target under exponential smoothing.
///
/// `current += (target - current) * dt * rate`, stepped once per frame.
/// Convergence is monotone: the value never overshoots the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    current: f64,
    target: f64,
    rate: f64,
}

impl Smoothed {
    pub fn new(initial: f64, rate: f64) -> Self {
        Smoothed {
            current: initial,
            target: initial,
            rate: rate.max(0.0),
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Jump straight to a value (scene start, teardown).
    pub fn snap(&mut self, value: f64) {
        self.current = value;
        self.target = value;
    }

    /// Advance one frame. Large `dt * rate` snaps to the target instead
    /// of overshooting.
    pub fn update(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let blend = (dt * self.rate).min(1.0);
        self.current += (self.target - self.current) * blend;
    }

    /// True once the value is effectively at its target.
    pub fn settled(&self, epsilon: f64) -> bool {
        (self.current - self.target).abs() <= epsilon
    }
}

/// Quadratic speed response: `(speed / max_speed)^2`, clamped to [0, 1].
/// A zero or negative `max_speed` maps everything to 0.
pub fn speed_curve(speed: f64, max_speed: f64) -> f64 {
    if max_speed <= 0.0 {
        return 0.0;
    }
    let ratio = (speed.abs() / max_speed).clamp(0.0, 1.0);
    ratio * ratio
}

/// Distance gate: 1 inside `near`, linear falloff to 0 at `far`, exactly 0
/// at and beyond `far`. Degenerate radii (far <= near) gate hard at `near`.
pub fn distance_falloff(distance: f64, near: f64, far: f64) -> f64 {
    if distance >= far {
        return 0.0;
    }
    if distance <= near {
        return 1.0;
    }
    if far <= near {
        return 0.0;
    }
    1.0 - (distance - near) / (far - near)
}

/// Suppress inaudible volumes so they cost nothing downstream.
pub fn hard_zero(volume: f64, threshold: f64) -> f64 {
    if volume < threshold { 0.0 } else { volume }
}
