//! Amplitude envelopes over normalized progress.
//!
//! Buffers are fixed-length, so an envelope here is a pure shape: it maps
//! playback progress `p` in [0, 1] to a multiplier in [0, 1]. All shapes
//! are continuous across segment boundaries.

/// Envelope shape for a synthesized buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeShape {
    /// Constant full level.
    Flat,
    /// Linear fade in, hold, linear fade out. Starts and ends at exactly 0,
    /// which is what makes loops seamless when the fades are symmetric.
    Fade {
        fade_in_end: f64,
        fade_out_start: f64,
    },
    /// Fast linear attack then exponential decay `exp(-k * q)` over the
    /// remainder. The tail never reaches exactly 0; with `decay_k >= 5`
    /// it ends below 0.01.
    Percussive { attack: f64, decay_k: f64 },
    /// Silent until `delay`, then a percussive thump over the remainder.
    /// Multi-strike bodies (the heartbeat's second beat) stack one of
    /// these on a plain percussive layer.
    DelayedPercussive {
        delay: f64,
        attack: f64,
        decay_k: f64,
    },
}

impl EnvelopeShape {
    /// Fade envelope; fractions are clamped so fade-in + fade-out <= 1.
    pub fn fade(fade_in_end: f64, fade_out_start: f64) -> Self {
        let fade_in_end = fade_in_end.clamp(0.0, 1.0);
        let fade_out_start = fade_out_start.clamp(fade_in_end, 1.0);
        EnvelopeShape::Fade {
            fade_in_end,
            fade_out_start,
        }
    }

    /// Symmetric fade covering `fraction` of the buffer at each end.
    pub fn loop_fade(fraction: f64) -> Self {
        let fraction = fraction.clamp(0.0, 0.5);
        Self::fade(fraction, 1.0 - fraction)
    }

    /// Percussive envelope; attack is clamped to at most 5% of duration.
    pub fn percussive(attack: f64, decay_k: f64) -> Self {
        EnvelopeShape::Percussive {
            attack: attack.clamp(0.0, 0.05),
            decay_k: decay_k.max(0.0),
        }
    }

    /// Percussive thump starting at normalized progress `delay`.
    pub fn percussive_after(delay: f64, attack: f64, decay_k: f64) -> Self {
        EnvelopeShape::DelayedPercussive {
            delay: delay.clamp(0.0, 0.9),
            attack: attack.clamp(0.0, 0.05),
            decay_k: decay_k.max(0.0),
        }
    }

    /// Amplitude multiplier at progress `p` (clamped to [0, 1]).
    pub fn amplitude(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        match *self {
            EnvelopeShape::Flat => 1.0,
            EnvelopeShape::Fade {
                fade_in_end,
                fade_out_start,
            } => {
                if p < fade_in_end {
                    p / fade_in_end
                } else if p > fade_out_start {
                    if fade_out_start >= 1.0 {
                        1.0
                    } else {
                        (1.0 - p) / (1.0 - fade_out_start)
                    }
                } else {
                    1.0
                }
            }
            EnvelopeShape::Percussive { attack, decay_k } => {
                if p < attack {
                    p / attack
                } else {
                    // Normalize decay progress so k means the same thing
                    // regardless of attack length.
                    let q = if attack >= 1.0 {
                        0.0
                    } else {
                        (p - attack) / (1.0 - attack)
                    };
                    (-decay_k * q).exp()
                }
            }
            EnvelopeShape::DelayedPercussive {
                delay,
                attack,
                decay_k,
            } => {
                if p <= delay {
                    0.0
                } else {
                    // Remap the remainder to [0, 1] and run the same
                    // attack/decay math as Percussive.
                    let q = (p - delay) / (1.0 - delay);
                    if q < attack {
                        q / attack
                    } else {
                        let qq = if attack >= 1.0 {
                            0.0
                        } else {
                            (q - attack) / (1.0 - attack)
                        };
                        (-decay_k * qq).exp()
                    }
                }
            }
        }
    }

    /// True for shapes that begin and end near silence.
    pub fn is_fade(&self) -> bool {
        matches!(self, EnvelopeShape::Fade { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_endpoints_are_zero() {
        let env = EnvelopeShape::fade(0.1, 0.9);
        assert_eq!(env.amplitude(0.0), 0.0);
        assert_eq!(env.amplitude(1.0), 0.0);
        assert_eq!(env.amplitude(0.5), 1.0);
    }

    #[test]
    fn fade_is_continuous() {
        let env = EnvelopeShape::fade(0.1, 0.9);
        let step = 1e-4;
        let mut prev = env.amplitude(0.0);
        let mut p = step;
        while p <= 1.0 {
            let a = env.amplitude(p);
            assert!(
                (a - prev).abs() < 0.01,
                "jump at p={p}: {prev} -> {a}"
            );
            prev = a;
            p += step;
        }
    }

    #[test]
    fn fade_fractions_clamped() {
        // Out-of-order fractions must still satisfy in <= out.
        let env = EnvelopeShape::fade(0.8, 0.2);
        for i in 0..=100 {
            let a = env.amplitude(i as f64 / 100.0);
            assert!((0.0..=1.0).contains(&a));
        }
        assert_eq!(env.amplitude(0.0), 0.0);
        assert_eq!(env.amplitude(1.0), 0.0);
    }

    #[test]
    fn percussive_starts_at_zero_ends_quiet() {
        let env = EnvelopeShape::percussive(0.02, 6.0);
        assert_eq!(env.amplitude(0.0), 0.0);
        assert!(env.amplitude(1.0) <= 0.01, "tail should be inaudible");
    }

    #[test]
    fn percussive_peaks_at_attack_end() {
        let env = EnvelopeShape::percussive(0.02, 6.0);
        let peak = env.amplitude(0.02);
        assert!((peak - 1.0).abs() < 1e-9, "peak should be 1, got {peak}");
        // Strictly decreasing after the attack.
        assert!(env.amplitude(0.3) > env.amplitude(0.6));
        assert!(env.amplitude(0.6) > env.amplitude(0.99));
    }

    #[test]
    fn percussive_attack_capped() {
        let env = EnvelopeShape::percussive(0.5, 6.0);
        if let EnvelopeShape::Percussive { attack, .. } = env {
            assert!(attack <= 0.05);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn delayed_percussive_is_silent_until_delay() {
        let env = EnvelopeShape::percussive_after(0.4, 0.02, 9.0);
        assert_eq!(env.amplitude(0.0), 0.0);
        assert_eq!(env.amplitude(0.39), 0.0);
        assert!(env.amplitude(0.45) > 0.1);
    }

    #[test]
    fn delayed_percussive_peaks_after_remapped_attack() {
        let env = EnvelopeShape::percussive_after(0.4, 0.02, 9.0);
        // Attack spans `attack * (1 - delay)` of real progress.
        let peak_p = 0.4 + 0.02 * 0.6;
        assert!((env.amplitude(peak_p) - 1.0).abs() < 1e-9);
        assert!(env.amplitude(0.7) > env.amplitude(0.95));
    }

    #[test]
    fn flat_is_unity() {
        assert_eq!(EnvelopeShape::Flat.amplitude(0.0), 1.0);
        assert_eq!(EnvelopeShape::Flat.amplitude(1.0), 1.0);
    }

    #[test]
    fn loop_fade_is_symmetric() {
        let env = EnvelopeShape::loop_fade(0.1);
        for i in 0..=50 {
            let p = i as f64 / 100.0;
            let a = env.amplitude(p);
            let b = env.amplitude(1.0 - p);
            assert!((a - b).abs() < 1e-9, "asymmetric at p={p}: {a} vs {b}");
        }
    }

    #[test]
    fn out_of_range_progress_clamped() {
        let env = EnvelopeShape::fade(0.1, 0.9);
        assert_eq!(env.amplitude(-1.0), 0.0);
        assert_eq!(env.amplitude(2.0), 0.0);
    }
}
