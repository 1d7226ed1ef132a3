//! SoundBuffer — a fixed block of synthesized mono samples.

/// An immutable block of mono audio samples at a fixed sample rate.
///
/// Buffers are produced once by the synthesizer and then only read by
/// playback; samples stay within [-1, 1].
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    samples: Vec<f64>,
    sample_rate: f64,
    looping: bool,
}

impl SoundBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: f64, looping: bool) -> Self {
        SoundBuffer {
            samples,
            sample_rate,
            looping,
        }
    }

    /// An empty buffer. Playing it is a no-op.
    pub fn empty(sample_rate: f64) -> Self {
        SoundBuffer {
            samples: Vec::new(),
            sample_rate,
            looping: false,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Whether playback should wrap at the end instead of stopping.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Buffer duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |m, &s| m.max(s.abs()))
    }

    /// Sample at `index`, 0.0 past the end.
    pub fn sample(&self, index: usize) -> f64 {
        self.samples.get(index).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_length() {
        let buf = SoundBuffer::new(vec![0.0; 44100], 44100.0, false);
        assert!((buf.duration() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_buffer_is_valid() {
        let buf = SoundBuffer::empty(44100.0);
        assert!(buf.is_empty());
        assert_eq!(buf.duration(), 0.0);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn peak_finds_extreme() {
        let buf = SoundBuffer::new(vec![0.1, -0.8, 0.3], 44100.0, false);
        assert!((buf.peak() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn sample_past_end_is_silence() {
        let buf = SoundBuffer::new(vec![0.5], 44100.0, false);
        assert_eq!(buf.sample(0), 0.5);
        assert_eq!(buf.sample(10), 0.0);
    }
}
