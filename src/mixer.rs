//! Playback and mixing — named voices, category masters, soft-clipped sum.

use std::collections::BTreeMap;

use crate::dsp::buffer::SoundBuffer;
use crate::dsp::synth::SoundId;

/// Master-volume category, applied multiplicatively at mix time so it can
/// change live without touching any buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Music,
    Sfx,
    Footsteps,
    Slide,
}

impl Category {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            Category::Music => 0,
            Category::Sfx => 1,
            Category::Footsteps => 2,
            Category::Slide => 3,
        }
    }
}

/// A live playback instance of one buffer.
#[derive(Debug, Clone)]
pub struct Voice {
    buffer: SoundBuffer,
    volume: f64,
    pitch: f64,
    category: Category,
    position: f64,
    playing: bool,
}

impl Voice {
    fn new(buffer: SoundBuffer, volume: f64, pitch: f64, category: Category) -> Self {
        let playing = !buffer.is_empty();
        Voice {
            buffer,
            volume: volume.clamp(0.0, 1.0),
            pitch: pitch.max(0.0),
            category,
            position: 0.0,
            playing,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Next sample with the play-head advanced by the pitch multiplier.
    /// Linear interpolation between neighbors; looping voices wrap.
    fn next_sample(&mut self) -> f64 {
        if !self.playing {
            return 0.0;
        }
        let len = self.buffer.len();
        let i = self.position as usize;
        if i >= len {
            self.playing = false;
            return 0.0;
        }
        let frac = self.position - i as f64;
        let a = self.buffer.sample(i);
        let b = if i + 1 < len {
            self.buffer.sample(i + 1)
        } else if self.buffer.looping() {
            self.buffer.sample(0)
        } else {
            0.0
        };
        let sample = a + (b - a) * frac;

        self.position += self.pitch;
        if self.position >= len as f64 {
            if self.buffer.looping() {
                self.position -= len as f64;
            } else {
                self.playing = false;
            }
        }

        sample * self.volume
    }
}

/// Sums all live voices into the output, one play-head per voice,
/// at most one named voice per [`SoundId`].
#[derive(Debug, Clone)]
pub struct Mixer {
    // Ordered map so render's summation order (and thus the exact float
    // output) is reproducible for a given seed.
    named: BTreeMap<SoundId, Voice>,
    anonymous: Vec<Voice>,
    category_volumes: [f64; Category::COUNT],
    master_gain: f64,
    pitch_min: f64,
    pitch_max: f64,
}

impl Mixer {
    pub fn new(pitch_min: f64, pitch_max: f64) -> Self {
        Mixer {
            named: BTreeMap::new(),
            anonymous: Vec::new(),
            category_volumes: [1.0; Category::COUNT],
            master_gain: 0.8,
            pitch_min,
            pitch_max,
        }
    }

    fn clamp_pitch(&self, pitch: f64) -> f64 {
        pitch.clamp(self.pitch_min, self.pitch_max)
    }

    /// Start (or restart) the named voice. Any prior voice for this id is
    /// replaced in the same call, so two voices for one id can never
    /// coexist. An empty buffer is a no-op.
    pub fn play(
        &mut self,
        id: SoundId,
        buffer: SoundBuffer,
        volume: f64,
        pitch: f64,
        category: Category,
    ) {
        if buffer.is_empty() {
            self.named.remove(&id);
            return;
        }
        let pitch = self.clamp_pitch(pitch);
        self.named
            .insert(id, Voice::new(buffer, volume, pitch, category));
    }

    /// Fire-and-forget one-shot without a name.
    pub fn play_buffer(&mut self, buffer: SoundBuffer, volume: f64, pitch: f64, category: Category) {
        if buffer.is_empty() {
            return;
        }
        let pitch = self.clamp_pitch(pitch);
        self.anonymous
            .push(Voice::new(buffer, volume, pitch, category));
    }

    pub fn stop(&mut self, id: SoundId) {
        self.named.remove(&id);
    }

    pub fn stop_all(&mut self) {
        self.named.clear();
        self.anonymous.clear();
    }

    /// Live volume push for a named voice (layers, slide). No-op when the
    /// voice isn't playing.
    pub fn set_voice_volume(&mut self, id: SoundId, volume: f64) {
        if let Some(v) = self.named.get_mut(&id) {
            v.volume = volume.clamp(0.0, 1.0);
        }
    }

    /// Live pitch push for a named voice.
    pub fn set_voice_pitch(&mut self, id: SoundId, pitch: f64) {
        let pitch = self.clamp_pitch(pitch);
        if let Some(v) = self.named.get_mut(&id) {
            v.pitch = pitch;
        }
    }

    pub fn voice(&self, id: SoundId) -> Option<&Voice> {
        self.named.get(&id)
    }

    /// Count of live voices, named and anonymous.
    pub fn active_voices(&self) -> usize {
        self.named.values().filter(|v| v.is_playing()).count()
            + self.anonymous.iter().filter(|v| v.is_playing()).count()
    }

    /// Out-of-range values clamp silently.
    pub fn set_volume(&mut self, category: Category, volume: f64) {
        self.category_volumes[category.index()] = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self, category: Category) -> f64 {
        self.category_volumes[category.index()]
    }

    /// Mix every live voice into `out`, advancing play-heads. Finished
    /// one-shots are dropped afterwards.
    pub fn render(&mut self, out: &mut [f64]) {
        for slot in out.iter_mut() {
            let mut sum = 0.0;
            for v in self.named.values_mut() {
                let cat = self.category_volumes[v.category.index()];
                sum += v.next_sample() * cat;
            }
            for v in self.anonymous.iter_mut() {
                let cat = self.category_volumes[v.category.index()];
                sum += v.next_sample() * cat;
            }
            *slot = soft_clip(sum * self.master_gain);
        }
        self.named.retain(|_, v| v.is_playing());
        self.anonymous.retain(|v| v.is_playing());
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
