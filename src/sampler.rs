use crate::audio::FeatureSource;
use crate::config::SampleMode;

/// Snapshots the audio feature source into one reusable byte buffer at the
/// top of each frame. Every overlay in that frame reads this single
/// snapshot; nothing re-samples mid-frame.
pub struct FrameSampler {
    buf: Vec<u8>,
}

impl FrameSampler {
    pub fn new(frame_len: usize) -> Self {
        Self {
            buf: vec![0u8; frame_len],
        }
    }

    pub fn frame_len(&self) -> usize {
        self.buf.len()
    }

    /// Fills the scratch buffer from the source in the requested mode and
    /// returns it. Before the source has started producing frames the
    /// buffer is zeroed instead, so early frames render a flat scene.
    pub fn sample(&mut self, source: &dyn FeatureSource, mode: SampleMode) -> &[u8] {
        if source.progress().is_none() {
            self.buf.fill(0);
            return &self.buf;
        }
        match mode {
            SampleMode::Frequency => source.fill_frequency_domain(&mut self.buf),
            SampleMode::Waveform => source.fill_time_domain(&mut self.buf),
        }
        &self.buf
    }
}

/// Normalized mean of a sample frame, in [0, 1]. Zero for an empty frame.
pub fn aggregate_energy(frame: &[u8]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: u32 = frame.iter().map(|&s| u32::from(s)).sum();
    sum as f32 / (frame.len() as f32 * 255.0)
}
