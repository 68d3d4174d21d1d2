use std::cell::Cell;

use retro_visualizer::audio::FeatureSource;
use retro_visualizer::config::SampleMode;
use retro_visualizer::sampler::{FrameSampler, aggregate_energy};
use retro_visualizer::state::AnimationState;

/// Feature source that counts fills and reports a fixed progress once
/// "started".
struct CountingSource {
    started: bool,
    freq_fills: Cell<u32>,
    time_fills: Cell<u32>,
}

impl CountingSource {
    fn new(started: bool) -> Self {
        Self {
            started,
            freq_fills: Cell::new(0),
            time_fills: Cell::new(0),
        }
    }
}

impl FeatureSource for CountingSource {
    fn fill_frequency_domain(&self, out: &mut [u8]) {
        self.freq_fills.set(self.freq_fills.get() + 1);
        out.fill(200);
    }

    fn fill_time_domain(&self, out: &mut [u8]) {
        self.time_fills.set(self.time_fills.get() + 1);
        out.fill(128);
    }

    fn progress(&self) -> Option<f32> {
        if self.started { Some(0.5) } else { None }
    }
}

// ── Animation state ─────────────────────────────────────────────────────────

#[test]
fn new_state_defaults() {
    let s = AnimationState::new(SampleMode::Frequency);
    assert_eq!(s.scroll_offset, 0.0);
    assert_eq!(s.bar_height_scale, 1.0);
    assert_eq!(s.emblem_scale, 1.0);
    assert_eq!(s.sample_mode, SampleMode::Frequency);
}

#[test]
fn advance_wraps_into_unit_range() {
    let mut s = AnimationState::new(SampleMode::Frequency);
    s.advance(0.3);
    assert!((s.scroll_offset - 0.3).abs() < 1e-6);
    s.advance(0.9);
    assert!(
        (s.scroll_offset - 0.2).abs() < 1e-6,
        "0.3 + 0.9 should wrap to 0.2, got {}",
        s.scroll_offset
    );
}

#[test]
fn advance_wraps_steps_larger_than_one_cycle() {
    let mut s = AnimationState::new(SampleMode::Frequency);
    s.advance(2.75);
    assert!(
        (s.scroll_offset - 0.75).abs() < 1e-5,
        "2.75 should wrap to 0.75, got {}",
        s.scroll_offset
    );
    s.advance(13.5);
    assert!(
        (s.scroll_offset - 0.25).abs() < 1e-4,
        "0.75 + 13.5 should wrap to 0.25, got {}",
        s.scroll_offset
    );
}

#[test]
fn advance_handles_negative_steps() {
    let mut s = AnimationState::new(SampleMode::Frequency);
    s.advance(-0.25);
    assert!(
        (s.scroll_offset - 0.75).abs() < 1e-6,
        "negative step should wrap upward, got {}",
        s.scroll_offset
    );
    s.advance(-3.5);
    assert!(
        (s.scroll_offset - 0.25).abs() < 1e-5,
        "0.75 - 3.5 should wrap to 0.25, got {}",
        s.scroll_offset
    );
}

#[test]
fn advance_stays_below_one_for_tiny_negative_steps() {
    // rem_euclid(1.0) of a tiny negative value can round to exactly 1.0,
    // which must not leak out of [0, 1).
    let mut s = AnimationState::new(SampleMode::Frequency);
    s.advance(-1e-9);
    assert!(
        s.scroll_offset >= 0.0 && s.scroll_offset < 1.0,
        "offset left [0, 1): {}",
        s.scroll_offset
    );
}

#[test]
fn advance_ignores_non_finite_steps() {
    let mut s = AnimationState::new(SampleMode::Frequency);
    s.advance(0.4);
    s.advance(f32::NAN);
    assert!((s.scroll_offset - 0.4).abs() < 1e-6, "NaN step must be a no-op");
    s.advance(f32::INFINITY);
    assert!(
        (s.scroll_offset - 0.4).abs() < 1e-6,
        "infinite step must be a no-op"
    );
}

#[test]
fn advance_many_small_steps_never_leaves_range() {
    let mut s = AnimationState::new(SampleMode::Waveform);
    for _ in 0..10_000 {
        s.advance(0.0173);
        assert!(
            s.scroll_offset >= 0.0 && s.scroll_offset < 1.0,
            "offset left [0, 1): {}",
            s.scroll_offset
        );
    }
}

// ── Frame sampler ───────────────────────────────────────────────────────────

#[test]
fn sampler_zero_fills_before_source_starts() {
    let source = CountingSource::new(false);
    let mut sampler = FrameSampler::new(16);
    let frame = sampler.sample(&source, SampleMode::Frequency);
    assert!(frame.iter().all(|&s| s == 0), "expected a zeroed frame");
    assert_eq!(source.freq_fills.get(), 0, "source must not be read before start");
    assert_eq!(source.time_fills.get(), 0);
}

#[test]
fn sampler_delegates_by_mode() {
    let source = CountingSource::new(true);
    let mut sampler = FrameSampler::new(16);

    let frame = sampler.sample(&source, SampleMode::Frequency);
    assert!(frame.iter().all(|&s| s == 200));
    assert_eq!(source.freq_fills.get(), 1);
    assert_eq!(source.time_fills.get(), 0);

    let frame = sampler.sample(&source, SampleMode::Waveform);
    assert!(frame.iter().all(|&s| s == 128));
    assert_eq!(source.freq_fills.get(), 1);
    assert_eq!(source.time_fills.get(), 1);
}

#[test]
fn sampler_reads_source_once_per_frame() {
    let source = CountingSource::new(true);
    let mut sampler = FrameSampler::new(32);
    for _ in 0..5 {
        let _ = sampler.sample(&source, SampleMode::Frequency);
    }
    assert_eq!(
        source.freq_fills.get(),
        5,
        "exactly one fill per sampled frame"
    );
}

#[test]
fn sampler_reports_frame_len() {
    let sampler = FrameSampler::new(128);
    assert_eq!(sampler.frame_len(), 128);
}

// ── Aggregate energy ────────────────────────────────────────────────────────

#[test]
fn energy_of_empty_frame_is_zero() {
    assert_eq!(aggregate_energy(&[]), 0.0);
}

#[test]
fn energy_of_silence_is_zero() {
    let frame = vec![0u8; 128];
    assert_eq!(aggregate_energy(&frame), 0.0);
}

#[test]
fn energy_of_full_scale_is_one() {
    let frame = vec![255u8; 128];
    assert!((aggregate_energy(&frame) - 1.0).abs() < 1e-6);
}

#[test]
fn energy_stays_in_unit_range() {
    let frame: Vec<u8> = (0..128).map(|i| (i * 2) as u8).collect();
    let e = aggregate_energy(&frame);
    assert!((0.0..=1.0).contains(&e), "energy out of range: {e}");
}

#[test]
fn energy_of_midscale_frame() {
    // 51 = 255 / 5, so the normalized mean is exactly 0.2.
    let frame = vec![51u8; 64];
    assert!((aggregate_energy(&frame) - 0.2).abs() < 1e-6);
}
