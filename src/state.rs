use crate::config::SampleMode;

/// Scalar animation parameters that survive across frames. The render loop
/// advances `scroll_offset` once per frame; everything else changes only
/// through the control surface and is read at the top of the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Grid scroll phase, always in [0, 1).
    pub scroll_offset: f32,
    pub bar_height_scale: f32,
    pub emblem_scale: f32,
    pub sample_mode: SampleMode,
}

impl AnimationState {
    pub fn new(sample_mode: SampleMode) -> Self {
        Self {
            scroll_offset: 0.0,
            bar_height_scale: 1.0,
            emblem_scale: 1.0,
            sample_mode,
        }
    }

    /// Advances the scroll phase by `step` (any sign, any magnitude) and
    /// wraps back into [0, 1). A modular wrap, so a step larger than a full
    /// cycle still lands inside the range.
    pub fn advance(&mut self, step: f32) {
        if !step.is_finite() {
            return;
        }
        let mut next = (self.scroll_offset + step).rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
        if !(next < 1.0) {
            next = 0.0;
        }
        self.scroll_offset = next;
    }
}
