mod effects;
mod emblem;

pub use effects::{EffectsPipeline, NOISE_DENSITY};
pub use emblem::{EmblemSprite, SPRITE_SIZE};

use crate::config::DrawParams;
use crate::sampler::aggregate_energy;
use crate::state::AnimationState;
use crate::surface::Surface;

/// Colors and geometry constants for the scene. Style only; toggling and
/// scaling behavior lives in `DrawParams` and `AnimationState`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneStyle {
    pub background: (u8, u8, u8),
    /// Gradient stops at 0%, 50% and 100% of height.
    pub gradient_stops: [(u8, u8, u8); 3],
    /// Horizon line as a fraction of height; the grid floor lies below it.
    pub horizon: f32,
    pub bar_fill: (u8, u8, u8, u8),
    pub bar_spacing: f32,
    pub bar_margin: f32,
    /// Base bar height as a fraction of surface height.
    pub bar_height: f32,
    /// Level floor below which no bar collapses.
    pub min_bar_fraction: f32,
    pub curve_color: (u8, u8, u8, u8),
    /// Horizontal extent of the curve as a fraction of width.
    pub curve_span: f32,
    /// Apex rise at full energy as a fraction of height.
    pub curve_rise: f32,
    pub grid_color: (u8, u8, u8, u8),
    pub grid_verticals: usize,
    pub grid_horizontals: usize,
    /// Outward spread of vertical grid lines at the bottom edge.
    pub grid_skew: f32,
    /// Emblem center as fractions of width and height.
    pub emblem_anchor: (f32, f32),
    /// Emblem base draw size as a fraction of height.
    pub emblem_size: f32,
    pub flip_emblem: bool,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            background: (8, 6, 24),
            gradient_stops: [(0x90, 0xEE, 0x90), (0x02, 0x88, 0xD1), (0x66, 0x3A, 0x82)],
            horizon: 2.0 / 3.0,
            bar_fill: (255, 165, 51, 255),
            bar_spacing: 1.0,
            bar_margin: 2.0,
            bar_height: 1.0 / 3.0,
            min_bar_fraction: 1.0 / 20.0,
            curve_color: (255, 214, 120, 255),
            curve_span: 1.0 / 3.0,
            curve_rise: 1.0 / 3.0,
            grid_color: (186, 85, 255, 230),
            grid_verticals: 9,
            grid_horizontals: 6,
            grid_skew: 0.55,
            emblem_anchor: (0.5, 1.0 / 3.0),
            emblem_size: 1.0 / 3.0,
            flip_emblem: false,
        }
    }
}

/// Draws the scene onto a surface from one AudioFrame snapshot. Overlays
/// paint in a fixed order (background, gradient, curve, emblem, bars,
/// grid); each overlay that needs the aggregate energy recomputes it from
/// that same snapshot.
pub struct OverlayScene {
    style: SceneStyle,
    emblem: EmblemSprite,
}

impl OverlayScene {
    pub fn new(style: SceneStyle) -> Self {
        Self {
            style,
            emblem: EmblemSprite::synthesize(),
        }
    }

    pub fn style(&self) -> &SceneStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut SceneStyle {
        &mut self.style
    }

    /// One frame's composition. Reads but never mutates `frame` and
    /// `state`; `progress` is the source's normalized playback position
    /// (callers pass 0.0 while the source reports none).
    pub fn compose(
        &self,
        surface: &mut Surface,
        frame: &[u8],
        state: &AnimationState,
        params: &DrawParams,
        progress: f32,
    ) {
        surface.fill(self.style.background);
        if params.gradient {
            surface.fill_vertical_gradient(self.style.gradient_stops);
        }
        if params.curve {
            self.draw_curve(surface, frame, progress);
        }
        if params.emblem {
            self.draw_emblem(surface, frame, state);
        }
        if params.bars {
            self.draw_bars(surface, frame, state);
        }
        if params.grid {
            self.draw_grid(surface, state);
        }
    }

    fn draw_curve(&self, surface: &mut Surface, frame: &[u8], progress: f32) {
        let energy = aggregate_energy(frame);
        // Boundary check, not a clamp: off-surface or flat curves are
        // skipped outright.
        if !(progress > 0.0 && progress < 1.0) || energy <= 0.0 {
            return;
        }
        let w = surface.width() as f32;
        let h = surface.height() as f32;
        let apex_x = progress * w;
        let base_y = h * self.style.horizon;
        let span = w * self.style.curve_span;
        let rise = energy * h * self.style.curve_rise;
        // Control point at twice the rise, so the t = 0.5 point of the
        // curve sits exactly `rise` above the baseline.
        surface.stroke_quad_bezier(
            (apex_x - span * 0.5, base_y),
            (apex_x, base_y - 2.0 * rise),
            (apex_x + span * 0.5, base_y),
            self.style.curve_color,
        );
    }

    /// Drawn emblem side length in pixels for the given energy and state.
    pub fn emblem_draw_size(&self, surface_h: usize, energy: f32, state: &AnimationState) -> f32 {
        let base = surface_h as f32 * self.style.emblem_size;
        base * (1.0 + energy * 1.2) * state.emblem_scale
    }

    fn draw_emblem(&self, surface: &mut Surface, frame: &[u8], state: &AnimationState) {
        let energy = aggregate_energy(frame);
        let size = self.emblem_draw_size(surface.height(), energy, state);
        if !(size >= 1.0) {
            return;
        }
        let cx = surface.width() as f32 * self.style.emblem_anchor.0;
        let cy = surface.height() as f32 * self.style.emblem_anchor.1;
        surface.blit_scaled(
            self.emblem.pixels(),
            SPRITE_SIZE,
            SPRITE_SIZE,
            cx,
            cy,
            size,
            self.style.flip_emblem,
        );
    }

    fn draw_bars(&self, surface: &mut Surface, frame: &[u8], state: &AnimationState) {
        if frame.is_empty() {
            return;
        }
        let w = surface.width() as f32;
        let h = surface.height() as f32;
        let len = frame.len() as f32;
        let spacing = self.style.bar_spacing;
        let margin = self.style.bar_margin;
        let span = w - len * 2.0 * spacing - margin * 2.0;
        if span <= 0.0 {
            // Surface too narrow for the configured frame length.
            return;
        }
        let bar_w = span / (len * 2.0);
        let base_h = h * self.style.bar_height * state.bar_height_scale;
        for (i, &s) in frame.iter().enumerate() {
            let level = (s as f32 / 255.0).max(self.style.min_bar_fraction);
            let bh = level * base_h;
            let xl = margin + (len - i as f32) * (bar_w + spacing);
            surface.fill_rect(xl, h - bh, bar_w, bh, self.style.bar_fill);
            // Mirror on the right; sample 0 owns the shared center slot.
            if i > 0 {
                let xr = w - (margin + (len - i as f32) * (bar_w + spacing));
                surface.fill_rect(xr, h - bh, bar_w, bh, self.style.bar_fill);
            }
        }
    }

    fn draw_grid(&self, surface: &mut Surface, state: &AnimationState) {
        let w = surface.width() as f32;
        let h = surface.height() as f32;
        let horizon = h * self.style.horizon;
        let cols = self.style.grid_verticals;
        if cols >= 2 {
            for i in 0..cols {
                let fx = i as f32 / (cols - 1) as f32;
                let x_top = fx * (w - 1.0);
                let x_bot = x_top + (x_top - w * 0.5) * self.style.grid_skew;
                surface.draw_line(x_top, horizon, x_bot, h - 1.0, self.style.grid_color);
            }
        }
        let rows = self.style.grid_horizontals;
        if rows >= 2 {
            for off in grid_line_offsets(rows, state.scroll_offset) {
                let y = horizon + off * (h - 1.0 - horizon);
                surface.draw_line(0.0, y, w - 1.0, y, self.style.grid_color);
            }
        }
    }
}

/// Scroll offsets for the horizontal grid lines: line i sits at
/// (i / (count - 1) + scroll) mod 1.
pub fn grid_line_offsets(count: usize, scroll: f32) -> impl Iterator<Item = f32> {
    debug_assert!(count >= 2);
    (0..count).map(move |i| {
        let base = i as f32 / (count - 1) as f32;
        let mut off = (base + scroll).rem_euclid(1.0);
        if !(off < 1.0) {
            off = 0.0;
        }
        off
    })
}
