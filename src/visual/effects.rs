use crate::config::DrawParams;

/// Probability that the noise pass whitens any given pixel.
pub const NOISE_DENSITY: f32 = 0.05;

/// Post-composition pixel transforms, applied in place to the surface
/// buffer. Owns its RNG so runs are seedable.
pub struct EffectsPipeline {
    rng: fastrand::Rng,
}

impl EffectsPipeline {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Two passes over the buffer. Pass 1 is per-pixel in the fixed
    /// sub-order noise, invert, grayscale, each reading the previous
    /// sub-effect's output. Pass 2 is the emboss convolution and runs on
    /// the pass-1 result.
    pub fn apply(&mut self, pixels: &mut [u8], width: usize, height: usize, params: &DrawParams) {
        debug_assert_eq!(
            pixels.len(),
            width * height * 4,
            "pixel buffer length must be width * height * 4"
        );

        if params.noise || params.invert_colors || params.grayscale {
            for px in pixels.chunks_exact_mut(4) {
                if params.noise && self.rng.f32() < NOISE_DENSITY {
                    px[0] = 255;
                    px[1] = 255;
                    px[2] = 255;
                }
                if params.invert_colors {
                    px[0] = 255 - px[0];
                    px[1] = 255 - px[1];
                    px[2] = 255 - px[2];
                }
                if params.grayscale {
                    let avg = ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8;
                    px[0] = avg;
                    px[1] = avg;
                    px[2] = avg;
                }
            }
        }

        if params.emboss {
            emboss_pass(pixels, width, height);
        }
    }
}

impl Default for EffectsPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Finite-difference relief: v = 127 + 2*center - right - below per color
/// channel, alpha untouched. Neighbor indices clamp to the buffer edge, so
/// the last column reads itself as its right neighbor and the last row as
/// its below neighbor. The forward row-major scan only ever reads pixels
/// not yet written this pass, so the transform stays in place.
fn emboss_pass(pixels: &mut [u8], width: usize, height: usize) {
    if width == 0 || height == 0 {
        return;
    }
    for y in 0..height {
        let below = if y + 1 < height { y + 1 } else { y };
        for x in 0..width {
            let right = if x + 1 < width { x + 1 } else { x };
            let i = (y * width + x) * 4;
            let ri = (y * width + right) * 4;
            let bi = (below * width + x) * 4;
            for ch in 0..3 {
                let v = 127 + 2 * pixels[i + ch] as i32
                    - pixels[ri + ch] as i32
                    - pixels[bi + ch] as i32;
                pixels[i + ch] = v.clamp(0, 255) as u8;
            }
        }
    }
}
