/// Side length of the synthesized sprite, in pixels.
pub const SPRITE_SIZE: usize = 64;

/// Procedurally generated retro sun: warm vertical gradient disc with
/// widening scanline gaps over the lower half and a feathered rim. Built
/// once at startup; the composer blits it scaled per frame.
pub struct EmblemSprite {
    pixels: Vec<u8>,
}

impl EmblemSprite {
    pub fn synthesize() -> Self {
        let n = SPRITE_SIZE;
        let mut pixels = vec![0u8; n * n * 4];
        let c = (n as f32 - 1.0) * 0.5;
        // Radius slightly past the pixel centers so the disc spans the full
        // sprite width at the midline.
        let radius = n as f32 * 0.5;
        const FEATHER: f32 = 1.5;

        for y in 0..n {
            for x in 0..n {
                let dx = x as f32 - c;
                let dy = y as f32 - c;
                let dist = (dx * dx + dy * dy).sqrt();
                let edge = ((radius - dist) / FEATHER).clamp(0.0, 1.0);
                if edge <= 0.0 {
                    continue;
                }
                // Scanline gaps below the midline, widening toward the
                // bottom edge.
                if dy > 0.0 {
                    let band = (dy / 5.0) as u32;
                    if dy % 5.0 < band.min(3) as f32 {
                        continue;
                    }
                }
                let t = y as f32 / (n - 1) as f32;
                let g = (223.0 + (94.0 - 223.0) * t).round() as u8;
                let b = (110.0 + (150.0 - 110.0) * t).round() as u8;
                let i = (y * n + x) * 4;
                pixels[i] = 255;
                pixels[i + 1] = g;
                pixels[i + 2] = b;
                pixels[i + 3] = (edge * 255.0).round() as u8;
            }
        }
        Self { pixels }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
