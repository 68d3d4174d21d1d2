/// Owned RGBA pixel surface plus the drawing primitives the overlay
/// composer needs. Row-major, 4 bytes per pixel; the effects pass borrows
/// the raw buffer through `pixels_mut`.
pub struct Surface {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            pixels: vec![0u8; w * h * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        if w == self.w && h == self.h {
            return;
        }
        self.w = w;
        self.h = h;
        self.pixels.clear();
        self.pixels.resize(w * h * 4, 0);
    }

    /// Opaque fill of the whole surface.
    pub fn fill(&mut self, (r, g, b): (u8, u8, u8)) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = 255;
        }
    }

    /// Vertical 3-stop gradient with stops at the top, middle and bottom
    /// rows, linearly interpolated between them. Opaque.
    pub fn fill_vertical_gradient(&mut self, stops: [(u8, u8, u8); 3]) {
        let (w, h) = (self.w, self.h);
        for y in 0..h {
            let t = if h > 1 {
                y as f32 / (h - 1) as f32
            } else {
                0.0
            };
            let (r, g, b) = if t <= 0.5 {
                lerp_rgb(stops[0], stops[1], t * 2.0)
            } else {
                lerp_rgb(stops[1], stops[2], (t - 0.5) * 2.0)
            };
            let row = &mut self.pixels[y * w * 4..(y + 1) * w * 4];
            for px in row.chunks_exact_mut(4) {
                px[0] = r;
                px[1] = g;
                px[2] = b;
                px[3] = 255;
            }
        }
    }

    /// Axis-aligned rectangle at float coordinates, rounded to the pixel
    /// grid, clipped to the surface, alpha-blended.
    pub fn fill_rect(&mut self, x: f32, y: f32, rw: f32, rh: f32, color: (u8, u8, u8, u8)) {
        if !(rw > 0.0) || !(rh > 0.0) {
            return;
        }
        let x0 = (x.round() as i64).max(0) as usize;
        let y0 = (y.round() as i64).max(0) as usize;
        let x1 = ((x + rw).round() as i64).clamp(0, self.w as i64) as usize;
        let y1 = ((y + rh).round() as i64).clamp(0, self.h as i64) as usize;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_px(px as i32, py as i32, color);
            }
        }
    }

    /// Bresenham segment between rounded endpoints, alpha-blended.
    pub fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: (u8, u8, u8, u8)) {
        let (mut x, mut y) = (x0.round() as i32, y0.round() as i32);
        let (tx, ty) = (x1.round() as i32, y1.round() as i32);
        let dx = (tx - x).abs();
        let sx = if x < tx { 1 } else { -1 };
        let dy = -(ty - y).abs();
        let sy = if y < ty { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend_px(x, y, color);
            if x == tx && y == ty {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Quadratic Bézier stroke, flattened into line segments. The even
    /// segment count keeps the t = 0.5 apex on the polyline exactly.
    pub fn stroke_quad_bezier(
        &mut self,
        p0: (f32, f32),
        ctrl: (f32, f32),
        p2: (f32, f32),
        color: (u8, u8, u8, u8),
    ) {
        const SEGMENTS: usize = 24;
        let mut prev = p0;
        for i in 1..=SEGMENTS {
            let t = i as f32 / SEGMENTS as f32;
            let u = 1.0 - t;
            let x = u * u * p0.0 + 2.0 * u * t * ctrl.0 + t * t * p2.0;
            let y = u * u * p0.1 + 2.0 * u * t * ctrl.1 + t * t * p2.1;
            self.draw_line(prev.0, prev.1, x, y, color);
            prev = (x, y);
        }
    }

    /// Nearest-neighbor blit of an RGBA sprite into a square of `size`
    /// pixels centered on (cx, cy). `flip` rotates the sprite 180 degrees.
    pub fn blit_scaled(
        &mut self,
        sprite: &[u8],
        sprite_w: usize,
        sprite_h: usize,
        cx: f32,
        cy: f32,
        size: f32,
        flip: bool,
    ) {
        if sprite_w == 0 || sprite_h == 0 || !(size >= 1.0) {
            return;
        }
        debug_assert_eq!(sprite.len(), sprite_w * sprite_h * 4);
        let side = size.round() as i32;
        let x0 = (cx - size * 0.5).round() as i32;
        let y0 = (cy - size * 0.5).round() as i32;
        for dy in 0..side {
            let y = y0 + dy;
            if y < 0 || y >= self.h as i32 {
                continue;
            }
            let v = (dy as f32 + 0.5) / side as f32;
            let mut sy = ((v * sprite_h as f32) as usize).min(sprite_h - 1);
            if flip {
                sy = sprite_h - 1 - sy;
            }
            for dx in 0..side {
                let x = x0 + dx;
                if x < 0 || x >= self.w as i32 {
                    continue;
                }
                let u = (dx as f32 + 0.5) / side as f32;
                let mut sx = ((u * sprite_w as f32) as usize).min(sprite_w - 1);
                if flip {
                    sx = sprite_w - 1 - sx;
                }
                let si = (sy * sprite_w + sx) * 4;
                let a = sprite[si + 3];
                if a == 0 {
                    continue;
                }
                self.blend_px(x, y, (sprite[si], sprite[si + 1], sprite[si + 2], a));
            }
        }
    }

    fn blend_px(&mut self, x: i32, y: i32, (r, g, b, a): (u8, u8, u8, u8)) {
        if a == 0 || x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return;
        }
        let i = (y as usize * self.w + x as usize) * 4;
        if a == 255 {
            self.pixels[i] = r;
            self.pixels[i + 1] = g;
            self.pixels[i + 2] = b;
            self.pixels[i + 3] = 255;
            return;
        }
        let a32 = a as u32;
        let inv = 255 - a32;
        let dst = &mut self.pixels[i..i + 4];
        dst[0] = ((r as u32 * a32 + dst[0] as u32 * inv + 127) / 255) as u8;
        dst[1] = ((g as u32 * a32 + dst[1] as u32 * inv + 127) / 255) as u8;
        dst[2] = ((b as u32 * a32 + dst[2] as u32 * inv + 127) / 255) as u8;
        dst[3] = (a32 + (dst[3] as u32 * inv + 127) / 255).min(255) as u8;
    }
}

fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}
