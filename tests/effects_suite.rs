use retro_visualizer::config::DrawParams;
use retro_visualizer::visual::{EffectsPipeline, NOISE_DENSITY};

/// Params with every overlay and effect off.
fn all_off() -> DrawParams {
    DrawParams {
        gradient: false,
        bars: false,
        emblem: false,
        curve: false,
        grid: false,
        noise: false,
        invert_colors: false,
        grayscale: false,
        emboss: false,
    }
}

/// Buffer of identical RGBA pixels.
fn solid(w: usize, h: usize, rgba: [u8; 4]) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
    buf
}

/// Buffer from per-pixel gray values, alpha 255.
fn gray_grid(values: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for &v in values {
        buf.extend_from_slice(&[v, v, v, 255]);
    }
    buf
}

// ── Invert ──────────────────────────────────────────────────────────────────

#[test]
fn invert_twice_is_identity() {
    let mut buf: Vec<u8> = (0..64u8).flat_map(|i| [i, 255 - i, i * 3, 200]).collect();
    let original = buf.clone();
    let params = DrawParams {
        invert_colors: true,
        ..all_off()
    };
    let mut fx = EffectsPipeline::new();
    fx.apply(&mut buf, 8, 8, &params);
    assert_ne!(buf, original, "one inversion must change the buffer");
    fx.apply(&mut buf, 8, 8, &params);
    assert_eq!(buf, original, "double inversion must restore the buffer");
}

#[test]
fn invert_leaves_alpha_untouched() {
    let mut buf = solid(4, 4, [10, 20, 30, 77]);
    let params = DrawParams {
        invert_colors: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 4, 4, &params);
    for px in buf.chunks_exact(4) {
        assert_eq!(&px[..3], &[245, 235, 225]);
        assert_eq!(px[3], 77, "alpha must pass through");
    }
}

// ── Grayscale ───────────────────────────────────────────────────────────────

#[test]
fn grayscale_equalizes_channels() {
    let mut buf: Vec<u8> = (0..32u8).flat_map(|i| [i * 7, i * 3, 255 - i, 255]).collect();
    let params = DrawParams {
        grayscale: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 8, 4, &params);
    for px in buf.chunks_exact(4) {
        assert_eq!(px[0], px[1], "R and G must match after grayscale");
        assert_eq!(px[1], px[2], "G and B must match after grayscale");
        assert_eq!(px[3], 255);
    }
}

#[test]
fn grayscale_uses_integer_average() {
    let mut buf = solid(1, 1, [10, 20, 31, 255]);
    let params = DrawParams {
        grayscale: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 1, 1, &params);
    // (10 + 20 + 31) / 3 = 20 with integer division.
    assert_eq!(&buf[..4], &[20, 20, 20, 255]);
}

// ── Effect ordering ─────────────────────────────────────────────────────────

#[test]
fn invert_feeds_grayscale_in_order() {
    // (10,20,30) inverts to (245,235,225), whose average is 235.
    let mut buf = solid(1, 1, [10, 20, 30, 255]);
    let params = DrawParams {
        invert_colors: true,
        grayscale: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 1, 1, &params);
    assert_eq!(&buf[..4], &[235, 235, 235, 255]);

    // (10,20,30) gives 235 in either order; (10,20,32) gives 234 only when
    // grayscale reads the inverted pixel, so it pins the sub-order.
    let mut buf = solid(1, 1, [10, 20, 32, 255]);
    EffectsPipeline::new().apply(&mut buf, 1, 1, &params);
    assert_eq!(
        &buf[..4],
        &[234, 234, 234, 255],
        "grayscale must read the inverted pixel"
    );
}

// ── Emboss ──────────────────────────────────────────────────────────────────

#[test]
fn emboss_of_uniform_field_is_flat_127() {
    let mut buf = solid(8, 6, [90, 140, 200, 255]);
    let params = DrawParams {
        emboss: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 8, 6, &params);
    for px in buf.chunks_exact(4) {
        assert_eq!(&px[..3], &[127, 127, 127], "uniform field embosses to 127");
        assert_eq!(px[3], 255);
    }
}

#[test]
fn emboss_matches_hand_computed_grid() {
    // 2x2 grays:      100  50
    //                 200  25
    // scan order top-left first, neighbors clamped at the edges:
    //   (0,0): 127 + 2*100 - 50 - 200 = 77
    //   (1,0): 127 + 2*50  - 50 - 25  = 152   (right clamps to itself)
    //   (0,1): 127 + 2*200 - 25 - 200 = 302 -> 255 (below clamps to itself)
    //   (1,1): 127 + 2*25  - 25 - 25  = 127
    let mut buf = gray_grid(&[100, 50, 200, 25]);
    let params = DrawParams {
        emboss: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 2, 2, &params);
    let grays: Vec<u8> = buf.chunks_exact(4).map(|px| px[0]).collect();
    assert_eq!(grays, vec![77, 152, 255, 127]);
    for px in buf.chunks_exact(4) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 255, "emboss must not touch alpha");
    }
}

#[test]
fn emboss_clamps_both_directions() {
    // Dark pixel with bright neighbors underflows; bright pixel with dark
    // neighbors overflows.
    let mut buf = gray_grid(&[0, 255, 255, 0]);
    let params = DrawParams {
        emboss: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 2, 2, &params);
    // (0,0): 127 + 0 - 255 - 255 = -383 -> 0
    assert_eq!(buf[0], 0);
    // (1,0): 127 + 510 - 255 - 0 = 382 -> 255
    assert_eq!(buf[4], 255);
    for px in buf.chunks_exact(4) {
        assert_eq!(px[3], 255);
    }
}

#[test]
fn emboss_preserves_varied_alpha() {
    let mut buf = gray_grid(&[10, 250, 40, 180]);
    buf[3] = 11;
    buf[7] = 22;
    buf[11] = 33;
    buf[15] = 44;
    let params = DrawParams {
        emboss: true,
        ..all_off()
    };
    EffectsPipeline::new().apply(&mut buf, 2, 2, &params);
    assert_eq!([buf[3], buf[7], buf[11], buf[15]], [11, 22, 33, 44]);
}

// ── Noise ───────────────────────────────────────────────────────────────────

#[test]
fn noise_whitens_pixels_and_keeps_alpha() {
    let (w, h) = (64, 64);
    let mut buf = solid(w, h, [0, 0, 0, 9]);
    let params = DrawParams {
        noise: true,
        ..all_off()
    };
    EffectsPipeline::with_seed(1234).apply(&mut buf, w, h, &params);

    let mut hits = 0usize;
    for px in buf.chunks_exact(4) {
        assert_eq!(px[3], 9, "noise must not touch alpha");
        match &px[..3] {
            [0, 0, 0] => {}
            [255, 255, 255] => hits += 1,
            other => panic!("noise wrote a non-white pixel: {other:?}"),
        }
    }
    // Expect about NOISE_DENSITY of 4096 pixels; allow a wide band.
    let expected = (w * h) as f32 * NOISE_DENSITY;
    assert!(
        (hits as f32) > expected * 0.4 && (hits as f32) < expected * 2.0,
        "noise hit count {hits} implausible for density {NOISE_DENSITY}"
    );
}

#[test]
fn noise_is_deterministic_for_a_seed() {
    let params = DrawParams {
        noise: true,
        ..all_off()
    };
    let mut a = solid(32, 32, [5, 6, 7, 255]);
    let mut b = solid(32, 32, [5, 6, 7, 255]);
    EffectsPipeline::with_seed(42).apply(&mut a, 32, 32, &params);
    EffectsPipeline::with_seed(42).apply(&mut b, 32, 32, &params);
    assert_eq!(a, b, "same seed must produce the same speckle");

    let mut c = solid(32, 32, [5, 6, 7, 255]);
    EffectsPipeline::with_seed(43).apply(&mut c, 32, 32, &params);
    assert_ne!(a, c, "different seeds should produce different speckle");
}

// ── No-op ───────────────────────────────────────────────────────────────────

#[test]
fn disabled_effects_leave_the_buffer_alone() {
    let mut buf: Vec<u8> = (0..=255u8).flat_map(|i| [i, i ^ 0x5a, 255 - i, i]).collect();
    let original = buf.clone();
    EffectsPipeline::with_seed(7).apply(&mut buf, 16, 16, &all_off());
    assert_eq!(buf, original);
}
