use crate::audio::{AudioSystem, FeatureSource};
use crate::config::{Config, DrawParams, RendererMode};
use crate::render::{AsciiRenderer, Frame, HalfBlockRenderer, Renderer};
use crate::sampler::{FrameSampler, aggregate_energy};
use crate::state::AnimationState;
use crate::surface::Surface;
use crate::terminal::TerminalGuard;
use crate::visual::{EffectsPipeline, OverlayScene, SceneStyle};
use anyhow::{Context, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

pub fn run(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());

    let mut renderer: Box<dyn Renderer> = match cfg.renderer {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
    };
    let (px_w_mul, px_h_mul) = match cfg.renderer {
        RendererMode::HalfBlock => (1usize, 2usize),
        RendererMode::Ascii => (1usize, 1usize),
    };

    let audio = AudioSystem::new(cfg.device.as_deref(), cfg.window, cfg.progress_cycle)
        .with_context(|| format!("start audio capture (device={:?})", cfg.device))?;

    let mut params = cfg.draw_params();
    let mut state = AnimationState::new(cfg.mode);
    state.bar_height_scale = cfg.bar_scale.max(0.0);
    state.emblem_scale = cfg.emblem_scale.max(0.0);
    let mut scroll_speed = cfg.scroll_speed;

    let mut sampler = FrameSampler::new(cfg.frame_len());
    let mut scene = OverlayScene::new(SceneStyle {
        flip_emblem: cfg.flip_emblem,
        ..SceneStyle::default()
    });
    let mut effects = EffectsPipeline::new();
    let mut surface = Surface::new(0, 0);

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut show_hud = true;
    let mut show_help = false;
    let mut hud_rows = hud_rows_for_size(last_size, show_hud);

    let mut last_frame = Instant::now();
    let mut fps = FpsCounter::new();

    loop {
        let now = Instant::now();

        // Drain input events (non-blocking). Control-surface writes land
        // here and are visible to the frame below.
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let quit = handle_key(
                        k.code,
                        k.modifiers,
                        &mut params,
                        &mut state,
                        &mut scroll_speed,
                        scene.style_mut(),
                        &mut show_hud,
                        &mut show_help,
                    );
                    if quit {
                        return Ok(());
                    }
                    hud_rows = hud_rows_for_size(last_size, show_hud);
                }
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    hud_rows = hud_rows_for_size(last_size, show_hud);
                }
                _ => {}
            }
        }

        // Resize events can be missed in some terminals; re-check per frame.
        let sz = crossterm::terminal::size()?;
        if sz != last_size {
            last_size = sz;
            hud_rows = hud_rows_for_size(last_size, show_hud);
        }

        let dt = now.duration_since(last_frame).as_secs_f32().max(1e-6);
        last_frame = now;

        state.advance(scroll_speed * dt);
        let frame_samples = sampler.sample(&audio, state.sample_mode);
        let progress = audio.progress().unwrap_or(0.0);
        let energy = aggregate_energy(frame_samples);

        let (term_cols, term_rows) = last_size;
        let hud = if show_hud {
            build_hud(
                term_cols as usize,
                &state,
                &params,
                scroll_speed,
                progress,
                energy,
                renderer.name(),
                fps.fps(),
            )
        } else {
            String::new()
        };
        let target_hud_rows = hud_rows_for_text(term_rows, show_hud, &hud);
        if target_hud_rows != hud_rows {
            hud_rows = target_hud_rows;
        }
        let visual_rows = term_rows.saturating_sub(hud_rows).max(1);
        let w = (term_cols as usize).saturating_mul(px_w_mul);
        let h = (visual_rows as usize).saturating_mul(px_h_mul);

        surface.resize(w, h);
        scene.compose(&mut surface, frame_samples, &state, &params, progress);
        effects.apply(surface.pixels_mut(), w, h, &params);

        let overlay = if show_help {
            Some(help_popup_text())
        } else {
            None
        };

        let frame = Frame {
            term_cols,
            term_rows,
            visual_rows,
            pixel_width: w,
            pixel_height: h,
            pixels_rgba: surface.pixels(),
            hud: &hud,
            hud_rows,
            overlay,
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        // Frame pacing.
        let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);
        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    params: &mut DrawParams,
    state: &mut AnimationState,
    scroll_speed: &mut f32,
    style: &mut SceneStyle,
    show_hud: &mut bool,
    show_help: &mut bool,
) -> bool {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return true;
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => true,
        KeyCode::Char('g') => {
            params.gradient = !params.gradient;
            false
        }
        KeyCode::Char('b') => {
            params.bars = !params.bars;
            false
        }
        KeyCode::Char('e') => {
            params.emblem = !params.emblem;
            false
        }
        KeyCode::Char('c') => {
            params.curve = !params.curve;
            false
        }
        KeyCode::Char('r') => {
            params.grid = !params.grid;
            false
        }
        KeyCode::Char('n') => {
            params.noise = !params.noise;
            false
        }
        KeyCode::Char('v') => {
            params.invert_colors = !params.invert_colors;
            false
        }
        KeyCode::Char('y') => {
            params.grayscale = !params.grayscale;
            false
        }
        KeyCode::Char('m') => {
            params.emboss = !params.emboss;
            false
        }
        KeyCode::Char('w') => {
            state.sample_mode = state.sample_mode.toggled();
            false
        }
        KeyCode::Char('f') => {
            style.flip_emblem = !style.flip_emblem;
            false
        }
        KeyCode::Up => {
            state.bar_height_scale = (state.bar_height_scale + 0.1).min(4.0);
            false
        }
        KeyCode::Down => {
            state.bar_height_scale = (state.bar_height_scale - 0.1).max(0.0);
            false
        }
        KeyCode::Char(']') => {
            state.emblem_scale = (state.emblem_scale + 0.1).min(4.0);
            false
        }
        KeyCode::Char('[') => {
            state.emblem_scale = (state.emblem_scale - 0.1).max(0.0);
            false
        }
        KeyCode::Right => {
            *scroll_speed = (*scroll_speed + 0.05).min(2.0);
            false
        }
        KeyCode::Left => {
            *scroll_speed = (*scroll_speed - 0.05).max(-2.0);
            false
        }
        KeyCode::Char('i') | KeyCode::Char('I') => {
            *show_hud = !*show_hud;
            false
        }
        KeyCode::Char('?') | KeyCode::Char('/') | KeyCode::Char('h') | KeyCode::Char('H')
        | KeyCode::F(1) => {
            *show_help = !*show_help;
            false
        }
        _ => false,
    }
}

fn hud_rows_for_size(size: (u16, u16), show_hud: bool) -> u16 {
    if !show_hud {
        return 0;
    }
    let rows = size.1;
    if rows <= 1 {
        return 0;
    }
    (rows - 1).min(3)
}

fn hud_rows_for_text(term_rows: u16, show_hud: bool, hud: &str) -> u16 {
    if !show_hud {
        return 0;
    }
    let max_rows = term_rows.saturating_sub(1);
    let wanted = hud.lines().count() as u16;
    wanted.min(max_rows)
}

fn flag_char(on: bool, ch: char) -> char {
    if on {
        ch.to_ascii_uppercase()
    } else {
        ch.to_ascii_lowercase()
    }
}

#[allow(clippy::too_many_arguments)]
fn build_hud(
    cols: usize,
    state: &AnimationState,
    params: &DrawParams,
    scroll_speed: f32,
    progress: f32,
    energy: f32,
    renderer_name: &str,
    fps: f32,
) -> String {
    let overlays: String = [
        (params.gradient, 'g'),
        (params.bars, 'b'),
        (params.emblem, 'e'),
        (params.curve, 'c'),
        (params.grid, 'r'),
    ]
    .iter()
    .map(|&(on, ch)| flag_char(on, ch))
    .collect();
    let fx: String = [
        (params.noise, 'n'),
        (params.invert_colors, 'v'),
        (params.grayscale, 'y'),
        (params.emboss, 'm'),
    ]
    .iter()
    .map(|&(on, ch)| flag_char(on, ch))
    .collect();

    let logical_lines = vec![
        format!(
            "Mode: {} | Energy: {:>4.2} | Progress: {:>3.0}% | Overlays: {} | FX: {} | FPS: {:>4.1}",
            state.sample_mode.label(),
            energy,
            progress * 100.0,
            overlays,
            fx,
            fps,
        ),
        format!(
            "Scroll: {:>5.2} | Bars: x{:.1} | Emblem: x{:.1} | Renderer: {}",
            scroll_speed, state.bar_height_scale, state.emblem_scale, renderer_name
        ),
        "Keys: g/b/e/c/r overlays | n/v/y/m effects | w mode | up/down bars | [/] emblem | left/right scroll | f flip | i HUD | ?/h help | q quit"
            .to_string(),
    ];

    wrap_hud_lines(cols, &logical_lines).join("\n")
}

fn wrap_hud_lines(cols: usize, lines: &[String]) -> Vec<String> {
    let width = cols.max(1);
    let mut out = Vec::new();
    for line in lines {
        out.extend(hard_wrap_line(line, width));
    }
    out
}

fn hard_wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }

    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for ch in line.chars() {
        cur.push(ch);
        cur_len += 1;
        if cur_len >= width {
            out.push(cur);
            cur = String::new();
            cur_len = 0;
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn help_popup_text() -> &'static str {
    "Retro Visualizer Hotkeys\n\
g  toggle gradient wash\n\
b  toggle spectrum bars\n\
e  toggle sun emblem\n\
c  toggle progress curve\n\
r  toggle scroll grid\n\
n  toggle noise speckle\n\
v  toggle color inversion\n\
y  toggle grayscale\n\
m  toggle emboss relief\n\
w  switch sample mode (frequency/waveform)\n\
up/down  bar height scale\n\
[ / ]  emblem scale\n\
left/right  grid scroll speed\n\
f  flip emblem 180\n\
i  show/hide HUD\n\
? or / or h or F1  toggle this help\n\
q or esc  quit"
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
