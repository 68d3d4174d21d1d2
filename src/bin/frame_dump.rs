use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use retro_visualizer::audio::{FeatureSource, amplitude_to_byte};
use retro_visualizer::config::{DrawParams, MAX_WINDOW, MIN_WINDOW, SampleMode};
use retro_visualizer::sampler::FrameSampler;
use retro_visualizer::state::AnimationState;
use retro_visualizer::surface::Surface;
use retro_visualizer::visual::{EffectsPipeline, OverlayScene, SceneStyle};

const DEFAULT_SEED: u64 = 0x5245_5452;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "frame_dump",
    version,
    about = "Offline scene render (synthetic audio sweep -> numbered PPM frames)"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "DIR", default_value = "frames")]
    pub(crate) out: PathBuf,

    #[arg(long, default_value_t = 640)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 360)]
    pub(crate) height: usize,

    #[arg(long, default_value_t = 120)]
    pub(crate) frames: u32,

    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    #[arg(long, default_value_t = 256)]
    pub(crate) window: usize,

    #[arg(long, value_enum, default_value_t = SampleMode::Frequency)]
    pub(crate) mode: SampleMode,

    #[arg(long, default_value_t = 0.25)]
    pub(crate) scroll_speed: f32,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub(crate) seed: u64,

    #[arg(long, default_value_t = false)]
    pub(crate) noise: bool,

    #[arg(long, default_value_t = false)]
    pub(crate) invert: bool,

    #[arg(long, default_value_t = false)]
    pub(crate) grayscale: bool,

    #[arg(long, default_value_t = false)]
    pub(crate) emboss: bool,
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 {
        bail!("--width must be >= 1");
    }
    if args.height == 0 {
        bail!("--height must be >= 1");
    }
    if args.frames == 0 {
        bail!("--frames must be >= 1");
    }
    if args.fps == 0 {
        bail!("--fps must be >= 1");
    }
    if !(MIN_WINDOW..=MAX_WINDOW).contains(&args.window) {
        bail!("--window must be in {MIN_WINDOW}..={MAX_WINDOW}");
    }
    if !args.window.is_power_of_two() {
        bail!("--window must be a power of two");
    }
    Ok(())
}

/// Deterministic stand-in for live capture: a spectral bump that sweeps
/// from low to high bins over the run, plus a sine for the time domain.
pub(crate) struct SweepSource {
    frame_len: usize,
    total_frames: u32,
    frame: u32,
}

impl SweepSource {
    pub(crate) fn new(frame_len: usize, total_frames: u32) -> Self {
        Self {
            frame_len,
            total_frames: total_frames.max(1),
            frame: 0,
        }
    }

    pub(crate) fn set_frame(&mut self, frame: u32) {
        self.frame = frame;
    }

    fn t(&self) -> f32 {
        self.frame as f32 / self.total_frames as f32
    }
}

impl FeatureSource for SweepSource {
    fn fill_frequency_domain(&self, out: &mut [u8]) {
        let n = self.frame_len.max(1) as f32;
        let center = self.t() * n;
        for (i, slot) in out.iter_mut().enumerate() {
            let d = (i as f32 - center) / (n * 0.06);
            let bump = (-d * d).exp();
            let floor = 0.25 * (1.0 - i as f32 / n);
            *slot = ((bump + floor).min(1.0) * 255.0).round() as u8;
        }
    }

    fn fill_time_domain(&self, out: &mut [u8]) {
        let n = self.frame_len.max(1) as f32;
        let phase = self.t() * std::f32::consts::TAU * 3.0;
        for (i, slot) in out.iter_mut().enumerate() {
            let x = i as f32 / n;
            let s = (x * std::f32::consts::TAU * 2.0 + phase).sin() * 0.8;
            *slot = amplitude_to_byte(s);
        }
    }

    fn progress(&self) -> Option<f32> {
        Some(self.t())
    }
}

fn write_ppm(path: &Path, width: usize, height: usize, rgba: &[u8]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write!(out, "P6\n{width} {height}\n255\n")?;
    for px in rgba.chunks_exact(4) {
        out.write_all(&px[..3])?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;

    fs::create_dir_all(&args.out)
        .with_context(|| format!("create output directory {}", args.out.display()))?;

    let frame_len = args.window / 2;
    let mut sampler = FrameSampler::new(frame_len);
    let mut state = AnimationState::new(args.mode);
    let scene = OverlayScene::new(SceneStyle::default());
    let mut effects = EffectsPipeline::with_seed(args.seed);
    let mut surface = Surface::new(args.width, args.height);

    let params = DrawParams {
        noise: args.noise,
        invert_colors: args.invert,
        grayscale: args.grayscale,
        emboss: args.emboss,
        ..DrawParams::default()
    };

    let dt = 1.0 / args.fps as f32;
    let mut source = SweepSource::new(frame_len, args.frames);

    for i in 0..args.frames {
        source.set_frame(i);
        state.advance(args.scroll_speed * dt);

        let samples = sampler.sample(&source, args.mode);
        let progress = source.progress().unwrap_or(0.0);
        scene.compose(&mut surface, samples, &state, &params, progress);
        effects.apply(surface.pixels_mut(), args.width, args.height, &params);

        let path = args.out.join(format!("frame_{i:05}.ppm"));
        write_ppm(&path, args.width, args.height, surface.pixels())?;
    }

    println!(
        "wrote {} frames ({}x{}) -> {}",
        args.frames,
        args.width,
        args.height,
        args.out.display()
    );
    Ok(())
}
