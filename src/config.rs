use clap::{Parser, ValueEnum};
use std::fmt;

#[derive(Parser, Debug, Clone)]
#[command(name = "retro-visualizer", version, about = "Audio-reactive retrowave scene for the terminal")]
pub struct Config {
    /// Analysis window in samples (power of two). The spectrum frame holds
    /// half this many bytes.
    #[arg(long, default_value_t = 256)]
    pub window: usize,

    #[arg(long, value_enum, default_value_t = SampleMode::Frequency)]
    pub mode: SampleMode,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Grid scroll speed in cycles per second.
    #[arg(long, default_value_t = 0.25)]
    pub scroll_speed: f32,

    #[arg(long, default_value_t = 1.0)]
    pub bar_scale: f32,

    #[arg(long, default_value_t = 1.0)]
    pub emblem_scale: f32,

    /// Seconds per full sweep of the progress curve across the screen.
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    pub progress_cycle: f32,

    #[arg(long, default_value_t = false)]
    pub flip_emblem: bool,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Input device substring; default input device when unset.
    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub gradient: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub bars: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub emblem: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub curve: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub grid: bool,

    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub noise: bool,

    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub invert: bool,

    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub grayscale: bool,

    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub emboss: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleMode {
    #[value(alias = "freq", alias = "spectrum")]
    Frequency,
    #[value(alias = "wave", alias = "time")]
    Waveform,
}

impl SampleMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Waveform => "waveform",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Frequency => Self::Waveform,
            Self::Waveform => Self::Frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
}

/// The full set of per-frame draw toggles. Overlays draw in the composer's
/// fixed order; the four effect flags drive the post-composition passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawParams {
    pub gradient: bool,
    pub bars: bool,
    pub emblem: bool,
    pub curve: bool,
    pub grid: bool,
    pub noise: bool,
    pub invert_colors: bool,
    pub grayscale: bool,
    pub emboss: bool,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            gradient: true,
            bars: true,
            emblem: true,
            curve: true,
            grid: true,
            noise: false,
            invert_colors: false,
            grayscale: false,
            emboss: false,
        }
    }
}

pub const MIN_WINDOW: usize = 32;
pub const MAX_WINDOW: usize = 16384;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    WindowNotPowerOfTwo(usize),
    WindowOutOfRange(usize),
    NonPositiveProgressCycle(f32),
    ZeroFps,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindowNotPowerOfTwo(n) => {
                write!(f, "--window must be a power of two, got {n}")
            }
            Self::WindowOutOfRange(n) => write!(
                f,
                "--window must be within {MIN_WINDOW}..={MAX_WINDOW}, got {n}"
            ),
            Self::NonPositiveProgressCycle(v) => {
                write!(f, "--progress-cycle must be positive, got {v}")
            }
            Self::ZeroFps => write!(f, "--fps must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_WINDOW..=MAX_WINDOW).contains(&self.window) {
            return Err(ConfigError::WindowOutOfRange(self.window));
        }
        if !self.window.is_power_of_two() {
            return Err(ConfigError::WindowNotPowerOfTwo(self.window));
        }
        if !(self.progress_cycle > 0.0) {
            return Err(ConfigError::NonPositiveProgressCycle(self.progress_cycle));
        }
        if self.fps == 0 {
            return Err(ConfigError::ZeroFps);
        }
        Ok(())
    }

    /// AudioFrame length: half the analysis window.
    pub fn frame_len(&self) -> usize {
        self.window / 2
    }

    pub fn draw_params(&self) -> DrawParams {
        DrawParams {
            gradient: self.gradient,
            bars: self.bars,
            emblem: self.emblem,
            curve: self.curve,
            grid: self.grid,
            noise: self.noise,
            invert_colors: self.invert,
            grayscale: self.grayscale,
            emboss: self.emboss,
        }
    }
}
