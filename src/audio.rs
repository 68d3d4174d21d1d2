use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Byte-spectrum dynamic range: magnitudes at or below the floor map to 0,
/// at or above the ceiling to 255.
pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -30.0;
/// Exponential time smoothing applied to magnitudes between analysis frames.
pub const SMOOTHING: f32 = 0.8;

/// Per-frame audio interface consumed by the sampler. Implementations fill
/// caller-owned buffers and never allocate on the render path.
pub trait FeatureSource {
    /// Byte spectrum over the configured dB range.
    fn fill_frequency_domain(&self, out: &mut [u8]);
    /// Byte waveform; 128 is the silence midline.
    fn fill_time_domain(&self, out: &mut [u8]);
    /// Normalized progress in [0, 1); `None` until the source has produced
    /// its first analysis frame.
    fn progress(&self) -> Option<f32>;
}

/// Latest analysis frame shared between the analyzer thread and the render
/// loop. Seqlock: the sequence is odd while a write is in progress; readers
/// retry until they observe the same even value on both sides of the copy.
/// Sample bytes are packed four to an `AtomicU32` word.
pub struct ByteSpectrum {
    seq: AtomicU64,
    generation: AtomicU64,
    freq: Vec<AtomicU32>,
    wave: Vec<AtomicU32>,
    frame_len: usize,
}

impl ByteSpectrum {
    pub fn new(frame_len: usize) -> Self {
        let words = frame_len.div_ceil(4);
        Self {
            seq: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            freq: (0..words).map(|_| AtomicU32::new(0)).collect(),
            wave: (0..words).map(|_| AtomicU32::new(0)).collect(),
            frame_len,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Number of analysis frames published so far; 0 means silence-so-far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    pub fn store(&self, freq: &[u8], wave: &[u8]) {
        debug_assert_eq!(freq.len(), self.frame_len);
        debug_assert_eq!(wave.len(), self.frame_len);
        self.seq.fetch_add(1, Ordering::Release); // odd => write in progress
        store_packed(&self.freq, freq);
        store_packed(&self.wave, wave);
        self.generation.fetch_add(1, Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release); // even => stable
    }

    pub fn load_frequency(&self, out: &mut [u8]) {
        self.load(&self.freq, out);
    }

    pub fn load_time(&self, out: &mut [u8]) {
        self.load(&self.wave, out);
    }

    fn load(&self, words: &[AtomicU32], out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.frame_len);
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                continue;
            }
            load_packed(words, out);
            let v2 = self.seq.load(Ordering::Acquire);
            if v1 == v2 {
                return;
            }
        }
    }
}

fn store_packed(words: &[AtomicU32], bytes: &[u8]) {
    for (word, chunk) in words.iter().zip(bytes.chunks(4)) {
        let mut b = [0u8; 4];
        b[..chunk.len()].copy_from_slice(chunk);
        word.store(u32::from_le_bytes(b), Ordering::Relaxed);
    }
}

fn load_packed(words: &[AtomicU32], out: &mut [u8]) {
    for (word, chunk) in words.iter().zip(out.chunks_mut(4)) {
        let b = word.load(Ordering::Relaxed).to_le_bytes();
        chunk.copy_from_slice(&b[..chunk.len()]);
    }
}

/// Windowed FFT over a ring of capture samples, producing the byte spectrum
/// and byte waveform frames. Pure computation, no I/O; the capture thread
/// feeds it and tests drive it directly.
pub struct SpectrumAnalyzer {
    window: usize,
    frame_len: usize,
    hop: usize,
    scratch: Vec<f32>,
    write_pos: usize,
    filled: usize,
    since_hop: usize,
    hann: Vec<f32>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    frames: u64,
}

impl SpectrumAnalyzer {
    pub fn new(window: usize) -> Self {
        debug_assert!(window.is_power_of_two() && window >= 2);
        let frame_len = window / 2;
        let hann = (0..window)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / (window as f32)).cos())
            .collect::<Vec<_>>();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window);
        Self {
            window,
            frame_len,
            hop: frame_len,
            scratch: vec![0.0; window],
            write_pos: 0,
            filled: 0,
            since_hop: 0,
            hann,
            fft,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; window],
            smoothed: vec![0.0; frame_len],
            frames: 0,
        }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Analysis frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Feeds one capture sample; returns true when a full hop completed and
    /// the spectrum advanced.
    pub fn push_sample(&mut self, s: f32) -> bool {
        self.scratch[self.write_pos] = s;
        self.write_pos = (self.write_pos + 1) % self.window;
        if self.filled < self.window {
            self.filled += 1;
        }
        self.since_hop += 1;
        if self.filled == self.window && self.since_hop >= self.hop {
            self.since_hop = 0;
            self.process_window();
            return true;
        }
        false
    }

    /// Feeds a block of samples; returns true if any analysis frame fired.
    pub fn push(&mut self, samples: &[f32]) -> bool {
        let mut produced = false;
        for &s in samples {
            produced |= self.push_sample(s);
        }
        produced
    }

    fn process_window(&mut self) {
        let n = self.window;
        for i in 0..n {
            let s = self.scratch[(self.write_pos + i) % n];
            self.fft_buf[i].re = s * self.hann[i];
            self.fft_buf[i].im = 0.0;
        }
        self.fft.process(&mut self.fft_buf);
        for (i, c) in self.fft_buf.iter().take(self.frame_len).enumerate() {
            let mag = (c.re * c.re + c.im * c.im).sqrt() / n as f32;
            self.smoothed[i] = SMOOTHING * self.smoothed[i] + (1.0 - SMOOTHING) * mag;
        }
        self.frames += 1;
    }

    pub fn write_frequency_bytes(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.frame_len);
        for (dst, &m) in out.iter_mut().zip(&self.smoothed) {
            *dst = magnitude_to_byte(m);
        }
    }

    /// Writes the most recent `frame_len` capture samples as waveform bytes,
    /// oldest first.
    pub fn write_time_bytes(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.frame_len);
        let n = self.window;
        let start = (self.write_pos + n - self.frame_len) % n;
        for (i, dst) in out.iter_mut().enumerate() {
            *dst = amplitude_to_byte(self.scratch[(start + i) % n]);
        }
    }
}

/// Maps a normalized magnitude onto the configured dB range.
pub fn magnitude_to_byte(mag: f32) -> u8 {
    if mag <= 0.0 {
        return 0;
    }
    let db = 20.0 * mag.log10();
    let t = (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    (t.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Maps an amplitude in [-1, 1] onto [0, 255] with 128 at zero.
pub fn amplitude_to_byte(s: f32) -> u8 {
    (128.0 * (1.0 + s)).round().clamp(0.0, 255.0) as u8
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// Live capture source: cpal input stream mixed down to mono into a ring
/// buffer, drained by an analyzer thread that publishes byte frames.
pub struct AudioSystem {
    // Keep the stream alive for the full capture lifetime.
    _stream: cpal::Stream,
    stop: Arc<AtomicBool>,
    analyzer_handle: Option<thread::JoinHandle<()>>,
    spectrum: Arc<ByteSpectrum>,
    started_at: Instant,
    progress_cycle: f32,
    pub sample_rate_hz: u32,
}

impl AudioSystem {
    pub fn new(
        device_query: Option<&str>,
        window: usize,
        progress_cycle: f32,
    ) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb_capacity = (sample_rate_hz as usize).saturating_mul(4);
        let rb = HeapRb::<f32>::new(rb_capacity);
        let (mut prod, mut cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let spectrum = Arc::new(ByteSpectrum::new(window / 2));
        let spectrum_for_thread = Arc::clone(&spectrum);
        let stop_for_thread = Arc::clone(&stop);

        let err_fn = |err| eprintln!("audio stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };

        stream.play().context("start input stream")?;

        let analyzer_handle = thread::spawn(move || {
            analyze_loop(&mut cons, window, &stop_for_thread, &spectrum_for_thread)
        });

        Ok(Self {
            _stream: stream,
            stop,
            analyzer_handle: Some(analyzer_handle),
            spectrum,
            started_at: Instant::now(),
            progress_cycle,
            sample_rate_hz,
        })
    }

    pub fn spectrum(&self) -> Arc<ByteSpectrum> {
        Arc::clone(&self.spectrum)
    }
}

impl FeatureSource for AudioSystem {
    fn fill_frequency_domain(&self, out: &mut [u8]) {
        self.spectrum.load_frequency(out);
    }

    fn fill_time_domain(&self, out: &mut [u8]) {
        self.spectrum.load_time(out);
    }

    fn progress(&self) -> Option<f32> {
        if self.spectrum.generation() == 0 {
            return None;
        }
        let elapsed = self.started_at.elapsed().as_secs_f32();
        Some((elapsed / self.progress_cycle).fract())
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer_handle.take() {
            let _ = h.join();
        }
    }
}

fn select_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    let want = device_query.map(|s| s.to_lowercase());
    if let Some(want) = want.as_deref() {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        let mono = acc / channels as f32;
        let _ = prod.try_push(mono);
    }
}

fn analyze_loop(
    cons: &mut ringbuf::HeapCons<f32>,
    window: usize,
    stop: &AtomicBool,
    spectrum: &ByteSpectrum,
) {
    let mut analyzer = SpectrumAnalyzer::new(window);
    let mut freq = vec![0u8; analyzer.frame_len()];
    let mut wave = vec![0u8; analyzer.frame_len()];

    while !stop.load(Ordering::Relaxed) {
        let mut got_any = false;
        while let Some(s) = cons.try_pop() {
            got_any = true;
            if analyzer.push_sample(s) {
                analyzer.write_frequency_bytes(&mut freq);
                analyzer.write_time_bytes(&mut wave);
                spectrum.store(&freq, &wave);
            }
        }

        if !got_any {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
