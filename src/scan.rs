//! Incremental impulse-response scan of a reverb engine.
//!
//! The engine is excited with one block of white noise and then left to
//! decay on silence. Its output accumulates in a capture buffer; each
//! bitmap column windows a slice of that capture, transforms it, and
//! writes per-frequency alpha values into an RGBA raster. Work is metered
//! by a wall-clock budget so the scan can resume across UI frames.

use crate::axes::LogScale;
use crate::dsp::{DspEngine, PARAM_DRY_LEVEL};
use crate::spectral::{hann_window, RealDft};
use num_complex::Complex32;
use num_traits::Zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub const SAMPLE_RATE: u32 = 48000;
pub const WINDOW_SIZE: usize = 1024;

//
// Displayed axis bounds.
//
pub const MIN_SECONDS: f32 = 0.5;
pub const MAX_SECONDS: f32 = 8.0;
pub const MIN_FREQ: f32 = 50.0;
pub const MAX_FREQ: f32 = 22000.0;

// Transform magnitudes above this value all map to the same alpha.
const MAX_MAGNITUDE: f32 = 8.0;
const ALPHA_PER_UNIT: f32 = 30.0;

/// What the scan will do on its next unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// All columns computed; nothing to do until the next reset.
    Idle,
    /// The capture buffer is too short for the current column.
    Feeding,
    /// The capture buffer covers the current column's window.
    Analyzing,
}

/// Fixed excitation blocks fed to the engine: one block of white noise to
/// kick off the impulse response, silence afterwards. Generated once so a
/// rescan of unchanged parameters reproduces the exact same capture.
struct Excitation {
    white_noise: [Vec<f32>; 2],
    silence: [Vec<f32>; 2],
}

impl Excitation {
    fn new(block: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut channel = || -> Vec<f32> {
            (0..block).map(|_| rng.gen_range(-1.0f32..=1.0)).collect()
        };

        Self {
            white_noise: [channel(), channel()],
            silence: [vec![0.0; block], vec![0.0; block]],
        }
    }

    fn block(&self, first: bool) -> [&[f32]; 2] {
        if first {
            [&self.white_noise[0], &self.white_noise[1]]
        } else {
            [&self.silence[0], &self.silence[1]]
        }
    }
}

fn magnitude_to_alpha(value: f32) -> u8 {
    let mut value = value;
    if value < 0.0 {
        value = -value;
    }
    if value > MAX_MAGNITUDE {
        value = MAX_MAGNITUDE;
    }
    (value * ALPHA_PER_UNIT) as u8
}

pub struct DecayScan {
    engine: Box<dyn DspEngine>,
    excitation: Excitation,

    //
    // Analysis buffers, all sized once at construction.
    //
    window: Vec<f32>,
    dft: RealDft,
    capture: Vec<f32>,
    dsp_output: [Vec<f32>; 2],
    windowed: Vec<f32>,
    bins: Vec<Complex32>,

    //
    // Output raster and axis mapping.
    //
    raster: Vec<u8>,
    width: usize,
    height: usize,
    time_scale: LogScale,
    freq_scale: LogScale,
    dirty: bool,

    //
    // Cursor: next column to compute and how much of the capture buffer
    // is filled. `samples_processed` stays a multiple of WINDOW_SIZE.
    //
    column: usize,
    samples_processed: usize,
}

impl DecayScan {
    pub fn new(engine: Box<dyn DspEngine>, width: usize, height: usize) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(engine, width, height, seed)
    }

    /// Like `new`, but with a caller-chosen noise seed. Scans with the same
    /// engine, parameters and seed produce bit-identical rasters.
    pub fn with_seed(engine: Box<dyn DspEngine>, width: usize, height: usize, seed: u64) -> Self {
        assert!(width > 0 && height > 0);

        let time_scale = LogScale::new(MIN_SECONDS, MAX_SECONDS);
        let freq_scale = LogScale::new(MIN_FREQ, MAX_FREQ);

        //
        // The capture buffer must hold every feed block up to the last
        // column's window, which the feed criterion overshoots by at most
        // two blocks. Three spare blocks past the last offset cover it.
        //
        let last_offset =
            (time_scale.value_at(width - 1, width) * SAMPLE_RATE as f32) as usize;
        let capture_len = (last_offset / WINDOW_SIZE + 3) * WINDOW_SIZE;

        //
        // Raster starts as fully transparent white; analysis only ever
        // rewrites the alpha channel.
        //
        let mut raster = vec![0u8; width * height * 4];
        for pixel in raster.chunks_exact_mut(4) {
            pixel[0] = 255;
            pixel[1] = 255;
            pixel[2] = 255;
            pixel[3] = 0;
        }

        let dft = RealDft::new(WINDOW_SIZE);
        let bins = vec![Complex32::zero(); dft.bins()];

        let mut scan = Self {
            engine,
            excitation: Excitation::new(WINDOW_SIZE, seed),
            window: hann_window(WINDOW_SIZE),
            dft,
            capture: vec![0.0; capture_len],
            dsp_output: [vec![0.0; WINDOW_SIZE], vec![0.0; WINDOW_SIZE]],
            windowed: vec![0.0; WINDOW_SIZE],
            bins,
            raster,
            width,
            height,
            time_scale,
            freq_scale,
            dirty: false,
            column: 0,
            samples_processed: 0,
        };

        // The dry path would swamp the tail we are trying to measure.
        scan.set_parameter(PARAM_DRY_LEVEL, 0.0);
        scan
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn raster(&self) -> &[u8] {
        &self.raster
    }

    pub fn time_scale(&self) -> LogScale {
        self.time_scale
    }

    pub fn freq_scale(&self) -> LogScale {
        self.freq_scale
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn samples_processed(&self) -> usize {
        self.samples_processed
    }

    /// True once the raster changed since the last call; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// First capture-buffer sample of `column`'s analysis window.
    pub fn sample_offset(&self, column: usize) -> usize {
        (self.time_scale.value_at(column, self.width) * SAMPLE_RATE as f32) as usize
    }

    pub fn state(&self) -> ScanState {
        if self.column >= self.width {
            ScanState::Idle
        } else if self.samples_processed < self.sample_offset(self.column) + WINDOW_SIZE * 2 {
            ScanState::Feeding
        } else {
            ScanState::Analyzing
        }
    }

    /// Forward a parameter change to the engine and restart the scan.
    /// Index 0 is the dry level and is forced to 0 so the dry path never
    /// shows up in the measurement. The capture buffer is reused in place;
    /// stale samples past the cursor are rewritten before they are read.
    pub fn set_parameter(&mut self, index: u32, value: f32) {
        let value = if index == PARAM_DRY_LEVEL { 0.0 } else { value };
        self.engine.set_parameter(index, value);
        self.engine.mute();
        self.column = 0;
        self.samples_processed = 0;
    }

    /// Run units of work until the budget elapses or the scan is idle.
    /// The deadline is checked only between units, so a tick overruns by
    /// at most one feed block or one column.
    pub fn tick(&mut self, budget: Duration) {
        let deadline = Instant::now() + budget;
        while self.column < self.width && Instant::now() < deadline {
            self.step();
        }
    }

    /// Perform one unit of work and report which kind it was.
    pub fn step(&mut self) -> ScanState {
        let state = self.state();
        match state {
            ScanState::Idle => {}
            ScanState::Feeding => self.feed_block(),
            ScanState::Analyzing => self.analyze_column(),
        }
        state
    }

    fn feed_block(&mut self) {
        //
        // White noise only for the very first block; every later block is
        // silence, letting the engine decay freely.
        //
        let inputs = self.excitation.block(self.samples_processed == 0);
        let [left, right] = &mut self.dsp_output;
        self.engine.run(inputs, [left, right], WINDOW_SIZE);

        //
        // Only channel 0 is captured for analysis.
        //
        let start = self.samples_processed;
        self.capture[start..start + WINDOW_SIZE].copy_from_slice(&self.dsp_output[0]);
        self.samples_processed += WINDOW_SIZE;
    }

    fn analyze_column(&mut self) {
        let offset = self.sample_offset(self.column);
        debug_assert!(offset + WINDOW_SIZE <= self.samples_processed);

        for i in 0..WINDOW_SIZE {
            self.windowed[i] = self.capture[offset + i] * self.window[i];
        }
        self.dft.process(&self.windowed, &mut self.bins);

        // Integer bin width: freq / (rate / window), offset by one.
        let bin_width = (SAMPLE_RATE as usize / WINDOW_SIZE) as f32;

        for y in 0..self.height {
            let freq = self.freq_scale.value_at(y, self.height);
            let bin = (freq / bin_width) as usize + 1;

            // Deliberate quirk: the displayed level is the real component
            // of the bin, not sqrt(re^2+im^2). See DESIGN.md.
            let alpha = magnitude_to_alpha(self.bins[bin].re);

            let pixel = (self.height - y - 1) * self.width + self.column;
            self.raster[pixel * 4 + 3] = alpha;
        }

        self.dirty = true;
        self.column += 1;

        if self.column == self.width {
            log::debug!(
                "scan complete: {} columns from {} captured samples",
                self.width,
                self.samples_processed
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::hall::HallReverb;
    use crate::dsp::PARAM_DECAY;
    use std::f32::consts::PI;

    const WIDTH: usize = 40;
    const HEIGHT: usize = 30;

    /// Feedback delay line: deterministic, cheap, and decays forever.
    struct EchoEngine {
        delay: Vec<f32>,
        pos: usize,
    }

    impl EchoEngine {
        fn new() -> Self {
            Self {
                delay: vec![0.0; 3001],
                pos: 0,
            }
        }
    }

    impl DspEngine for EchoEngine {
        fn run(&mut self, inputs: [&[f32]; 2], outputs: [&mut [f32]; 2], frames: usize) {
            let [left_in, _] = inputs;
            let [left_out, right_out] = outputs;
            for i in 0..frames {
                let echo = self.delay[self.pos];
                let out = left_in[i] + echo * 0.7;
                self.delay[self.pos] = out;
                self.pos = (self.pos + 1) % self.delay.len();
                left_out[i] = out;
                right_out[i] = out;
            }
        }

        fn set_parameter(&mut self, _index: u32, _value: f32) {}

        fn mute(&mut self) {
            self.delay.fill(0.0);
            self.pos = 0;
        }
    }

    fn echo_scan() -> DecayScan {
        DecayScan::with_seed(Box::new(EchoEngine::new()), WIDTH, HEIGHT, 7)
    }

    #[test]
    fn sample_offsets_are_monotone() {
        let scan = echo_scan();
        let mut previous = 0;
        for column in 0..WIDTH {
            let offset = scan.sample_offset(column);
            assert!(offset >= previous, "offset regressed at column {}", column);
            previous = offset;
        }
    }

    #[test]
    fn starts_feeding_after_reset() {
        let mut scan = echo_scan();
        assert_eq!(scan.column(), 0);
        assert_eq!(scan.samples_processed(), 0);
        assert_eq!(scan.state(), ScanState::Feeding);

        // Make progress, then reset mid-scan.
        for _ in 0..50 {
            scan.step();
        }
        assert!(scan.samples_processed() > 0);

        scan.set_parameter(PARAM_DECAY, 3.0);
        assert_eq!(scan.column(), 0);
        assert_eq!(scan.samples_processed(), 0);
        assert_eq!(scan.state(), ScanState::Feeding);
    }

    #[test]
    fn analysis_never_reads_past_the_capture_cursor() {
        let mut scan = echo_scan();
        loop {
            if scan.state() == ScanState::Analyzing {
                assert!(scan.sample_offset(scan.column()) + WINDOW_SIZE <= scan.samples_processed());
            }
            if scan.step() == ScanState::Idle {
                break;
            }
        }
        assert_eq!(scan.column(), WIDTH);
    }

    #[test]
    fn samples_processed_stays_block_aligned() {
        let mut scan = echo_scan();
        while scan.step() != ScanState::Idle {
            assert_eq!(scan.samples_processed() % WINDOW_SIZE, 0);
        }
    }

    #[test]
    fn expired_budget_allows_at_most_one_unit() {
        let mut scan = echo_scan();
        scan.tick(Duration::ZERO);

        // The deadline is checked between units only, so an already
        // expired budget still permits at most one unit of work.
        assert!(scan.samples_processed() <= WINDOW_SIZE);
        assert_eq!(scan.column(), 0);
    }

    #[test]
    fn repeated_scans_are_bit_identical() {
        let mut scan = DecayScan::with_seed(Box::new(HallReverb::new(48000.0)), WIDTH, HEIGHT, 42);

        while scan.step() != ScanState::Idle {}
        let first = scan.raster().to_vec();
        assert!(first.chunks_exact(4).any(|px| px[3] > 0), "raster stayed blank");

        // Re-applying the same parameter value restarts the scan without
        // changing the engine configuration.
        scan.set_parameter(PARAM_DECAY, 2.0);
        let mut rescan = DecayScan::with_seed(Box::new(HallReverb::new(48000.0)), WIDTH, HEIGHT, 42);
        rescan.set_parameter(PARAM_DECAY, 2.0);
        while rescan.step() != ScanState::Idle {}
        while scan.step() != ScanState::Idle {}

        assert_eq!(first, scan.raster());
        assert_eq!(first, rescan.raster());
    }

    #[test]
    fn alpha_mapping_clamps_and_mirrors() {
        assert_eq!(magnitude_to_alpha(0.0), 0);
        assert_eq!(magnitude_to_alpha(1.0), 30);
        assert_eq!(magnitude_to_alpha(-1.0), 30);
        assert_eq!(magnitude_to_alpha(8.0), 240);
        assert_eq!(magnitude_to_alpha(1000.0), 240);
        assert_eq!(magnitude_to_alpha(-1000.0), 240);
    }

    //
    // Frequency of the quadrature test tone, in cycles per analysis window.
    // Column 0's offset (0.5 s at 48 kHz = 24000 samples) is a whole number
    // of cycles for this bin, so the analyzed slice starts at phase zero and
    // the bin comes out almost purely imaginary.
    //
    const SINE_BIN: usize = 16;

    /// Ignores its input and emits a steady full-scale sine at `SINE_BIN`.
    struct SineEngine {
        position: usize,
    }

    impl DspEngine for SineEngine {
        fn run(&mut self, _inputs: [&[f32]; 2], outputs: [&mut [f32]; 2], frames: usize) {
            let [left_out, right_out] = outputs;
            for i in 0..frames {
                // Reduce before the float conversion; the tone repeats
                // every WINDOW_SIZE samples, so the modulo is exact.
                let step = (self.position + i) % WINDOW_SIZE;
                let sample =
                    (2.0 * PI * SINE_BIN as f32 * step as f32 / WINDOW_SIZE as f32).sin();
                left_out[i] = sample;
                right_out[i] = sample;
            }
            self.position += frames;
        }

        fn set_parameter(&mut self, _index: u32, _value: f32) {}

        fn mute(&mut self) {
            self.position = 0;
        }
    }

    #[test]
    fn alpha_readout_uses_real_component_not_magnitude() {
        let mut scan =
            DecayScan::with_seed(Box::new(SineEngine { position: 0 }), WIDTH, HEIGHT, 7);
        while scan.column() < 1 {
            scan.step();
        }

        //
        // Every display row that lands on the tone's bin must stay dark in
        // column 0: the bin's energy is in quadrature there, so its real
        // component is near zero even though its magnitude is huge.
        //
        let bin_width = (SAMPLE_RATE as usize / WINDOW_SIZE) as f32;
        let mut rows_on_bin = 0;
        for y in 0..HEIGHT {
            let freq = scan.freq_scale().value_at(y, HEIGHT);
            if (freq / bin_width) as usize + 1 != SINE_BIN {
                continue;
            }
            rows_on_bin += 1;
            let alpha = scan.raster()[(HEIGHT - y - 1) * WIDTH * 4 + 3];
            assert!(alpha < 10, "row {} rendered alpha {} from a quadrature bin", y, alpha);
        }
        assert!(rows_on_bin > 0, "no display row maps to bin {}", SINE_BIN);

        //
        // Reconstruct the exact slice the scan analyzed and confirm a
        // magnitude readout would have rendered those rows fully bright.
        //
        let offset = scan.sample_offset(0);
        let window = hann_window(WINDOW_SIZE);
        let windowed: Vec<f32> = (0..WINDOW_SIZE)
            .map(|i| {
                let step = (offset + i) % WINDOW_SIZE;
                (2.0 * PI * SINE_BIN as f32 * step as f32 / WINDOW_SIZE as f32).sin() * window[i]
            })
            .collect();

        let mut dft = RealDft::new(WINDOW_SIZE);
        let mut bins = vec![Complex32::zero(); dft.bins()];
        dft.process(&windowed, &mut bins);

        assert!(bins[SINE_BIN].norm() > 100.0);
        assert!(bins[SINE_BIN].re.abs() < 1.0);
        assert_eq!(magnitude_to_alpha(bins[SINE_BIN].norm()), 240);
    }

    #[test]
    fn raster_rgb_stays_white() {
        let mut scan = echo_scan();
        while scan.step() != ScanState::Idle {}
        for pixel in scan.raster().chunks_exact(4) {
            assert_eq!(&pixel[..3], &[255, 255, 255]);
        }
    }
}
