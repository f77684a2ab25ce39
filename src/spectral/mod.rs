#[cfg(feature = "use_fftw")]
pub mod fftw;
pub mod radix2;

use lazy_static::lazy_static;
use num_complex::Complex32;
use num_traits::Zero;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::f32::consts::PI;
use std::sync::Arc;

/// Base interface for all DFT implementations.
pub trait Dft: Send + Sync {
    /// Single forward transform using contiguous input/output.
    fn xform(&self, input: &[Complex32], output: &mut [Complex32]);

    /// Default in-place transform: temporary buffer copy.
    fn xform_inplace(&self, buffer: &mut [Complex32]) {
        let temp = buffer.to_vec();
        self.xform(&temp, buffer);
    }

    fn name(&self) -> String;
    fn size(&self) -> usize;
}

lazy_static! {
    static ref PLAN_CACHE: Mutex<HashMap<usize, Arc<dyn Dft>>> = Mutex::new(HashMap::new());
}

/// Returns a DFT plan for size `n`, using caching and backend selection.
/// `n` must be a power of two.
pub fn find_dft(n: usize) -> Arc<dyn Dft> {
    //
    // Cached plan lookup.
    //
    {
        let cache = PLAN_CACHE.lock();
        if let Some(plan) = cache.get(&n) {
            return plan.clone();
        }
    }

    //
    // Backend selection.
    //
    let plan: Arc<dyn Dft> = if cfg!(feature = "use_fftw") {
        #[cfg(feature = "use_fftw")]
        {
            Arc::new(fftw::DftFftw::new(n))
        }
        #[cfg(not(feature = "use_fftw"))]
        {
            unreachable!()
        }
    } else {
        Arc::new(radix2::DftRadix2::new(n))
    };

    //
    // Cache the plan.
    //
    let mut cache = PLAN_CACHE.lock();
    cache.insert(n, plan.clone());
    plan
}

/// Hann window coefficients, per https://en.wikipedia.org/wiki/Hann_function
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((PI * i as f32) / (n - 1) as f32).sin().powi(2))
        .collect()
}

/// Real-input forward transform producing `n/2 + 1` complex bins.
///
/// Packs the real samples into a zero-imaginary complex buffer, runs the
/// full complex transform, and keeps the non-redundant lower half. Scratch
/// buffers are owned so repeated calls allocate nothing.
pub struct RealDft {
    n: usize,
    dft: Arc<dyn Dft>,
    time: Vec<Complex32>,
    freq: Vec<Complex32>,
}

impl RealDft {
    pub fn new(n: usize) -> Self {
        assert!(n.is_power_of_two(), "RealDft size must be a power of two");
        Self {
            n,
            dft: find_dft(n),
            time: vec![Complex32::zero(); n],
            freq: vec![Complex32::zero(); n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Number of output bins: `n/2 + 1`.
    pub fn bins(&self) -> usize {
        self.n / 2 + 1
    }

    pub fn name(&self) -> String {
        format!("Real[{}]", self.dft.name())
    }

    /// Forward transform of `input` (length `n`) into `output`
    /// (length `n/2 + 1`).
    pub fn process(&mut self, input: &[f32], output: &mut [Complex32]) {
        assert_eq!(input.len(), self.n);
        assert_eq!(output.len(), self.bins());

        for (slot, &sample) in self.time.iter_mut().zip(input) {
            *slot = Complex32::new(sample, 0.0);
        }

        self.dft.xform(&self.time, &mut self.freq);
        output.copy_from_slice(&self.freq[..self.n / 2 + 1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_cache_returns_same_plan() {
        let a = find_dft(64);
        let b = find_dft(64);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.size(), 64);
    }

    #[test]
    fn hann_window_shape() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);

        // Endpoints are zero, center is unity.
        assert!(w[0].abs() < 1e-6);
        assert!(w[1023].abs() < 1e-6);
        assert!((w[511] - 1.0).abs() < 1e-3);

        // Symmetric taper.
        for i in 0..512 {
            assert!((w[i] - w[1023 - i]).abs() < 1e-5);
        }
    }

    #[test]
    fn real_dft_sine_peaks_at_its_bin() {
        let n = 256;
        let bin = 12;
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / n as f32).sin())
            .collect();

        let mut dft = RealDft::new(n);
        let mut out = vec![Complex32::zero(); dft.bins()];
        dft.process(&signal, &mut out);

        let norms: Vec<f32> = out.iter().map(|c| c.norm()).collect();
        let peak = norms
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak, bin);

        // A pure sine concentrates in one bin; neighbors stay small.
        assert!(norms[bin] > 100.0);
        assert!(norms[bin + 3] < 1.0);
    }

    #[test]
    fn real_dft_impulse_is_flat() {
        let n = 64;
        let mut signal = vec![0.0f32; n];
        signal[0] = 1.0;

        let mut dft = RealDft::new(n);
        let mut out = vec![Complex32::zero(); dft.bins()];
        dft.process(&signal, &mut out);

        for bin in &out {
            assert!((bin.re - 1.0).abs() < 1e-4);
            assert!(bin.im.abs() < 1e-4);
        }
    }
}
