use super::Dft;
use fftw::plan::{C2CPlan, C2CPlan32};
use fftw::types::{Flag, Sign};
use num_complex::Complex32;
use parking_lot::Mutex;

/// FFTW3 wrapper providing a dedicated internal buffer and plan.
/// The internal state is guarded by a mutex because FFTW plan/buffer
/// combinations are not thread-safe under concurrent writes.
pub struct DftFftw {
    n: usize,
    state: Mutex<InternalState>,
}

struct InternalState {
    plan: C2CPlan32,

    //
    // Dedicated input/output buffers reused across transforms.
    //
    buf_in: Vec<Complex32>,
    buf_out: Vec<Complex32>,
}

impl DftFftw {
    pub fn new(n: usize) -> Self {
        let mut buf_in = vec![Complex32::default(); n];
        let mut buf_out = vec![Complex32::default(); n];

        //
        // Create a forward plan with MEASURE.
        //
        let plan = C2CPlan32::new(&[n], &mut buf_in, &mut buf_out, Sign::Forward, Flag::MEASURE)
            .expect("Failed to create FFTW plan");

        Self {
            n,
            state: Mutex::new(InternalState {
                plan,
                buf_in,
                buf_out,
            }),
        }
    }
}

impl Dft for DftFftw {
    fn name(&self) -> String {
        format!("FFTW({})", self.n)
    }

    fn size(&self) -> usize {
        self.n
    }

    fn xform(&self, input: &[Complex32], output: &mut [Complex32]) {
        let mut state = self.state.lock();
        let InternalState {
            plan,
            buf_in,
            buf_out,
        } = &mut *state;

        buf_in.copy_from_slice(&input[..self.n]);
        plan.c2c(buf_in, buf_out).expect("FFTW exec failed");
        output[..self.n].copy_from_slice(buf_out);
    }
}
