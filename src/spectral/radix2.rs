use super::Dft;
use num_complex::Complex32;
use std::f32::consts::PI;

fn w(k: usize, n: usize) -> Complex32 {
    let angle = -2.0 * PI * (k as f32) / (n as f32);
    Complex32::from_polar(1.0, angle)
}

//
// Iterative radix-2 (Cooley–Tukey) implementation for power-of-two sizes.
//
pub struct DftRadix2 {
    n: usize,
    levels: u32,
    wtable: Vec<Complex32>,
}

impl DftRadix2 {
    pub fn new(n: usize) -> Self {
        assert!(n.is_power_of_two(), "DftRadix2 requires a power-of-two size");

        //
        // Precompute twiddle values for half the transform length.
        //
        let mut wtable = Vec::with_capacity(n / 2);
        for k in 0..n / 2 {
            wtable.push(w(k, n));
        }

        Self {
            n,
            levels: n.trailing_zeros(),
            wtable,
        }
    }
}

fn bit_reverse(mut index: usize, bits: u32) -> usize {
    let mut reversed = 0;
    for _ in 0..bits {
        reversed = (reversed << 1) | (index & 1);
        index >>= 1;
    }
    reversed
}

impl Dft for DftRadix2 {
    fn name(&self) -> String {
        format!("Radix2({})", self.n)
    }

    fn size(&self) -> usize {
        self.n
    }

    fn xform(&self, input: &[Complex32], output: &mut [Complex32]) {
        let n = self.n;

        //
        // Bit-reversal reordering into the output buffer.
        //
        if n == 1 {
            output[0] = input[0];
            return;
        }
        for (i, &value) in input.iter().enumerate().take(n) {
            output[bit_reverse(i, self.levels)] = value;
        }

        //
        // Butterfly passes of doubling span.
        //
        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size; // twiddle table step for this pass

            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let tw = self.wtable[k * stride];
                    let a = output[start + k];
                    let b = output[start + k + half] * tw;
                    output[start + k] = a + b;
                    output[start + k + half] = a - b;
                }
            }
            size <<= 1;
        }
    }
}
