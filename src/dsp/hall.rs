use super::{DspEngine, PARAM_DAMPEN, PARAM_DECAY, PARAM_DRY_LEVEL, PARAM_WET_LEVEL};

//
// Schroeder reverberator: four parallel damped combs feeding two series
// allpasses per channel. Delay lengths are mutually coprime, chosen for a
// 48 kHz rate; the right channel is offset to decorrelate the ears.
//
const COMB_TUNINGS: [usize; 4] = [1687, 1601, 1423, 1277];
const ALLPASS_TUNINGS: [usize; 2] = [347, 113];
const STEREO_SPREAD: usize = 23;
const ALLPASS_GAIN: f32 = 0.5;

struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl Comb {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            pos: 0,
            feedback: 0.5,
            damp: 0.2,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.pos];

        // One-pole lowpass in the feedback path dampens highs faster.
        self.filter_state = out * (1.0 - self.damp) + self.filter_state * self.damp;

        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
    }
}

struct Allpass {
    buffer: Vec<f32>,
    pos: usize,
}

impl Allpass {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let out = delayed - input;
        self.buffer[self.pos] = input + delayed * ALLPASS_GAIN;
        self.pos = (self.pos + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

pub struct HallReverb {
    sample_rate: f32,
    dry_level: f32,
    wet_level: f32,
    decay_seconds: f32,
    combs: [Vec<Comb>; 2],
    allpasses: [Vec<Allpass>; 2],
}

impl HallReverb {
    pub fn new(sample_rate: f32) -> Self {
        let channel_combs = |spread: usize| -> Vec<Comb> {
            COMB_TUNINGS.iter().map(|&len| Comb::new(len + spread)).collect()
        };
        let channel_allpasses = |spread: usize| -> Vec<Allpass> {
            ALLPASS_TUNINGS
                .iter()
                .map(|&len| Allpass::new(len + spread))
                .collect()
        };

        let mut reverb = Self {
            sample_rate,
            dry_level: 0.5,
            wet_level: 0.5,
            decay_seconds: 2.0,
            combs: [channel_combs(0), channel_combs(STEREO_SPREAD)],
            allpasses: [channel_allpasses(0), channel_allpasses(STEREO_SPREAD)],
        };
        reverb.update_feedback();
        reverb
    }

    /// Comb feedback from the RT60 relation: a loop of `d` samples decays by
    /// 60 dB over `decay_seconds` when its gain is 10^(-3 d / (sr * decay)).
    fn update_feedback(&mut self) {
        for channel in &mut self.combs {
            for comb in channel {
                let loop_seconds = comb.buffer.len() as f32 / self.sample_rate;
                comb.feedback = 10.0f32.powf(-3.0 * loop_seconds / self.decay_seconds);
            }
        }
    }

    fn set_damp(&mut self, damp: f32) {
        let damp = damp.clamp(0.0, 0.99);
        for channel in &mut self.combs {
            for comb in channel {
                comb.damp = damp;
            }
        }
    }
}

impl DspEngine for HallReverb {
    fn run(&mut self, inputs: [&[f32]; 2], outputs: [&mut [f32]; 2], frames: usize) {
        let [left_in, right_in] = inputs;
        let [left_out, right_out] = outputs;

        for i in 0..frames {
            let dry = [left_in[i], right_in[i]];
            let mut wet = [0.0f32; 2];

            for ch in 0..2 {
                let mut sum = 0.0;
                for comb in &mut self.combs[ch] {
                    sum += comb.process(dry[ch]);
                }
                for allpass in &mut self.allpasses[ch] {
                    sum = allpass.process(sum);
                }
                wet[ch] = sum * 0.25;
            }

            left_out[i] = dry[0] * self.dry_level + wet[0] * self.wet_level;
            right_out[i] = dry[1] * self.dry_level + wet[1] * self.wet_level;
        }
    }

    fn set_parameter(&mut self, index: u32, value: f32) {
        match index {
            PARAM_DRY_LEVEL => self.dry_level = value.clamp(0.0, 1.0),
            PARAM_WET_LEVEL => self.wet_level = value.clamp(0.0, 1.0),
            PARAM_DECAY => {
                self.decay_seconds = value.clamp(0.1, 10.0);
                self.update_feedback();
            }
            PARAM_DAMPEN => self.set_damp(value),
            _ => log::warn!("HallReverb: unknown parameter index {}", index),
        }
    }

    fn mute(&mut self) {
        for channel in &mut self.combs {
            for comb in channel {
                comb.clear();
            }
        }
        for channel in &mut self.allpasses {
            for allpass in channel {
                allpass.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_tail(reverb: &mut HallReverb, blocks: usize, block: usize) -> Vec<f32> {
        let mut impulse = vec![0.0f32; block];
        impulse[0] = 1.0;
        let silence = vec![0.0f32; block];
        let mut out_l = vec![0.0f32; block];
        let mut out_r = vec![0.0f32; block];

        let mut tail = Vec::new();
        for b in 0..blocks {
            let input = if b == 0 { &impulse } else { &silence };
            reverb.run([input, input], [&mut out_l, &mut out_r], block);
            tail.extend_from_slice(&out_l);
        }
        tail
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn tail_decays_over_time() {
        let mut reverb = HallReverb::new(48000.0);
        reverb.set_parameter(PARAM_DRY_LEVEL, 0.0);
        reverb.set_parameter(PARAM_DECAY, 1.0);

        let tail = impulse_tail(&mut reverb, 100, 1024);
        let early = energy(&tail[4096..8192]);
        let late = energy(&tail[80_000..84_096]);

        assert!(early > 0.0, "reverb produced no output");
        assert!(late < early * 0.1, "tail did not decay: {} vs {}", early, late);
    }

    #[test]
    fn longer_decay_parameter_lengthens_tail() {
        let mut short = HallReverb::new(48000.0);
        short.set_parameter(PARAM_DRY_LEVEL, 0.0);
        short.set_parameter(PARAM_DECAY, 0.5);

        let mut long = HallReverb::new(48000.0);
        long.set_parameter(PARAM_DRY_LEVEL, 0.0);
        long.set_parameter(PARAM_DECAY, 5.0);

        let short_tail = impulse_tail(&mut short, 100, 1024);
        let long_tail = impulse_tail(&mut long, 100, 1024);

        let window = 80_000..90_000;
        assert!(energy(&long_tail[window.clone()]) > energy(&short_tail[window]) * 10.0);
    }

    #[test]
    fn mute_silences_the_tail() {
        let mut reverb = HallReverb::new(48000.0);
        reverb.set_parameter(PARAM_DRY_LEVEL, 0.0);

        // Build up a tail, then mute and feed silence.
        let _ = impulse_tail(&mut reverb, 4, 1024);
        reverb.mute();

        let silence = vec![0.0f32; 1024];
        let mut out_l = vec![0.0f32; 1024];
        let mut out_r = vec![0.0f32; 1024];
        reverb.run([&silence, &silence], [&mut out_l, &mut out_r], 1024);

        assert!(out_l.iter().all(|&s| s == 0.0));
        assert!(out_r.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn dry_level_passes_input_through() {
        let mut reverb = HallReverb::new(48000.0);
        reverb.set_parameter(PARAM_DRY_LEVEL, 1.0);
        reverb.set_parameter(PARAM_WET_LEVEL, 0.0);

        let input: Vec<f32> = (0..256).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut out_l = vec![0.0f32; 256];
        let mut out_r = vec![0.0f32; 256];
        reverb.run([&input, &input], [&mut out_l, &mut out_r], 256);

        for (a, b) in input.iter().zip(&out_l) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
