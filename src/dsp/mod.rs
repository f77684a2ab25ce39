pub mod hall;

//
// Parameter indices shared between the engine and the UI.
//
pub const PARAM_DRY_LEVEL: u32 = 0;
pub const PARAM_WET_LEVEL: u32 = 1;
pub const PARAM_DECAY: u32 = 2;
pub const PARAM_DAMPEN: u32 = 3;

/// Black-box stereo audio processor under measurement.
///
/// The spectrogram never knows the concrete reverb variant; it only pushes
/// blocks through `run`, forwards parameter changes, and calls `mute` to
/// clear internal state before a fresh measurement.
pub trait DspEngine: Send {
    /// Process `frames` samples from `inputs` into `outputs`. Must be
    /// callable repeatedly with a growing tail of silence; the only state
    /// reset is `mute`.
    fn run(&mut self, inputs: [&[f32]; 2], outputs: [&mut [f32]; 2], frames: usize);

    fn set_parameter(&mut self, index: u32, value: f32);

    /// Clear all internal state so the next `run` starts from true silence.
    fn mute(&mut self);
}
