//! Incremental reverb decay spectrogram.
//!
//! Probes a reverb engine with one block of white noise followed by
//! silence, captures the impulse response, and renders a frequency ×
//! decay-time heat map one column at a time under a per-frame budget.

pub mod axes;
pub mod dsp;
pub mod gui;
pub mod scan;
pub mod spectral;
