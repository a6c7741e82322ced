//! Low-level DSP primitives used by the voice and effect layers.
//!
//! These components are allocation-free on the render path, making them safe
//! to embed directly inside voices and effect topologies. They intentionally
//! stay focused on the signal-processing math so the layers above handle
//! lifecycle and routing.

/// Partitioned FFT convolution for the reverb impulse response.
pub mod convolver;
/// Time-domain circular delay line.
pub mod delay;
/// Attack/sustain/release gain envelope generator.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Dry/wet blending helpers.
pub mod mix;
/// Oscillator waveforms.
pub mod oscillator;
/// Lookup-table waveshaper for distortion.
pub mod waveshaper;

pub use envelope::EnvelopeStage;
