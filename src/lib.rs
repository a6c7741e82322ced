pub mod dsp;
pub mod engine;
pub mod error;
pub mod fx; // Effect topologies and the dry/wet bus
pub mod io;
pub mod music;
pub mod synth; // Voice lifecycle and polyphony

pub use dsp::oscillator::Waveform;
pub use engine::{config::EngineConfig, Engine};
pub use fx::EffectKind;
pub use music::{PitchClass, PitchSpec, VoiceId};
pub use synth::message::{EngineHandle, EngineMessage};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
