// Voice lifecycle: one note in, one click-free tone out.

pub mod manager;
pub mod message;
pub mod voice;

pub use manager::VoiceManager;
pub use message::{EngineHandle, EngineMessage};
pub use voice::{Voice, VoicePhase};
