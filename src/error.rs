//! Error types for the engine.
//!
//! Teardown errors (`GraphError`) are logged by the stop/release pipeline and
//! never propagated past it: a stop sequence always runs to completion so the
//! output reaches silence.

use thiserror::Error;

/// Connection bookkeeping failures in the effects routing graph.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    #[error("topology is already connected to the wet bus")]
    AlreadyConnected,

    #[error("topology is not connected to the wet bus")]
    NotConnected,
}

/// Rejected parameter mutations. These never corrupt engine state; the caller
/// may surface or ignore them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("effect has no parameter named `{0}`")]
    UnknownParam(String),

    #[error("parameter `{0}` does not accept this value kind")]
    WrongKind(String),

    #[error("no effect is selected")]
    Bypassed,
}

/// Output-device failures, surfaced once at initialization or resume.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no default output device available")]
    NoDevice,

    #[error("failed to fetch default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}
