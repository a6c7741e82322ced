#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::mix::blend_into;
use crate::error::{GraphError, ParamError};
use crate::MAX_BLOCK_SIZE;

pub mod delay;
pub mod distortion;
pub mod echo;
pub mod filter;
pub mod params;
pub mod reverb;

pub use params::{Param, ParamValue, Parameterized};

use delay::DelayFx;
use distortion::DistortionFx;
use echo::EchoFx;
use filter::FilterFx;
use reverb::ReverbFx;

/*
Effects Routing
===============

All topologies are built up front and sit in parallel off a shared input
splitter; none touches the wet bus until selected:

    input ──┬────────────[dry gain]───────────┬──▶ output
            │                                 │
            └──▶ (selected topology) ──[wet gain]

Selecting an effect disconnects the previous topology from the splitter and
wet bus and wires in the new one, resetting the mix to an even 50/50 split.
Selecting `None` is a full bypass: dry pinned to 1, wet to 0, and the block
passes through untouched (bit-identical).

Teardown failures are bookkeeping failures - disconnecting a topology that is
not connected. Each topology tracks its own connection state, and the chain
logs and absorbs these errors rather than letting a mid-switch anomaly wedge
the bus.
*/

/// The fixed effect catalog. Exactly one is current at a time.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    None,
    Delay,
    Echo,
    Reverb,
    Distortion,
    Filter,
}

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::None,
        EffectKind::Delay,
        EffectKind::Echo,
        EffectKind::Reverb,
        EffectKind::Distortion,
        EffectKind::Filter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::None => "none",
            EffectKind::Delay => "delay",
            EffectKind::Echo => "echo",
            EffectKind::Reverb => "reverb",
            EffectKind::Distortion => "distortion",
            EffectKind::Filter => "filter",
        }
    }
}

/// Wet-bus connection bookkeeping for one topology. Disconnecting something
/// that is not connected is an error the caller logs, not trusts away.
#[derive(Debug, Default)]
pub struct Connection {
    connected: bool,
}

impl Connection {
    pub fn connect(&mut self) -> Result<(), GraphError> {
        if self.connected {
            return Err(GraphError::AlreadyConnected);
        }
        self.connected = true;
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), GraphError> {
        if !self.connected {
            return Err(GraphError::NotConnected);
        }
        self.connected = false;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

/// One fixed effect topology: a single entry and exit point on the wet bus.
pub trait EffectTopology: Parameterized {
    fn connection_mut(&mut self) -> &mut Connection;

    /// Render the wet signal for one block.
    fn process_block(&mut self, input: &[f32], out: &mut [f32]);

    /// Drop internal tails and filter state (the hard-reset path).
    fn reset(&mut self);
}

macro_rules! impl_topology {
    ($ty:ty) => {
        impl EffectTopology for $ty {
            fn connection_mut(&mut self) -> &mut Connection {
                &mut self.connection
            }

            fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
                <$ty>::process_block(self, input, out)
            }

            fn reset(&mut self) {
                <$ty>::reset(self)
            }
        }
    };
}

impl_topology!(DelayFx);
impl_topology!(EchoFx);
impl_topology!(ReverbFx);
impl_topology!(DistortionFx);
impl_topology!(FilterFx);

const DEFAULT_WET: f32 = 0.5;

pub struct EffectsChain {
    current: EffectKind,
    dry_level: f32,
    wet_level: f32,

    delay: DelayFx,
    echo: EchoFx,
    reverb: ReverbFx,
    distortion: DistortionFx,
    filter: FilterFx,

    dry_buf: Vec<f32>,
    wet_buf: Vec<f32>,
}

impl EffectsChain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            current: EffectKind::None,
            dry_level: 1.0,
            wet_level: 0.0,
            delay: DelayFx::new(sample_rate),
            echo: EchoFx::new(sample_rate),
            reverb: ReverbFx::new(sample_rate),
            distortion: DistortionFx::new(),
            filter: FilterFx::new(sample_rate),
            dry_buf: vec![0.0; MAX_BLOCK_SIZE],
            wet_buf: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn current(&self) -> EffectKind {
        self.current
    }

    /// (dry, wet) levels.
    pub fn mix_state(&self) -> (f32, f32) {
        (self.dry_level, self.wet_level)
    }

    fn topology_mut(&mut self, kind: EffectKind) -> Option<&mut dyn EffectTopology> {
        match kind {
            EffectKind::None => None,
            EffectKind::Delay => Some(&mut self.delay),
            EffectKind::Echo => Some(&mut self.echo),
            EffectKind::Reverb => Some(&mut self.reverb),
            EffectKind::Distortion => Some(&mut self.distortion),
            EffectKind::Filter => Some(&mut self.filter),
        }
    }

    /// Switch the current effect. Same-kind selection is a no-op: no
    /// disconnect/reconnect cycle happens at all.
    pub fn set_effect(&mut self, kind: EffectKind) {
        if kind == self.current {
            return;
        }

        let previous = self.current;
        if let Some(prev) = self.topology_mut(previous) {
            if let Err(err) = prev.connection_mut().disconnect() {
                log::warn!("disconnecting {}: {err}", previous.name());
            }
        }

        self.current = kind;

        let Some(next) = self.topology_mut(kind) else {
            // Full bypass.
            self.dry_level = 1.0;
            self.wet_level = 0.0;
            return;
        };

        if let Err(err) = next.connection_mut().connect() {
            log::warn!("connecting {}: {err}", kind.name());
        }
        self.dry_level = 1.0 - DEFAULT_WET;
        self.wet_level = DEFAULT_WET;
    }

    /// Set the wet share of the mix. No-op while bypassed.
    pub fn set_mix(&mut self, wet: f32) {
        if self.current == EffectKind::None {
            return;
        }
        let wet = wet.clamp(0.0, 1.0);
        self.wet_level = wet;
        self.dry_level = 1.0 - wet;
    }

    /// Apply one parameter to the current effect. `Err(Bypassed)` while no
    /// effect is selected; unknown names pass through from the topology.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        let current = self.current;
        match self.topology_mut(current) {
            None => Err(ParamError::Bypassed),
            Some(topology) => topology.set_param(name, value),
        }
    }

    /// The current effect's live parameter values; empty when bypassed.
    pub fn parameters(&self) -> Vec<Param> {
        match self.current {
            EffectKind::None => Vec::new(),
            EffectKind::Delay => self.delay.params(),
            EffectKind::Echo => self.echo.params(),
            EffectKind::Reverb => self.reverb.params(),
            EffectKind::Distortion => self.distortion.params(),
            EffectKind::Filter => self.filter.params(),
        }
    }

    /// Run one block through the dry/wet bus in place.
    pub fn process_block(&mut self, buf: &mut [f32]) {
        debug_assert!(buf.len() <= MAX_BLOCK_SIZE);

        let current = self.current;
        if current == EffectKind::None {
            return; // bypass is bit-identical
        }

        let n = buf.len();
        self.dry_buf[..n].copy_from_slice(buf);

        // Split borrows: the topology half and the scratch half.
        let (dry_buf, wet_buf) = (&mut self.dry_buf, &mut self.wet_buf);
        let topology: &mut dyn EffectTopology = match current {
            EffectKind::None => unreachable!(),
            EffectKind::Delay => &mut self.delay,
            EffectKind::Echo => &mut self.echo,
            EffectKind::Reverb => &mut self.reverb,
            EffectKind::Distortion => &mut self.distortion,
            EffectKind::Filter => &mut self.filter,
        };
        topology.process_block(&dry_buf[..n], &mut wet_buf[..n]);

        blend_into(buf, &dry_buf[..n], &wet_buf[..n], self.dry_level, self.wet_level);
    }

    /// Clear every topology's tails and state. Part of the emergency reset:
    /// the rebuilt signal path starts silent.
    pub fn reset_topologies(&mut self) {
        self.delay.reset();
        self.echo.reset();
        self.reverb.reset();
        self.distortion.reset();
        self.filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 8_000.0;

    fn ramp_block(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 / len as f32) - 0.5).collect()
    }

    #[test]
    fn bypass_is_bit_identical() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        let mut buf = ramp_block(256);
        let original = buf.clone();

        chain.process_block(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn bypass_reports_no_parameters() {
        let chain = EffectsChain::new(SAMPLE_RATE);
        assert!(chain.parameters().is_empty());
    }

    #[test]
    fn selecting_effect_resets_mix_to_even_split() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Delay);
        assert_eq!(chain.mix_state(), (0.5, 0.5));
    }

    #[test]
    fn selecting_none_restores_full_dry() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Delay);
        chain.set_mix(0.8);
        chain.set_effect(EffectKind::None);
        assert_eq!(chain.mix_state(), (1.0, 0.0));
    }

    #[test]
    fn reselecting_same_effect_is_a_noop() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Delay);
        chain.set_mix(0.9);
        chain.set_effect(EffectKind::Delay);
        // Mix untouched proves no reconnect cycle ran.
        let (dry, wet) = chain.mix_state();
        assert!((wet - 0.9).abs() < 1e-6 && (dry - 0.1).abs() < 1e-6);
    }

    #[test]
    fn set_mix_is_noop_while_bypassed() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_mix(0.8);
        assert_eq!(chain.mix_state(), (1.0, 0.0));
    }

    #[test]
    fn set_parameter_while_bypassed_is_rejected() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        let err = chain.set_parameter("time", ParamValue::Float(0.5));
        assert_eq!(err, Err(ParamError::Bypassed));
    }

    #[test]
    fn parameters_follow_the_selected_effect() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Delay);
        chain.set_parameter("time", ParamValue::Float(0.5)).unwrap();
        chain
            .set_parameter("feedback", ParamValue::Float(0.6))
            .unwrap();

        let params = chain.parameters();
        assert_eq!(params[0], Param::new("time", 0.5));
        assert_eq!(params[1], Param::new("feedback", 0.6));
    }

    #[test]
    fn switching_effects_changes_parameter_set() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Filter);
        let names: Vec<_> = chain.parameters().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["frequency", "resonance", "type"]);
    }

    #[test]
    fn delay_effect_blends_dry_and_wet() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Delay);
        chain.set_parameter("time", ParamValue::Float(0.01)).unwrap();
        chain.set_mix(0.5);

        // An impulse: the dry half arrives immediately at half level.
        let mut buf = vec![0.0f32; 256];
        buf[0] = 1.0;
        chain.process_block(&mut buf);

        assert!((buf[0] - 0.5).abs() < 1e-6, "dry path at 50%");
        // The wet tap shows up one delay later (0.01s at 8kHz), also at 50%.
        let tap = (0.01f32 * SAMPLE_RATE) as usize;
        assert!((buf[tap] - 0.5).abs() < 1e-6, "wet tap at 50%");
    }

    #[test]
    fn connection_state_tracks_switches() {
        let mut chain = EffectsChain::new(SAMPLE_RATE);
        chain.set_effect(EffectKind::Delay);
        assert!(chain.delay.connection.is_connected());

        chain.set_effect(EffectKind::Reverb);
        assert!(!chain.delay.connection.is_connected());
        assert!(chain.reverb.connection.is_connected());

        chain.set_effect(EffectKind::None);
        assert!(!chain.reverb.connection.is_connected());
    }
}
