pub mod config;
pub mod output;
pub mod scheduler;

use rtrb::{Consumer, RingBuffer};

use crate::dsp::oscillator::Waveform;
use crate::error::ParamError;
use crate::fx::{EffectKind, EffectsChain, Param, ParamValue};
use crate::music::{PitchSpec, VoiceId};
use crate::synth::manager::VoiceManager;
use crate::synth::message::{EngineHandle, EngineMessage, MessageReceiver};
use crate::synth::voice::VoicePhase;
use crate::MAX_BLOCK_SIZE;

use config::EngineConfig;
use output::OutputStage;
use scheduler::{Scheduler, TimerEvent};

/*
Engine
======

The explicit context object owning all mutable synth state: the voice map, the
waveform selections, the effect chain, the master output, and the timer queue.
No ambient globals; every operation is a method on this struct.

Execution is single-threaded and cooperative. The audio clock drives it:
each render_block call

1. drains control messages (when a handle is attached),
2. fires timers that come due inside the block,
3. renders all live voices additively,
4. applies master gain, runs the dry/wet bus, offers the mix to the tap,
5. sweeps out voices whose release windows completed.

Logically concurrent timelines - attack ramps, release ramps, safety
deadlines, retrigger respawns - all interleave here, at block granularity for
events and sample granularity for ramps. Timers due mid-block fire at its
start: a few frames early for a safety stop is harmless ("no later than" the
ceiling), and a retrigger respawn firing the same block its gap lands in still
happens strictly after the predecessor's release was scheduled.

The engine is equally usable without a message queue by calling the control
methods directly between render_block calls; the queue exists so a UI thread
can drive a live audio callback without sharing the context.
*/

pub struct Engine {
    config: EngineConfig,
    frames: u64,

    voices: VoiceManager,
    chain: EffectsChain,
    output: OutputStage,
    scheduler: Scheduler,

    rx: Option<Consumer<EngineMessage>>,
    env_scratch: Vec<f32>,
    fired: Vec<TimerEvent>,
}

const MESSAGE_QUEUE_SIZE: usize = 256;

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            chain: EffectsChain::new(config.sample_rate),
            output: OutputStage::new(config.master_level),
            voices: VoiceManager::new(),
            scheduler: Scheduler::new(),
            rx: None,
            env_scratch: vec![0.0; MAX_BLOCK_SIZE],
            fired: Vec::new(),
            frames: 0,
            config,
        }
    }

    /// Build an engine plus the control handle feeding it across threads.
    pub fn channel(config: EngineConfig) -> (EngineHandle, Self) {
        let (tx, rx) = RingBuffer::new(MESSAGE_QUEUE_SIZE);
        let mut engine = Self::new(config);
        engine.rx = Some(rx);
        (EngineHandle::new(tx), engine)
    }

    /// Create the recorder tap on the final mix. `capacity` is in samples.
    pub fn install_tap(&mut self, capacity: usize) -> Consumer<f32> {
        self.output.install_tap(capacity)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    /// Frames rendered so far; the engine's clock.
    pub fn now(&self) -> u64 {
        self.frames
    }

    // --- note input -------------------------------------------------------

    pub fn note_on(&mut self, pitch: PitchSpec) {
        self.voices
            .note_on(pitch, &mut self.scheduler, &self.config, self.frames);
    }

    pub fn note_off(&mut self, pitch: PitchSpec) {
        self.voices
            .note_off(pitch, &mut self.scheduler, &self.config, self.frames);
    }

    pub fn stop_all(&mut self) {
        self.voices
            .stop_all(&mut self.scheduler, &self.config, self.frames);
    }

    /// Emergency stop: the release-based stop plus an immediate output
    /// rebuild - master gain replaced at zero and cross-faded back, effect
    /// tails dropped.
    pub fn hard_stop(&mut self) {
        self.stop_all();
        self.chain.reset_topologies();
        self.output
            .hard_reset(self.config.reset_ramp, self.config.sample_rate);
    }

    // --- waveform selection ----------------------------------------------

    pub fn set_waveform1(&mut self, waveform: Waveform) {
        self.voices.set_waveform1(waveform);
    }

    pub fn set_waveform2(&mut self, waveform: Option<Waveform>) {
        self.voices.set_waveform2(waveform, &self.config);
    }

    pub fn waveform1(&self) -> Waveform {
        self.voices.waveform1()
    }

    pub fn waveform2(&self) -> Option<Waveform> {
        self.voices.waveform2()
    }

    // --- effects ----------------------------------------------------------

    pub fn set_effect(&mut self, kind: EffectKind) {
        self.chain.set_effect(kind);
    }

    pub fn current_effect(&self) -> EffectKind {
        self.chain.current()
    }

    pub fn set_mix(&mut self, wet: f32) {
        self.chain.set_mix(wet);
    }

    pub fn mix_state(&self) -> (f32, f32) {
        self.chain.mix_state()
    }

    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        self.chain.set_parameter(name, value)
    }

    pub fn parameters(&self) -> Vec<Param> {
        self.chain.parameters()
    }

    // --- introspection ----------------------------------------------------

    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    pub fn releasing_voices(&self) -> usize {
        self.voices.releasing_count()
    }

    pub fn is_voice_active(&self, pitch: PitchSpec) -> bool {
        self.voices.is_active(pitch.id())
    }

    pub fn voice_phase(&self, id: VoiceId) -> Option<VoicePhase> {
        self.voices.phase_of(id)
    }

    // --- rendering --------------------------------------------------------

    /// Render one mono block. `out.len()` must not exceed MAX_BLOCK_SIZE.
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);

        self.drain_messages();
        self.fire_due_timers(out.len() as u64);

        out.fill(0.0);
        self.voices
            .render_add(out, &mut self.env_scratch, self.config.sample_rate);

        self.output.apply(out);
        self.chain.process_block(out);
        self.output.push_tap(out);

        self.voices.sweep_finished();
        self.frames += out.len() as u64;
    }

    fn drain_messages(&mut self) {
        loop {
            let msg = match &mut self.rx {
                Some(rx) => MessageReceiver::pop(rx),
                None => None,
            };
            match msg {
                Some(msg) => self.handle_message(msg),
                None => break,
            }
        }
    }

    fn handle_message(&mut self, msg: EngineMessage) {
        match msg {
            EngineMessage::NoteOn(pitch) => self.note_on(pitch),
            EngineMessage::NoteOff(pitch) => self.note_off(pitch),
            EngineMessage::StopAll => self.stop_all(),
            EngineMessage::HardStop => self.hard_stop(),
            EngineMessage::SetWaveform1(w) => self.set_waveform1(w),
            EngineMessage::SetWaveform2(w) => self.set_waveform2(w),
            EngineMessage::SetEffect(kind) => self.set_effect(kind),
            EngineMessage::SetMix(wet) => self.set_mix(wet),
            EngineMessage::SetParameter { name, value } => {
                if let Err(err) = self.set_parameter(name, value) {
                    log::debug!("parameter rejected: {err}");
                }
            }
        }
    }

    fn fire_due_timers(&mut self, block_len: u64) {
        let horizon = self.frames + block_len;
        let mut fired = std::mem::take(&mut self.fired);
        fired.clear();
        self.scheduler.drain_due(horizon, &mut fired);

        for event in &fired {
            match *event {
                TimerEvent::SafetyStop(id) => {
                    self.voices
                        .safety_fired(id, &mut self.scheduler, &self.config);
                }
                TimerEvent::Respawn(pitch) => {
                    self.voices
                        .spawn(pitch, &mut self.scheduler, &self.config, self.frames);
                }
                TimerEvent::StopAllCleanup => {
                    self.voices.force_clear(&mut self.scheduler);
                    self.output
                        .hard_reset(self.config.reset_ramp, self.config.sample_rate);
                }
            }
        }

        self.fired = fired;
    }
}
