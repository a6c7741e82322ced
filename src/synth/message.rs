use rtrb::{Consumer, Producer};

use crate::dsp::oscillator::Waveform;
use crate::fx::{EffectKind, ParamValue};
use crate::music::{PitchClass, PitchSpec};

/// Control messages from the input surface to the engine. Pushed from the
/// control thread, drained by the audio thread at block boundaries.
#[derive(Debug, Clone, Copy)]
pub enum EngineMessage {
    NoteOn(PitchSpec),
    NoteOff(PitchSpec),
    StopAll,
    /// Emergency stop: normal release-based stop plus the output rebuild.
    HardStop,
    SetWaveform1(Waveform),
    SetWaveform2(Option<Waveform>),
    SetEffect(EffectKind),
    SetMix(f32),
    SetParameter {
        name: &'static str,
        value: ParamValue,
    },
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<EngineMessage>;
}

impl MessageReceiver for Consumer<EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        Consumer::pop(self).ok()
    }
}

/// Control-side handle. Sends are non-blocking; when the queue is full the
/// message is dropped, which for live input beats stalling the UI thread.
pub struct EngineHandle {
    tx: Producer<EngineMessage>,
}

impl EngineHandle {
    pub fn new(tx: Producer<EngineMessage>) -> Self {
        Self { tx }
    }

    pub fn send(&mut self, message: EngineMessage) {
        let _ = self.tx.push(message);
    }

    pub fn note_on(&mut self, class: PitchClass, octave: i32) {
        self.send(EngineMessage::NoteOn(PitchSpec::new(class, octave)));
    }

    pub fn note_off(&mut self, class: PitchClass, octave: i32) {
        self.send(EngineMessage::NoteOff(PitchSpec::new(class, octave)));
    }

    pub fn stop_all(&mut self) {
        self.send(EngineMessage::StopAll);
    }

    pub fn hard_stop(&mut self) {
        self.send(EngineMessage::HardStop);
    }

    pub fn set_waveform1(&mut self, waveform: Waveform) {
        self.send(EngineMessage::SetWaveform1(waveform));
    }

    pub fn set_waveform2(&mut self, waveform: Option<Waveform>) {
        self.send(EngineMessage::SetWaveform2(waveform));
    }

    pub fn set_effect(&mut self, kind: EffectKind) {
        self.send(EngineMessage::SetEffect(kind));
    }

    pub fn set_mix(&mut self, wet: f32) {
        self.send(EngineMessage::SetMix(wet));
    }

    pub fn set_parameter(&mut self, name: &'static str, value: impl Into<ParamValue>) {
        self.send(EngineMessage::SetParameter {
            name,
            value: value.into(),
        });
    }
}
