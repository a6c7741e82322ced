use crate::dsp::envelope::GainEnvelope;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::engine::scheduler::TimerToken;
use crate::music::{PitchSpec, VoiceId};

/// Externally observable lifecycle. Creation ramps straight into `Active`
/// (the instant between scheduling the attack and hearing it has no separate
/// state); removal is the voice dropping out of the manager entirely, only
/// ever after a completed release window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Active,
    Releasing,
}

/// One oscillator with its own gain envelope.
struct OscPair {
    osc: Oscillator,
    env: GainEnvelope,
}

impl OscPair {
    fn start(waveform: Waveform, level: f32, attack: f32, sample_rate: f32) -> Self {
        let mut env = GainEnvelope::new(level);
        env.trigger(attack, sample_rate);
        Self {
            osc: Oscillator::new(waveform),
            env,
        }
    }
}

/// A single sounding or releasing note: up to two oscillator/envelope pairs
/// sharing one frequency, owned exclusively by the voice manager.
pub struct Voice {
    id: VoiceId,
    pitch: PitchSpec,
    frequency: f32,
    phase: VoicePhase,
    started_at: u64,
    safety: Option<TimerToken>,

    osc1: OscPair,
    osc2: Option<OscPair>,
}

pub struct VoiceParams {
    pub wave1: Waveform,
    pub wave2: Option<Waveform>,
    pub osc1_level: f32,
    pub osc2_level: f32,
    pub attack: f32,
    pub sample_rate: f32,
}

impl Voice {
    pub fn start(pitch: PitchSpec, now: u64, params: &VoiceParams) -> Self {
        let osc2 = params
            .wave2
            .map(|w| OscPair::start(w, params.osc2_level, params.attack, params.sample_rate));

        Self {
            id: pitch.id(),
            pitch,
            frequency: pitch.frequency(),
            phase: VoicePhase::Active,
            started_at: now,
            safety: None,
            osc1: OscPair::start(params.wave1, params.osc1_level, params.attack, params.sample_rate),
            osc2,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn pitch(&self) -> PitchSpec {
        self.pitch
    }

    pub fn phase(&self) -> VoicePhase {
        self.phase
    }

    pub fn age_secs(&self, now: u64, sample_rate: f32) -> f32 {
        now.saturating_sub(self.started_at) as f32 / sample_rate
    }

    pub fn safety_token(&self) -> Option<TimerToken> {
        self.safety
    }

    pub fn set_safety_token(&mut self, token: Option<TimerToken>) {
        self.safety = token;
    }

    /// Ramp both oscillators toward silence over `release_secs` and leave
    /// `Active`. A voice already releasing keeps its ramp; the phase change
    /// is idempotent.
    pub fn begin_release(&mut self, release_secs: f32, sample_rate: f32) {
        self.phase = VoicePhase::Releasing;
        self.osc1.env.begin_release(release_secs, sample_rate);
        if let Some(osc2) = &mut self.osc2 {
            osc2.env.begin_release(release_secs, sample_rate);
        }
    }

    /// True once every envelope has run out: the voice can be removed.
    pub fn is_finished(&self) -> bool {
        self.phase == VoicePhase::Releasing
            && self.osc1.env.is_idle()
            && self.osc2.as_ref().map_or(true, |p| p.env.is_idle())
    }

    /// Live waveform switch on oscillator 1, phase-continuous.
    pub fn set_waveform1(&mut self, waveform: Waveform) {
        self.osc1.osc.set_waveform(waveform);
    }

    pub fn waveform1(&self) -> Waveform {
        self.osc1.osc.waveform()
    }

    pub fn waveform2(&self) -> Option<Waveform> {
        self.osc2.as_ref().map(|p| p.osc.waveform())
    }

    /// Live waveform switch (or late addition) of oscillator 2. A new pair
    /// ramps up from silence like the original note-on did.
    pub fn set_waveform2(&mut self, waveform: Waveform, level: f32, attack: f32, sample_rate: f32) {
        match &mut self.osc2 {
            Some(pair) => pair.osc.set_waveform(waveform),
            None => self.osc2 = Some(OscPair::start(waveform, level, attack, sample_rate)),
        }
    }

    /// Tear down oscillator 2 immediately: stop and disconnect, no release.
    pub fn disable_osc2(&mut self) {
        self.osc2 = None;
    }

    /// Render additively into `out`. `env_scratch` receives each envelope's
    /// gain curve; it must be at least as long as `out`.
    pub fn render_add(&mut self, out: &mut [f32], env_scratch: &mut [f32], sample_rate: f32) {
        let n = out.len();
        let scratch = &mut env_scratch[..n];

        self.osc1.env.render(scratch);
        self.osc1.osc.render_add(out, scratch, self.frequency, sample_rate);

        if let Some(osc2) = &mut self.osc2 {
            osc2.env.render(scratch);
            osc2.osc.render_add(out, scratch, self.frequency, sample_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::PitchClass;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn params(wave2: Option<Waveform>) -> VoiceParams {
        VoiceParams {
            wave1: Waveform::Sine,
            wave2,
            osc1_level: 0.5,
            osc2_level: 0.4,
            attack: 0.010,
            sample_rate: SAMPLE_RATE,
        }
    }

    fn a4() -> PitchSpec {
        PitchSpec::new(PitchClass::A, 4)
    }

    #[test]
    fn starts_active_with_requested_oscillators() {
        let voice = Voice::start(a4(), 0, &params(Some(Waveform::Square)));
        assert_eq!(voice.phase(), VoicePhase::Active);
        assert_eq!(voice.waveform1(), Waveform::Sine);
        assert_eq!(voice.waveform2(), Some(Waveform::Square));

        let solo = Voice::start(a4(), 0, &params(None));
        assert_eq!(solo.waveform2(), None);
    }

    #[test]
    fn attack_ramps_from_silence() {
        let mut voice = Voice::start(a4(), 0, &params(None));
        let mut out = vec![0.0f32; 4];
        let mut scratch = vec![0.0f32; 4];
        voice.render_add(&mut out, &mut scratch, SAMPLE_RATE);

        // 10ms attack at 1kHz = 10 samples; the first samples are quiet.
        assert!(out[0].abs() < 0.1);
    }

    #[test]
    fn release_completes_within_window() {
        let mut voice = Voice::start(a4(), 0, &params(Some(Waveform::Square)));
        let mut out = vec![0.0f32; 32];
        let mut scratch = vec![0.0f32; 32];
        voice.render_add(&mut out, &mut scratch, SAMPLE_RATE);

        voice.begin_release(0.016, SAMPLE_RATE); // 16 samples
        assert_eq!(voice.phase(), VoicePhase::Releasing);
        assert!(!voice.is_finished());

        out.fill(0.0);
        voice.render_add(&mut out, &mut scratch, SAMPLE_RATE);
        assert!(voice.is_finished());
    }

    #[test]
    fn disabling_osc2_is_immediate() {
        let mut voice = Voice::start(a4(), 0, &params(Some(Waveform::Square)));
        voice.disable_osc2();
        assert_eq!(voice.waveform2(), None);
    }

    #[test]
    fn late_osc2_ramps_in() {
        let mut voice = Voice::start(a4(), 0, &params(None));
        let mut out = vec![0.0f32; 64];
        let mut scratch = vec![0.0f32; 64];
        voice.render_add(&mut out, &mut scratch, SAMPLE_RATE);

        voice.set_waveform2(Waveform::Triangle, 0.4, 0.010, SAMPLE_RATE);
        assert_eq!(voice.waveform2(), Some(Waveform::Triangle));
    }

    #[test]
    fn age_tracks_frames() {
        let voice = Voice::start(a4(), 1_000, &params(None));
        assert!((voice.age_secs(1_500, SAMPLE_RATE) - 0.5).abs() < 1e-6);
    }
}
