use std::collections::HashMap;

use crate::dsp::oscillator::Waveform;
use crate::engine::config::EngineConfig;
use crate::engine::scheduler::{Scheduler, TimerEvent};
use crate::music::{PitchSpec, VoiceId};
use crate::synth::voice::{Voice, VoiceParams, VoicePhase};

/*
Voice Lifecycle
===============

The manager owns every live voice and maps note identity to at most one of
them:

- The `active` map holds exactly the Active voices, keyed by VoiceId. This IS
  the uniqueness invariant: a second Active voice for a key cannot exist.
- Releasing voices move to a side list. Their id slot frees immediately, so a
  new note-on for the same key can proceed while the old tail rings out.

Retrigger (note-on while the key is still Active) never cuts the old voice and
never starts the new one on top at full gain. The old voice gets an
accelerated release and leaves the map; the replacement is created through the
timer queue a few frames later - strictly after the release was scheduled -
so the splice point is two short ramps crossing, not a level jump.

Every path out of Active cancels that voice's pending safety timer, and
note-off additionally cancels a pending respawn for the key (a press-and-
release faster than the retrigger gap must not leave a ghost voice that only
the 5-second safety net would catch).
*/

pub struct VoiceManager {
    active: HashMap<VoiceId, Voice>,
    releasing: Vec<Voice>,
    wave1: Waveform,
    wave2: Option<Waveform>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self {
            active: HashMap::new(),
            releasing: Vec::new(),
            wave1: Waveform::Sine,
            wave2: None,
        }
    }

    fn voice_params(&self, cfg: &EngineConfig) -> VoiceParams {
        VoiceParams {
            wave1: self.wave1,
            wave2: self.wave2,
            osc1_level: cfg.osc1_level,
            osc2_level: cfg.osc2_level,
            attack: cfg.attack,
            sample_rate: cfg.sample_rate,
        }
    }

    /// Move one voice out of the active map into the releasing list,
    /// cancelling its safety timer.
    fn release_voice(
        &mut self,
        id: VoiceId,
        release_secs: f32,
        sched: &mut Scheduler,
        cfg: &EngineConfig,
    ) {
        if let Some(mut voice) = self.active.remove(&id) {
            if let Some(token) = voice.safety_token() {
                sched.cancel(token);
                voice.set_safety_token(None);
            }
            voice.begin_release(release_secs, cfg.sample_rate);
            self.releasing.push(voice);
        }
    }

    /// Create a voice for `pitch` and arm its safety stop. No-op if the id is
    /// already active (a respawn racing a fresh note-on resolves to the voice
    /// that got there first).
    pub fn spawn(&mut self, pitch: PitchSpec, sched: &mut Scheduler, cfg: &EngineConfig, now: u64) {
        let id = pitch.id();
        if self.active.contains_key(&id) {
            return;
        }

        let mut voice = Voice::start(pitch, now, &self.voice_params(cfg));
        let deadline = now + cfg.secs_to_frames(cfg.safety_timeout);
        voice.set_safety_token(Some(sched.schedule(deadline, TimerEvent::SafetyStop(id))));
        self.active.insert(id, voice);
    }

    pub fn note_on(&mut self, pitch: PitchSpec, sched: &mut Scheduler, cfg: &EngineConfig, now: u64) {
        let id = pitch.id();

        if self.active.contains_key(&id) {
            // Retrigger: release the predecessor on the accelerated ramp and
            // only then schedule the replacement.
            self.release_voice(id, cfg.release_retrigger, sched, cfg);
            sched.schedule(now + cfg.retrigger_gap_frames, TimerEvent::Respawn(pitch));
            return;
        }

        self.spawn(pitch, sched, cfg, now);
    }

    pub fn note_off(&mut self, pitch: PitchSpec, sched: &mut Scheduler, cfg: &EngineConfig, now: u64) {
        let id = pitch.id();

        // A respawn still in flight for this key would outlive its note-off.
        sched.cancel_matching(|e| matches!(e, TimerEvent::Respawn(p) if p.id() == id));

        let Some(voice) = self.active.get(&id) else {
            return; // absent or already releasing
        };

        let release = if voice.age_secs(now, cfg.sample_rate) < cfg.rapid_note_age {
            cfg.release_rapid
        } else {
            cfg.release_held
        };
        self.release_voice(id, release, sched, cfg);
    }

    /// Release every active voice and schedule the forced cleanup for when
    /// the longest window has elapsed.
    pub fn stop_all(&mut self, sched: &mut Scheduler, cfg: &EngineConfig, now: u64) {
        sched.cancel_matching(|e| {
            matches!(e, TimerEvent::Respawn(_) | TimerEvent::StopAllCleanup)
        });

        let ids: Vec<VoiceId> = self.active.keys().copied().collect();
        for id in ids {
            self.release_voice(id, cfg.release_rapid, sched, cfg);
        }

        let window = cfg.secs_to_frames(cfg.release_rapid) + 1;
        sched.schedule(now + window, TimerEvent::StopAllCleanup);
    }

    /// Safety deadline fired: force the voice into release if it is somehow
    /// still sounding. No-op for anything already releasing or removed.
    /// Cancelling the just-fired token inside release_voice finds nothing,
    /// which is fine.
    pub fn safety_fired(&mut self, id: VoiceId, sched: &mut Scheduler, cfg: &EngineConfig) {
        self.release_voice(id, cfg.release_held, sched, cfg);
    }

    /// Drop every voice outright. Terminal half of stop-all: by now the
    /// release windows have elapsed, so anything left is in an inconsistent
    /// state and is discarded rather than ramped.
    pub fn force_clear(&mut self, sched: &mut Scheduler) {
        for voice in self.active.values() {
            if let Some(token) = voice.safety_token() {
                sched.cancel(token);
            }
        }
        self.active.clear();
        self.releasing.clear();
    }

    pub fn set_waveform1(&mut self, waveform: Waveform) {
        self.wave1 = waveform;

        // Never let both oscillators carry the same type.
        if self.wave2 == Some(waveform) {
            self.wave2 = None;
            for voice in self.active.values_mut() {
                voice.disable_osc2();
            }
        }

        for voice in self.active.values_mut() {
            voice.set_waveform1(waveform);
        }
    }

    pub fn set_waveform2(&mut self, waveform: Option<Waveform>, cfg: &EngineConfig) {
        // Selecting oscillator 1's type is resolved as disabling oscillator 2.
        let resolved = waveform.filter(|&w| w != self.wave1);
        self.wave2 = resolved;

        match resolved {
            None => {
                for voice in self.active.values_mut() {
                    voice.disable_osc2();
                }
            }
            Some(w) => {
                for voice in self.active.values_mut() {
                    voice.set_waveform2(w, cfg.osc2_level, cfg.attack, cfg.sample_rate);
                }
            }
        }
    }

    pub fn waveform1(&self) -> Waveform {
        self.wave1
    }

    pub fn waveform2(&self) -> Option<Waveform> {
        self.wave2
    }

    /// Render every live voice additively into `out`.
    pub fn render_add(&mut self, out: &mut [f32], env_scratch: &mut [f32], sample_rate: f32) {
        for voice in self.active.values_mut() {
            voice.render_add(out, env_scratch, sample_rate);
        }
        for voice in &mut self.releasing {
            voice.render_add(out, env_scratch, sample_rate);
        }
    }

    /// Drop voices whose release window has completed. Idempotent against
    /// voices a stop-all already removed.
    pub fn sweep_finished(&mut self) {
        self.releasing.retain(|v| !v.is_finished());
    }

    pub fn is_active(&self, id: VoiceId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn releasing_count(&self) -> usize {
        self.releasing.len()
    }

    /// Phase of the voice for `id`, if any is still live.
    pub fn phase_of(&self, id: VoiceId) -> Option<VoicePhase> {
        if self.active.contains_key(&id) {
            return Some(VoicePhase::Active);
        }
        self.releasing
            .iter()
            .find(|v| v.id() == id)
            .map(|v| v.phase())
    }
}

impl Default for VoiceManager {
    fn default() -> Self {
        Self::new()
    }
}
