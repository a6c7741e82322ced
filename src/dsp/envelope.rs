use crate::MIN_TIME;

/*
Gain Envelope
=============

A voice's loudness trajectory. Two jobs:

1. Attack: ramp from silence (or from wherever the level currently is) up to
   the operating gain when a note starts. Without this, the waveform starts at
   an arbitrary amplitude and the discontinuity is an audible click.

2. Release: ramp back to zero when the note ends. Same reasoning in reverse.

Stages:

    Idle ──trigger──▶ Attack ──(level=peak)──▶ Sustain
                        │                         │
                        └──begin_release──────────┘
                                   │
                                   ▼
                               Release ──(window elapsed)──▶ Idle

begin_release works from ANY live stage and snapshots the CURRENT level, so
releasing mid-attack cannot jump. The release interpolates

    level = start * (1 - p)²         p = elapsed / total

a quadratic ease-out: steep at first like an exponential decay, but it reaches
exactly zero at a known sample, so voice teardown has a precise deadline and
there is no denormal tail to chase.

The release window is chosen by the caller per note: rapid notes get a short
window to keep fast passages crisp, held notes a longer one, retriggered notes
an accelerated one. The envelope itself is agnostic; it just ramps.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,    // silent, level = 0
    Attack,  // ramping up to the operating gain
    Sustain, // holding the operating gain
    Release, // ramping down to 0
}

pub struct GainEnvelope {
    peak: f32, // operating gain this envelope ramps to

    stage: EnvelopeStage,
    level: f32,

    // Attack bookkeeping
    attack_start_level: f32,
    attack_total: u32,
    attack_elapsed: u32,

    // Release bookkeeping (snapshot at begin_release for an exact endpoint)
    release_start_level: f32,
    release_total: u32,
    release_elapsed: u32,
}

impl GainEnvelope {
    pub fn new(peak: f32) -> Self {
        Self {
            peak: peak.clamp(0.0, 1.0),
            stage: EnvelopeStage::Idle,
            level: 0.0,
            attack_start_level: 0.0,
            attack_total: 1,
            attack_elapsed: 0,
            release_start_level: 0.0,
            release_total: 1,
            release_elapsed: 0,
        }
    }

    /// Gate high: ramp from the current level to the operating gain.
    pub fn trigger(&mut self, attack_secs: f32, sample_rate: f32) {
        self.attack_start_level = self.level;
        self.attack_total = (attack_secs.max(MIN_TIME) * sample_rate).round().max(1.0) as u32;
        self.attack_elapsed = 0;
        self.stage = EnvelopeStage::Attack;
    }

    /// Gate low: ramp from the current level to zero over `release_secs`.
    ///
    /// No-op if already releasing or idle - a release in flight is never
    /// restarted or retimed.
    pub fn begin_release(&mut self, release_secs: f32, sample_rate: f32) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total = (release_secs.max(MIN_TIME) * sample_rate).round().max(1.0) as u32;
        self.release_elapsed = 0;
        self.stage = EnvelopeStage::Release;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.attack_elapsed += 1;
                let progress = self.attack_elapsed as f32 / self.attack_total as f32;
                self.level =
                    self.attack_start_level + (self.peak - self.attack_start_level) * progress;

                if self.attack_elapsed >= self.attack_total {
                    self.level = self.peak;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.peak;
            }

            EnvelopeStage::Release => {
                self.release_elapsed += 1;
                let progress = self.release_elapsed as f32 / self.release_total as f32;
                let remain = 1.0 - progress;
                self.level = self.release_start_level * remain * remain;

                if self.release_elapsed >= self.release_total {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Fill a buffer with the gain curve, one value per sample.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn run(env: &mut GainEnvelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_reaches_operating_gain() {
        let mut env = GainEnvelope::new(0.5);
        env.trigger(0.01, SAMPLE_RATE);
        run(&mut env, (0.01 * SAMPLE_RATE) as usize + 1);

        assert!((env.level() - 0.5).abs() < 1e-6);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
    }

    #[test]
    fn attack_is_monotonic_from_silence() {
        let mut env = GainEnvelope::new(1.0);
        env.trigger(0.02, SAMPLE_RATE);

        let mut prev = 0.0;
        for _ in 0..(0.02 * SAMPLE_RATE) as usize {
            let level = env.next_sample();
            assert!(level >= prev, "attack should never step down");
            prev = level;
        }
    }

    #[test]
    fn release_hits_exact_zero_within_window() {
        let release = 0.05;
        let mut env = GainEnvelope::new(0.5);
        env.trigger(0.005, SAMPLE_RATE);
        run(&mut env, 20);

        env.begin_release(release, SAMPLE_RATE);
        run(&mut env, (release * SAMPLE_RATE) as usize);

        assert_eq!(env.level(), 0.0);
        assert!(env.is_idle());
    }

    #[test]
    fn release_mid_attack_starts_from_current_level() {
        let mut env = GainEnvelope::new(1.0);
        env.trigger(0.1, SAMPLE_RATE);
        run(&mut env, 10); // 10% through the attack

        let level_before = env.level();
        env.begin_release(0.05, SAMPLE_RATE);
        let level_after = env.next_sample();

        // First release sample must be close to the snapshot, not to peak.
        assert!(level_after <= level_before);
        assert!(level_before - level_after < 0.1);
    }

    #[test]
    fn release_is_not_restarted() {
        let mut env = GainEnvelope::new(1.0);
        env.trigger(0.001, SAMPLE_RATE);
        run(&mut env, 5);

        env.begin_release(0.01, SAMPLE_RATE);
        run(&mut env, 5);
        let mid = env.level();

        // A second begin_release must not retime the ramp.
        env.begin_release(1.0, SAMPLE_RATE);
        run(&mut env, 6);
        assert!(env.is_idle(), "level was {mid}, release should have completed");
    }

    #[test]
    fn idle_envelope_ignores_release() {
        let mut env = GainEnvelope::new(1.0);
        env.begin_release(0.01, SAMPLE_RATE);
        assert!(env.is_idle());
        assert_eq!(env.next_sample(), 0.0);
    }
}
