use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Audio Oscillator
================

An oscillator is the fundamental sound source in a synthesizer. It generates a
repeating waveform at a specific frequency, producing the raw material the
envelopes and effects then shape.

Waveform character:

Sine: the purest tone - fundamental only, no harmonics. Smooth and hollow.
Square: odd harmonics falling off as 1/n. Hollow but punchy.
Sawtooth: all harmonics falling off as 1/n. Bright and buzzy.
Triangle: odd harmonics falling off as 1/n². Soft, between sine and square.

Implementation: a phase accumulator in [0, 1) advanced by frequency/sample_rate
per sample. The waveform is evaluated from the phase, so switching waveforms
mid-note is phase-continuous - the output value may step, but the ramp
envelopes around it keep the transition inaudible, matching how a running
oscillator node changes type without restarting.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

pub struct Oscillator {
    waveform: Waveform,
    phase: f32, // [0, 1)
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Change the waveform without resetting phase (click-free live switch).
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    #[inline]
    fn evaluate(&self) -> f32 {
        match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (self.phase - 0.5).abs(),
        }
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = self.evaluate();
        self.phase += frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }

    /// Render a block at a fixed frequency, ADDING into the buffer scaled by
    /// the per-sample `gain` curve so multiple oscillators can share one
    /// output slot.
    pub fn render_add(&mut self, out: &mut [f32], gain: &[f32], frequency: f32, sample_rate: f32) {
        debug_assert_eq!(out.len(), gain.len());
        for (o, &g) in out.iter_mut().zip(gain.iter()) {
            *o += self.next_sample(frequency, sample_rate) * g;
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn sine_matches_closed_form() {
        let mut osc = Oscillator::new(Waveform::Sine);
        let freq = 440.0;

        let mut buffer = vec![0.0f32; 128];
        let gain = vec![1.0f32; 128];
        osc.render_add(&mut buffer, &gain, freq, SAMPLE_RATE);

        // sample n should be sin(2pi f n / sr)
        let n = 12;
        let expected = (TAU * freq * n as f32 / SAMPLE_RATE).sin();
        assert!(
            (buffer[n] - expected).abs() < 1e-5,
            "expected {expected}, got {}",
            buffer[n]
        );
    }

    #[test]
    fn square_alternates_sign() {
        let mut osc = Oscillator::new(Waveform::Square);
        // 1 kHz at 48 kHz: 24 samples per half-cycle. Probe well away from
        // the edges so accumulated phase rounding cannot flip the readings.
        let samples: Vec<f32> = (0..48)
            .map(|_| osc.next_sample(1_000.0, SAMPLE_RATE))
            .collect();

        assert_eq!(samples[0], 1.0); // phase 0.0
        assert_eq!(samples[12], 1.0); // phase 0.25
        assert_eq!(samples[36], -1.0); // phase 0.75
    }

    #[test]
    fn waveform_switch_keeps_phase() {
        let mut osc = Oscillator::new(Waveform::Sawtooth);
        for _ in 0..10 {
            osc.next_sample(440.0, SAMPLE_RATE);
        }
        let phase_before = osc.phase;
        osc.set_waveform(Waveform::Triangle);
        assert_eq!(osc.phase, phase_before);
    }

    #[test]
    fn output_stays_in_range() {
        for waveform in Waveform::ALL {
            let mut osc = Oscillator::new(waveform);
            for _ in 0..4096 {
                let s = osc.next_sample(997.0, SAMPLE_RATE);
                assert!((-1.0..=1.0).contains(&s), "{waveform:?} out of range: {s}");
            }
        }
    }
}
