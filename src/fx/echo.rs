use crate::dsp::delay::DelayLine;
use crate::error::ParamError;
use crate::fx::params::{expect_float, Param, ParamValue, Parameterized};
use crate::fx::Connection;

/// Tap spacing multipliers over the base time.
const TIME_SCALE: [f32; 3] = [1.0, 2.0, 3.0];
/// Feedback attenuation per tap: later taps regenerate less.
const FEEDBACK_SCALE: [f32; 3] = [1.0, 0.75, 0.5];

const MAX_BASE_SECS: f32 = 5.0;

/// Three feedback delay lines at 1x/2x/3x a base time, each with its own
/// progressively weaker feedback loop, summed into one wet output. The spread
/// of spacings reads as a bouncing echo rather than a single slap.
pub struct EchoFx {
    taps: [DelayLine; 3],
    sample_rate: f32,
    base_time_secs: f32,
    base_feedback: f32,
    pub(crate) connection: Connection,
}

impl EchoFx {
    pub fn new(sample_rate: f32) -> Self {
        let line = |scale: f32| DelayLine::new((MAX_BASE_SECS * scale * sample_rate) as usize + 1);
        Self {
            taps: [
                line(TIME_SCALE[0]),
                line(TIME_SCALE[1]),
                line(TIME_SCALE[2]),
            ],
            sample_rate,
            base_time_secs: 0.3,
            base_feedback: 0.4,
            connection: Connection::default(),
        }
    }

    /// Base time; taps sit at 1x/2x/3x of it.
    pub fn set_time(&mut self, secs: f32) {
        self.base_time_secs = secs.clamp(0.0, MAX_BASE_SECS);
    }

    /// Base feedback; taps regenerate at 1x/0.75x/0.5x of it.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.base_feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());

        let mut delays = [0usize; 3];
        let mut feedbacks = [0.0f32; 3];
        for i in 0..3 {
            delays[i] = (self.base_time_secs * TIME_SCALE[i] * self.sample_rate) as usize;
            feedbacks[i] = self.base_feedback * FEEDBACK_SCALE[i];
        }

        for (&x, o) in input.iter().zip(out.iter_mut()) {
            let mut sum = 0.0;
            for i in 0..3 {
                let delayed = self.taps[i].peek(delays[i]);
                self.taps[i].push(x + delayed * feedbacks[i]);
                sum += delayed;
            }
            *o = sum;
        }
    }

    pub fn reset(&mut self) {
        for tap in &mut self.taps {
            tap.reset();
        }
    }
}

impl Parameterized for EchoFx {
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        match name {
            "time" => {
                self.set_time(expect_float(name, value)?);
                Ok(())
            }
            "feedback" => {
                self.set_feedback(expect_float(name, value)?);
                Ok(())
            }
            _ => Err(ParamError::UnknownParam(name.to_string())),
        }
    }

    fn params(&self) -> Vec<Param> {
        vec![
            Param::new("time", self.base_time_secs),
            Param::new("feedback", self.base_feedback),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    #[test]
    fn three_taps_at_scaled_intervals() {
        let mut fx = EchoFx::new(SAMPLE_RATE);
        fx.set_time(0.1); // taps at 100, 200, 300 samples
        fx.set_feedback(0.0); // no regeneration, just the first bounce of each

        let mut input = vec![0.0f32; 400];
        input[0] = 1.0;
        let mut out = vec![0.0f32; 400];
        fx.process_block(&input, &mut out);

        assert!((out[100] - 1.0).abs() < 1e-6);
        assert!((out[200] - 1.0).abs() < 1e-6);
        assert!((out[300] - 1.0).abs() < 1e-6);
        assert_eq!(out[50], 0.0);
        assert_eq!(out[150], 0.0);
    }

    #[test]
    fn later_taps_regenerate_less() {
        let mut fx = EchoFx::new(SAMPLE_RATE);
        fx.set_time(0.1);
        fx.set_feedback(0.8);

        let mut input = vec![0.0f32; 700];
        input[0] = 1.0;
        let mut out = vec![0.0f32; 700];
        fx.process_block(&input, &mut out);

        // Second bounce of tap 1 (200) carries 0.8; of tap 2 (400) carries
        // 0.6; of tap 3 (600) carries 0.4 - each on top of other taps' firsts.
        let second_bounce_tap1 = 0.8;
        let first_bounce_tap2 = 1.0;
        assert!(
            (out[200] - (second_bounce_tap1 + first_bounce_tap2)).abs() < 1e-6,
            "got {}",
            out[200]
        );
    }

    #[test]
    fn params_round_trip() {
        let mut fx = EchoFx::new(SAMPLE_RATE);
        fx.set_param("time", ParamValue::Float(0.25)).unwrap();
        fx.set_param("feedback", ParamValue::Float(0.5)).unwrap();
        assert_eq!(
            fx.params(),
            vec![Param::new("time", 0.25), Param::new("feedback", 0.5)]
        );
    }
}
