use crate::dsp::delay::DelayLine;
use crate::error::ParamError;
use crate::fx::params::{expect_float, Param, ParamValue, Parameterized};
use crate::fx::Connection;

/// Longest delay the line can produce, matching the original topology's
/// 5-second maximum.
pub const MAX_DELAY_SECS: f32 = 5.0;

/// Single delay line with a feedback loop:
///
/// ```text
/// input ──▶ [delay] ──┬──▶ wet out
///             ▲       │
///             └─[fb]──┘
/// ```
pub struct DelayFx {
    line: DelayLine,
    sample_rate: f32,
    time_secs: f32,
    feedback: f32,
    pub(crate) connection: Connection,
}

impl DelayFx {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            line: DelayLine::new((MAX_DELAY_SECS * sample_rate) as usize + 1),
            sample_rate,
            time_secs: 0.3,
            feedback: 0.4,
            connection: Connection::default(),
        }
    }

    pub fn set_time(&mut self, secs: f32) {
        self.time_secs = secs.clamp(0.0, MAX_DELAY_SECS);
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        // Strictly below 1.0 so the loop always decays.
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());
        let delay_samples = (self.time_secs * self.sample_rate) as usize;

        for (&x, o) in input.iter().zip(out.iter_mut()) {
            let delayed = self.line.peek(delay_samples);
            self.line.push(x + delayed * self.feedback);
            *o = delayed;
        }
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}

impl Parameterized for DelayFx {
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
            Param::new("time", self.time_secs),
            Param::new("feedback", self.feedback),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    #[test]
    fn tap_repeats_at_delay_interval_with_feedback_decay() {
        let mut fx = DelayFx::new(SAMPLE_RATE);
        fx.set_time(0.5); // 500 samples at 1 kHz
        fx.set_feedback(0.6);

        // One impulse, then silence.
        let mut input = vec![0.0f32; 2_000];
        input[0] = 1.0;
        let mut out = vec![0.0f32; 2_000];
        fx.process_block(&input, &mut out);

        assert!((out[500] - 1.0).abs() < 1e-6, "first tap at 0.5s");
        assert!((out[1000] - 0.6).abs() < 1e-6, "second tap decayed by feedback");
        assert!((out[1500] - 0.36).abs() < 1e-6, "third tap decayed again");
        // Between taps: silence.
        assert_eq!(out[250], 0.0);
        assert_eq!(out[750], 0.0);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut fx = DelayFx::new(SAMPLE_RATE);
        let err = fx.set_param("wobble", ParamValue::Float(1.0));
        assert!(matches!(err, Err(ParamError::UnknownParam(_))));
    }

    #[test]
    fn params_report_live_values() {
        let mut fx = DelayFx::new(SAMPLE_RATE);
        fx.set_param("time", ParamValue::Float(0.5)).unwrap();
        fx.set_param("feedback", ParamValue::Float(0.6)).unwrap();

        let params = fx.params();
        assert_eq!(params[0], Param::new("time", 0.5));
        assert_eq!(params[1], Param::new("feedback", 0.6));
    }

    #[test]
    fn feedback_is_kept_below_unity() {
        let mut fx = DelayFx::new(SAMPLE_RATE);
        fx.set_param("feedback", ParamValue::Float(3.0)).unwrap();
        let fb = fx.params()[1].value.as_float().unwrap();
        assert!(fb < 1.0);
    }
}
