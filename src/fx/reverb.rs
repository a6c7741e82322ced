use rand::Rng;

use crate::dsp::convolver::Convolver;
use crate::error::ParamError;
use crate::fx::params::{expect_float, Param, ParamValue, Parameterized};
use crate::fx::Connection;

const MIN_TAIL_SECS: f32 = 0.1;
const MAX_TAIL_SECS: f32 = 5.0;

/// Convolution reverb against a synthetic impulse response: per-sample random
/// noise under an exponential decay envelope. Changing the tail duration is a
/// structural edit - the impulse response is regenerated and re-partitioned,
/// which is why it runs on the control path, not per sample.
pub struct ReverbFx {
    convolver: Convolver,
    sample_rate: f32,
    tail_secs: f32,
    pub(crate) connection: Connection,
}

impl ReverbFx {
    pub fn new(sample_rate: f32) -> Self {
        let mut fx = Self {
            convolver: Convolver::new(),
            sample_rate,
            tail_secs: 2.0,
            connection: Connection::default(),
        };
        fx.regenerate();
        fx
    }

    pub fn set_time(&mut self, secs: f32) {
        self.tail_secs = secs.clamp(MIN_TAIL_SECS, MAX_TAIL_SECS);
        self.regenerate();
    }

    fn regenerate(&mut self) {
        let ir = generate_impulse_response(self.tail_secs, self.sample_rate, 1);
        self.convolver.set_impulse_response(&ir[0]);
    }

    pub fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());
        for (&x, o) in input.iter().zip(out.iter_mut()) {
            *o = self.convolver.next_sample(x);
        }
    }

    pub fn reset(&mut self) {
        self.convolver.reset();
    }
}

impl Parameterized for ReverbFx {
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        match name {
            "time" => {
                self.set_time(expect_float(name, value)?);
                Ok(())
            }
            _ => Err(ParamError::UnknownParam(name.to_string())),
        }
    }

    fn params(&self) -> Vec<Param> {
        vec![Param::new("time", self.tail_secs)]
    }
}

/// Decaying-noise impulse response, one independent noise sequence per
/// channel. The decay constant is duration/10, so the tail is ~87 dB down by
/// the end of the window.
pub fn generate_impulse_response(
    duration_secs: f32,
    sample_rate: f32,
    channels: usize,
) -> Vec<Vec<f32>> {
    let len = (duration_secs * sample_rate) as usize;
    let tau = sample_rate * duration_secs / 10.0;
    let mut rng = rand::thread_rng();

    (0..channels)
        .map(|_| {
            (0..len)
                .map(|i| {
                    let decay = (-(i as f32) / tau).exp();
                    rng.gen_range(-1.0f32..1.0) * decay
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_response_decays_exponentially() {
        let ir = generate_impulse_response(1.0, 1_000.0, 1);
        let ir = &ir[0];
        assert_eq!(ir.len(), 1_000);

        // Envelope bound: |ir[i]| <= exp(-i/tau), and the early region should
        // carry far more energy than the late region.
        let early: f32 = ir[..100].iter().map(|x| x * x).sum();
        let late: f32 = ir[900..].iter().map(|x| x * x).sum();
        assert!(early > late * 10.0, "early={early}, late={late}");
    }

    #[test]
    fn channels_are_independent() {
        let ir = generate_impulse_response(0.5, 1_000.0, 2);
        assert_eq!(ir.len(), 2);
        assert_ne!(ir[0], ir[1]);
    }

    #[test]
    fn reverb_produces_a_tail() {
        let mut fx = ReverbFx::new(8_000.0);
        fx.set_time(0.5);

        let mut input = vec![0.0f32; 8_192];
        input[0] = 1.0;
        let mut out = vec![0.0f32; 8_192];
        fx.process_block(&input, &mut out);

        let tail_energy: f32 = out[2048..].iter().map(|x| x * x).sum();
        assert!(tail_energy > 1e-4, "expected a reverb tail, got {tail_energy}");
    }

    #[test]
    fn time_parameter_is_clamped() {
        let mut fx = ReverbFx::new(8_000.0);
        fx.set_param("time", ParamValue::Float(100.0)).unwrap();
        let t = fx.params()[0].value.as_float().unwrap();
        assert!(t <= MAX_TAIL_SECS);
    }
}
