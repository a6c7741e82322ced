use crate::dsp::waveshaper::Waveshaper;
use crate::error::ParamError;
use crate::fx::params::{expect_float, Param, ParamValue, Parameterized};
use crate::fx::Connection;

/// Waveshaping distortion. The single {amount} parameter is the drive `k` in
/// the transfer curve; setting it regenerates the lookup table.
pub struct DistortionFx {
    shaper: Waveshaper,
    pub(crate) connection: Connection,
}

impl DistortionFx {
    pub fn new() -> Self {
        Self {
            shaper: Waveshaper::new(50.0),
            connection: Connection::default(),
        }
    }

    pub fn set_amount(&mut self, amount: f32) {
        self.shaper.set_amount(amount);
    }

    pub fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());
        for (&x, o) in input.iter().zip(out.iter_mut()) {
            *o = self.shaper.shape(x);
        }
    }

    // Waveshaping is stateless sample-to-sample; nothing to clear.
    pub fn reset(&mut self) {}
}

impl Default for DistortionFx {
    fn default() -> Self {
        Self::new()
    }
}

impl Parameterized for DistortionFx {
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        match name {
            "amount" => {
                self.set_amount(expect_float(name, value)?);
                Ok(())
            }
            _ => Err(ParamError::UnknownParam(name.to_string())),
        }
    }

    fn params(&self) -> Vec<Param> {
        vec![Param::new("amount", self.shaper.amount())]
    }
}
