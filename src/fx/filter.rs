use crate::dsp::filter::{FilterShape, SVFilter};
use crate::error::ParamError;
use crate::fx::params::{expect_float, Param, ParamValue, Parameterized};
use crate::fx::Connection;

/// Single resonant state-variable filter on the wet bus. Parameters:
/// {frequency, resonance, type}; default response is lowpass at 1 kHz.
pub struct FilterFx {
    filter: SVFilter,
    sample_rate: f32,
    pub(crate) connection: Connection,
}

impl FilterFx {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            filter: SVFilter::lowpass(1_000.0),
            sample_rate,
            connection: Connection::default(),
        }
    }

    pub fn process_block(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());
        out.copy_from_slice(input);
        self.filter.render(out, self.sample_rate);
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }
}

impl Parameterized for FilterFx {
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        match name {
            "frequency" => {
                self.filter.set_cutoff(expect_float(name, value)?);
                Ok(())
            }
            "resonance" => {
                self.filter.set_resonance(expect_float(name, value)?);
                Ok(())
            }
            "type" => {
                let shape = value
                    .as_shape()
                    .ok_or_else(|| ParamError::WrongKind(name.to_string()))?;
                self.filter.set_shape(shape);
                Ok(())
            }
            _ => Err(ParamError::UnknownParam(name.to_string())),
        }
    }

    fn params(&self) -> Vec<Param> {
        vec![
            Param::new("frequency", self.filter.cutoff_hz),
            Param::new("resonance", self.filter.resonance),
            Param::new("type", self.filter.shape()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_lowpass_at_1k() {
        let fx = FilterFx::new(48_000.0);
        let params = fx.params();
        assert_eq!(params[0], Param::new("frequency", 1_000.0));
        assert_eq!(params[2].value.as_shape(), Some(FilterShape::LowPass));
    }

    #[test]
    fn type_parameter_switches_response() {
        let mut fx = FilterFx::new(48_000.0);
        fx.set_param("type", ParamValue::Shape(FilterShape::HighPass))
            .unwrap();

        // DC input through a highpass dies out.
        let input = vec![1.0f32; 256];
        let mut out = vec![0.0f32; 256];
        fx.process_block(&input, &mut out);
        assert!(out[255].abs() < 0.01);
    }

    #[test]
    fn frequency_rejects_shape_values() {
        let mut fx = FilterFx::new(48_000.0);
        let err = fx.set_param("frequency", ParamValue::Shape(FilterShape::Notch));
        assert!(matches!(err, Err(ParamError::WrongKind(_))));
    }
}
