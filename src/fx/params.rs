use crate::dsp::filter::FilterShape;
use crate::error::ParamError;

/*
Effect Parameters
=================

Every effect exposes a different, strongly-typed parameter set (delay has
{time, feedback}, filter has {frequency, resonance, type}, ...), but the
control surface speaks one language: set("name", value) / read them all back.
The Parameterized trait is that facade. Unknown names and mismatched value
kinds come back as ParamError and leave the effect untouched.
*/

/// A parameter value: most are floats, the filter's response shape is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Shape(FilterShape),
}

impl ParamValue {
    pub fn as_float(self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(v),
            ParamValue::Shape(_) => None,
        }
    }

    pub fn as_shape(self) -> Option<FilterShape> {
        match self {
            ParamValue::Shape(s) => Some(s),
            ParamValue::Float(_) => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<FilterShape> for ParamValue {
    fn from(s: FilterShape) -> Self {
        ParamValue::Shape(s)
    }
}

/// A named live parameter value, as reported back to the control surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub value: ParamValue,
}

impl Param {
    pub fn new(name: &'static str, value: impl Into<ParamValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Uniform name/value access to an effect's parameter set.
pub trait Parameterized {
    /// Apply one parameter. Rejections never corrupt state.
    fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError>;

    /// Current live values, in a stable order.
    fn params(&self) -> Vec<Param>;
}

/// Extract a float or report the mismatch under the parameter's name.
pub(crate) fn expect_float(name: &str, value: ParamValue) -> Result<f32, ParamError> {
    value
        .as_float()
        .ok_or_else(|| ParamError::WrongKind(name.to_string()))
}
