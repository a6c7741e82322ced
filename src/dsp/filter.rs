use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type              | passes          | rejects      |
| ----------------- | --------------- | ------------ |
| low-pass          | below cutoff    | above cutoff |
| high-pass         | above cutoff    | below cutoff |
| band-pass         | around cutoff   | outside      |
| notch / band-stop | outside         | around cutoff|

State-variable topology (TPT form): one core computes all four responses at
once and stays stable under high resonance, which is why synthesizers favor it
over biquads for a live-tweakable filter.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterShape {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

impl FilterShape {
    pub fn name(self) -> &'static str {
        match self {
            FilterShape::LowPass => "lowpass",
            FilterShape::HighPass => "highpass",
            FilterShape::BandPass => "bandpass",
            FilterShape::Notch => "notch",
        }
    }
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub resonance: f32,
    shape: FilterShape,
}

impl SVFilter {
    pub fn new(shape: FilterShape, cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
            shape,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterShape::LowPass, cutoff_hz)
    }

    pub fn shape(&self) -> FilterShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: FilterShape) {
        self.shape = shape;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff.clamp(20.0, 20_000.0);
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 0.99);
    }

    #[inline]
    fn compute_g(&self, sample_rate: f32) -> f32 {
        let wd = TAU * self.cutoff_hz;
        let wa = (2.0 * sample_rate) * (wd / (2.0 * sample_rate)).tan();
        wa / (2.0 * sample_rate)
    }

    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        let g = self.compute_g(sample_rate);
        let k = 2.0 - (2.0 * self.resonance);

        for sample in buffer.iter_mut() {
            let outputs = self.next_sample(*sample, k, g);

            *sample = match self.shape {
                FilterShape::LowPass => outputs.lowpass,
                FilterShape::HighPass => outputs.highpass,
                FilterShape::BandPass => outputs.bandpass,
                FilterShape::Notch => outputs.notch,
            }
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
