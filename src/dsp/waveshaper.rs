/*
Waveshaping Distortion
======================

A waveshaper maps each input sample through a nonlinear transfer curve,
generating harmonics the original signal did not have. This one uses

    y = (π + k) · x / (π + k · |x|)

where k is the drive amount: k = 0 is the identity (no distortion), larger k
pushes the curve toward a hard limiter and the tone toward fuzz.

The curve is evaluated once into a fixed-resolution lookup table and samples
are read back with linear interpolation. Regenerating the table only happens
when the drive changes (a control-path operation); the render path is two
loads and a lerp per sample.
*/

use std::f32::consts::PI;

const CURVE_LEN: usize = 2048;

pub struct Waveshaper {
    curve: Vec<f32>,
    amount: f32,
}

impl Waveshaper {
    pub fn new(amount: f32) -> Self {
        let mut shaper = Self {
            curve: vec![0.0; CURVE_LEN],
            amount: 0.0,
        };
        shaper.set_amount(amount);
        shaper
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Rebuild the transfer curve for a new drive amount.
    pub fn set_amount(&mut self, amount: f32) {
        let k = amount.max(0.0);
        self.amount = k;

        for (i, y) in self.curve.iter_mut().enumerate() {
            let x = 2.0 * i as f32 / (CURVE_LEN - 1) as f32 - 1.0;
            *y = (PI + k) * x / (PI + k * x.abs());
        }
    }

    #[inline]
    pub fn shape(&self, sample: f32) -> f32 {
        let x = sample.clamp(-1.0, 1.0);
        let pos = (x + 1.0) * 0.5 * (CURVE_LEN - 1) as f32;
        let idx = pos as usize;
        let frac = pos - idx as f32;

        if idx + 1 >= CURVE_LEN {
            return self.curve[CURVE_LEN - 1];
        }
        self.curve[idx] + (self.curve[idx + 1] - self.curve[idx]) * frac
    }

    pub fn render(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.shape(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_drive_is_near_identity() {
        let shaper = Waveshaper::new(0.0);
        for &x in &[-1.0, -0.5, -0.1, 0.0, 0.1, 0.5, 1.0] {
            let y = shaper.shape(x);
            assert!((y - x).abs() < 1e-2, "f({x}) = {y}");
        }
    }

    #[test]
    fn curve_is_odd_symmetric() {
        let shaper = Waveshaper::new(40.0);
        for &x in &[0.1, 0.3, 0.7, 0.95] {
            let pos = shaper.shape(x);
            let neg = shaper.shape(-x);
            assert!((pos + neg).abs() < 1e-2, "f({x})={pos}, f(-{x})={neg}");
        }
    }

    #[test]
    fn drive_compresses_peaks() {
        let gentle = Waveshaper::new(5.0);
        let heavy = Waveshaper::new(200.0);

        // Heavier drive lifts small signals closer to full scale.
        let small = 0.2;
        assert!(heavy.shape(small) > gentle.shape(small));
        // Output never exceeds the curve endpoints.
        assert!(heavy.shape(1.0) <= 1.0 + 1e-6);
        assert!(heavy.shape(-1.0) >= -1.0 - 1e-6);
    }

    #[test]
    fn set_amount_regenerates_curve() {
        let mut shaper = Waveshaper::new(0.0);
        let clean = shaper.shape(0.5);
        shaper.set_amount(100.0);
        let driven = shaper.shape(0.5);
        assert!(driven > clean, "drive change must reshape output");
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let shaper = Waveshaper::new(10.0);
        assert!(shaper.shape(3.0).is_finite());
        assert_eq!(shaper.shape(3.0), shaper.shape(1.0));
    }
}
