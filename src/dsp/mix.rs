//! Dry/wet blending for the effects bus.
//!
//! The bus keeps INDEPENDENT dry and wet levels rather than one balance knob:
//! bypass pins dry=1/wet=0, while an active effect holds dry=1-wet. Keeping
//! them separate mirrors the two parallel gain paths the routing graph
//! actually has.

/// out[i] = dry[i] * dry_level + wet[i] * wet_level
#[inline]
pub fn blend_into(out: &mut [f32], dry: &[f32], wet: &[f32], dry_level: f32, wet_level: f32) {
    debug_assert_eq!(out.len(), dry.len());
    debug_assert_eq!(out.len(), wet.len());

    for ((o, &d), &w) in out.iter_mut().zip(dry.iter()).zip(wet.iter()) {
        *o = d * dry_level + w * wet_level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_full_dry() {
        let dry = [1.0, 0.5, -0.5, -1.0];
        let wet = [0.1, 0.1, 0.1, 0.1];
        let mut out = [0.0; 4];

        blend_into(&mut out, &dry, &wet, 1.0, 0.0);
        assert_eq!(out, dry);
    }

    #[test]
    fn blend_half_and_half() {
        let dry = [1.0, 1.0];
        let wet = [0.0, 0.0];
        let mut out = [0.0; 2];

        blend_into(&mut out, &dry, &wet, 0.5, 0.5);
        assert_eq!(out, [0.5, 0.5]);
    }

    #[test]
    fn blend_levels_are_independent() {
        // Bypass shape: dry pinned to 1 while wet is 0.
        let dry = [0.8, -0.8];
        let wet = [1.0, 1.0];
        let mut out = [0.0; 2];

        blend_into(&mut out, &dry, &wet, 1.0, 0.0);
        assert_eq!(out, dry);

        blend_into(&mut out, &dry, &wet, 0.3, 0.7);
        assert!((out[0] - (0.8 * 0.3 + 0.7)).abs() < 1e-6);
    }
}
