use rtrb::{Consumer, Producer, RingBuffer};

/*
Output Stage
============

One master gain between the summed voices and the effects chain, plus two
extras the plain gain node cannot do:

- Emergency reset: when a stop path cannot be trusted to have silenced
  everything, the gain is replaced outright - dropped to zero and cross-faded
  back to the nominal level over a short window. Whatever state upstream nodes
  were left in, the path out is rebuilt from silence.

- Tap: a lock-free copy of the final mix for an external recorder. The
  recorder owns the consumer side and never participates in graph lifecycle;
  if it stops draining, samples are dropped here rather than blocking the
  audio thread.
*/

pub struct OutputStage {
    level: f32,
    nominal: f32,
    ramp_step: f32,
    tap: Option<Producer<f32>>,
}

impl OutputStage {
    pub fn new(nominal: f32) -> Self {
        Self {
            level: nominal,
            nominal,
            ramp_step: 0.0,
            tap: None,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Apply the master gain in place, advancing the post-reset ramp if one
    /// is running.
    pub fn apply(&mut self, buf: &mut [f32]) {
        if self.ramp_step == 0.0 {
            for sample in buf.iter_mut() {
                *sample *= self.level;
            }
            return;
        }

        for sample in buf.iter_mut() {
            *sample *= self.level;
            self.level += self.ramp_step;
            if self.level >= self.nominal {
                self.level = self.nominal;
                self.ramp_step = 0.0;
            }
        }
    }

    /// Replace the gain with a fresh one at zero and cross-fade back up to
    /// nominal over `ramp_secs`.
    pub fn hard_reset(&mut self, ramp_secs: f32, sample_rate: f32) {
        self.level = 0.0;
        let ramp_samples = (ramp_secs * sample_rate).max(1.0);
        self.ramp_step = self.nominal / ramp_samples;
    }

    /// Create the recorder tap and hand back its consuming end.
    pub fn install_tap(&mut self, capacity: usize) -> Consumer<f32> {
        let (producer, consumer) = RingBuffer::new(capacity);
        self.tap = Some(producer);
        consumer
    }

    /// Offer the final mix to the tap. Drops samples when the recorder lags.
    pub fn push_tap(&mut self, buf: &[f32]) {
        if let Some(tap) = &mut self.tap {
            for &sample in buf {
                if tap.push(sample).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_nominal_gain() {
        let mut stage = OutputStage::new(0.7);
        let mut buf = vec![1.0f32; 8];
        stage.apply(&mut buf);
        assert!(buf.iter().all(|&s| (s - 0.7).abs() < 1e-6));
    }

    #[test]
    fn hard_reset_starts_from_silence() {
        let mut stage = OutputStage::new(0.7);
        stage.hard_reset(0.05, 1_000.0);

        let mut buf = vec![1.0f32; 1];
        stage.apply(&mut buf);
        assert_eq!(buf[0], 0.0);
    }

    #[test]
    fn ramp_returns_to_nominal() {
        let mut stage = OutputStage::new(0.7);
        stage.hard_reset(0.05, 1_000.0); // 50 samples

        let mut buf = vec![1.0f32; 64];
        stage.apply(&mut buf);

        assert!((stage.level() - 0.7).abs() < 1e-6);
        assert!((buf[63] - 0.7).abs() < 1e-6);
        // Monotonic fade, no overshoot.
        for pair in buf.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-6);
            assert!(pair[1] <= 0.7 + 1e-6);
        }
    }

    #[test]
    fn tap_receives_the_mix() {
        let mut stage = OutputStage::new(1.0);
        let mut tap = stage.install_tap(64);

        let buf = vec![0.25f32; 16];
        stage.push_tap(&buf);

        let mut received = Vec::new();
        while let Ok(s) = tap.pop() {
            received.push(s);
        }
        assert_eq!(received, buf);
    }

    #[test]
    fn full_tap_drops_instead_of_blocking() {
        let mut stage = OutputStage::new(1.0);
        let _tap = stage.install_tap(4);

        let buf = vec![0.5f32; 64];
        stage.push_tap(&buf); // must not panic or spin
    }
}
