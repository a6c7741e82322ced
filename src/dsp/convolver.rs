use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/*
Partitioned Convolution
=======================

Convolving a signal with a multi-second impulse response directly is O(N·M)
per block - unusable when M is a few hundred thousand taps. The standard fix
is uniformly partitioned fast convolution:

1. Split the impulse response into P partitions of B samples, zero-pad each to
   2B, and keep their FFTs (the "spectra").
2. Keep the FFTs of the last P input blocks in a frequency-delay line (FDL).
3. Every B input samples: FFT the newest block, multiply-accumulate
   spectrum[k] · input[t-k] across the FDL, inverse-FFT the sum, and
   overlap-add the second half saved from the previous round.

Cost per B samples: one FFT, one IFFT, and P complex multiply-adds per bin -
bounded regardless of impulse length. The price is B samples of latency
(~21 ms at the default partition size), which is ordinary for convolution
reverb.

The streaming interface is sample-by-sample: `next_sample` consumes one input
and yields one output, running a partition round every B samples. All buffers
are allocated when the impulse response is installed; the render path is
allocation-free.
*/

const PARTITION_SIZE: usize = 1024;

pub struct Convolver {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,

    /// FFT of each impulse-response partition, zero-padded to 2B.
    spectra: Vec<Vec<Complex<f32>>>,
    /// Frequency-delay line: FFTs of the most recent input blocks.
    fdl: Vec<Vec<Complex<f32>>>,
    fdl_head: usize,

    accum: Vec<Complex<f32>>,
    time_buf: Vec<Complex<f32>>,
    overlap: Vec<f32>,

    in_block: Vec<f32>,
    out_block: Vec<f32>,
    pos: usize,
}

impl Convolver {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(2 * PARTITION_SIZE);
        let ifft = planner.plan_fft_inverse(2 * PARTITION_SIZE);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        Self {
            fft,
            ifft,
            scratch: vec![Complex::default(); scratch_len],
            spectra: Vec::new(),
            fdl: Vec::new(),
            fdl_head: 0,
            accum: vec![Complex::default(); 2 * PARTITION_SIZE],
            time_buf: vec![Complex::default(); 2 * PARTITION_SIZE],
            overlap: vec![0.0; PARTITION_SIZE],
            in_block: vec![0.0; PARTITION_SIZE],
            out_block: vec![0.0; PARTITION_SIZE],
            pos: 0,
        }
    }

    /// Install a new impulse response, replacing partition spectra and
    /// clearing all streaming state. Control-path only: this allocates.
    pub fn set_impulse_response(&mut self, ir: &[f32]) {
        self.spectra.clear();

        for part in ir.chunks(PARTITION_SIZE) {
            let mut buf = vec![Complex::default(); 2 * PARTITION_SIZE];
            for (slot, &sample) in buf.iter_mut().zip(part.iter()) {
                slot.re = sample;
            }
            self.fft.process_with_scratch(&mut buf, &mut self.scratch);
            self.spectra.push(buf);
        }

        self.fdl = self
            .spectra
            .iter()
            .map(|_| vec![Complex::default(); 2 * PARTITION_SIZE])
            .collect();
        self.fdl_head = 0;
        self.reset();
    }

    /// Clear streaming state (tails), keeping the installed impulse response.
    pub fn reset(&mut self) {
        for block in &mut self.fdl {
            block.fill(Complex::default());
        }
        self.overlap.fill(0.0);
        self.in_block.fill(0.0);
        self.out_block.fill(0.0);
        self.pos = 0;
    }

    pub fn has_impulse_response(&self) -> bool {
        !self.spectra.is_empty()
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32) -> f32 {
        if self.spectra.is_empty() {
            return 0.0;
        }

        let out = self.out_block[self.pos];
        self.in_block[self.pos] = input;
        self.pos += 1;

        if self.pos == PARTITION_SIZE {
            self.run_partition();
            self.pos = 0;
        }

        out
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    fn run_partition(&mut self) {
        let parts = self.spectra.len();

        // FFT the newest input block into the FDL slot the oldest occupied.
        self.fdl_head = (self.fdl_head + parts - 1) % parts;
        let newest = &mut self.fdl[self.fdl_head];
        for (slot, &sample) in newest.iter_mut().zip(self.in_block.iter()) {
            *slot = Complex::new(sample, 0.0);
        }
        for slot in newest.iter_mut().skip(PARTITION_SIZE) {
            *slot = Complex::default();
        }
        self.fft.process_with_scratch(newest, &mut self.scratch);

        // accum[f] = sum over k of spectra[k][f] * fdl[t-k][f]
        self.accum.fill(Complex::default());
        for (k, spectrum) in self.spectra.iter().enumerate() {
            let block = &self.fdl[(self.fdl_head + k) % parts];
            for ((acc, &h), &x) in self.accum.iter_mut().zip(spectrum.iter()).zip(block.iter()) {
                *acc += h * x;
            }
        }

        // Back to the time domain; rustfft's inverse is unnormalized.
        self.time_buf.copy_from_slice(&self.accum);
        self.ifft
            .process_with_scratch(&mut self.time_buf, &mut self.scratch);
        let scale = 1.0 / (2 * PARTITION_SIZE) as f32;

        // Overlap-add: first half plus saved tail is the output, second half
        // becomes the next tail.
        for i in 0..PARTITION_SIZE {
            self.out_block[i] = self.time_buf[i].re * scale + self.overlap[i];
            self.overlap[i] = self.time_buf[PARTITION_SIZE + i].re * scale;
        }
    }
}

impl Default for Convolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct-form convolution as the reference implementation.
    fn direct_convolve(signal: &[f32], ir: &[f32], len: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; len];
        for (n, slot) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (k, &h) in ir.iter().enumerate() {
                if n >= k && n - k < signal.len() {
                    acc += h * signal[n - k];
                }
            }
            *slot = acc;
        }
        out
    }

    #[test]
    fn no_impulse_response_yields_silence() {
        let mut conv = Convolver::new();
        let mut buf = vec![1.0f32; 256];
        conv.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn matches_direct_convolution() {
        // IR longer than one partition to exercise the FDL.
        let ir: Vec<f32> = (0..PARTITION_SIZE + 500)
            .map(|i| if i % 37 == 0 { 0.5 } else { 0.0 })
            .collect();

        let signal: Vec<f32> = (0..PARTITION_SIZE * 3)
            .map(|i| ((i * 7919) % 101) as f32 / 101.0 - 0.5)
            .collect();

        let mut conv = Convolver::new();
        conv.set_impulse_response(&ir);

        // Feed the signal; the convolver is PARTITION_SIZE samples behind.
        let mut streamed = Vec::new();
        let mut padded = signal.clone();
        padded.extend(std::iter::repeat(0.0).take(PARTITION_SIZE));
        for &x in &padded {
            streamed.push(conv.next_sample(x));
        }

        let expected = direct_convolve(&signal, &ir, signal.len());
        for (n, &want) in expected.iter().enumerate().take(2 * PARTITION_SIZE) {
            let got = streamed[n + PARTITION_SIZE];
            assert!(
                (got - want).abs() < 1e-3,
                "sample {n}: expected {want}, got {got}"
            );
        }
    }

    #[test]
    fn reset_clears_the_tail() {
        let ir = vec![0.8f32; 2048];
        let mut conv = Convolver::new();
        conv.set_impulse_response(&ir);

        // Excite, then reset; silence in must give silence out.
        let mut buf = vec![1.0f32; 4096];
        conv.render(&mut buf);
        conv.reset();

        let mut silent = vec![0.0f32; 4096];
        conv.render(&mut silent);
        assert!(silent.iter().all(|&s| s.abs() < 1e-6));
    }
}
