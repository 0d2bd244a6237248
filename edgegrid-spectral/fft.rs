use std::collections::HashMap;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{SpectralError, SpectralResult};

/// Forward FFT plans keyed by transform length, shareable across threads
#[derive(Clone)]
pub struct FftPlans {
    plans: HashMap<usize, Arc<dyn Fft<f64>>>,
}

impl FftPlans {
    /// Plan forward transforms for every listed length
    pub fn for_lengths<I>(lengths: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut planner = FftPlanner::<f64>::new();
        let mut plans = HashMap::new();
        for n in lengths {
            plans
                .entry(n)
                .or_insert_with(|| planner.plan_fft_forward(n));
        }
        Self { plans }
    }

    fn plan(&self, n: usize) -> SpectralResult<&Arc<dyn Fft<f64>>> {
        self.plans.get(&n).ok_or(SpectralError::UnplannedLength(n))
    }

    /// 2-D DFT of a real row-major `width`×`height` block.
    ///
    /// Rows are transformed in place, then the columns via a transpose.
    pub fn forward_2d(&self, block: &[f64], width: usize, height: usize) -> SpectralResult<Vec<Complex<f64>>> {
        if block.len() != width * height {
            return Err(SpectralError::InvalidImageData {
                expected_len: width * height,
                actual_len: block.len(),
            });
        }

        let mut rows: Vec<Complex<f64>> = block.iter().map(|&v| Complex::new(v, 0.0)).collect();
        self.plan(width)?.process(&mut rows);

        let mut cols = transpose(&rows, width, height);
        self.plan(height)?.process(&mut cols);

        Ok(transpose(&cols, height, width))
    }
}

impl std::fmt::Debug for FftPlans {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut lengths: Vec<_> = self.plans.keys().copied().collect();
        lengths.sort_unstable();
        f.debug_struct("FftPlans").field("lengths", &lengths).finish()
    }
}

/// Transpose a row-major `width`×`height` buffer into `height`×`width`
pub fn transpose<T: Copy>(data: &[T], width: usize, height: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(data.len());
    for x in 0..width {
        for y in 0..height {
            out.push(data[y * width + x]);
        }
    }
    out
}

/// Move the zero-frequency bin from index 0 to index `n / 2` along both axes
pub fn fft_shift<T: Copy + Default>(data: &[T], width: usize, height: usize) -> Vec<T> {
    let mut out = vec![T::default(); data.len()];
    for y in 0..height {
        let sy = (y + height / 2) % height;
        for x in 0..width {
            let sx = (x + width / 2) % width;
            out[sy * width + sx] = data[y * width + x];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn naive_dft(block: &[f64], w: usize, h: usize) -> Vec<Complex<f64>> {
        let mut out = vec![Complex::new(0.0, 0.0); w * h];
        for v in 0..h {
            for u in 0..w {
                let mut acc = Complex::new(0.0, 0.0);
                for y in 0..h {
                    for x in 0..w {
                        let phase = -2.0 * PI * ((u * x) as f64 / w as f64 + (v * y) as f64 / h as f64);
                        acc += Complex::new(phase.cos(), phase.sin()) * block[y * w + x];
                    }
                }
                out[v * w + u] = acc;
            }
        }
        out
    }

    #[test]
    fn test_matches_naive_dft() {
        let (w, h) = (5, 3);
        let block: Vec<f64> = (0..w * h).map(|k| ((k * 37) % 11) as f64).collect();
        let plans = FftPlans::for_lengths([w, h]);
        let fast = plans.forward_2d(&block, w, h).unwrap();
        let slow = naive_dft(&block, w, h);
        for (a, b) in fast.iter().zip(slow.iter()) {
            assert!((a - b).norm() < 1e-9, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_constant_block_has_only_dc() {
        let n = 15;
        let block = vec![4.0; n * n];
        let plans = FftPlans::for_lengths([n]);
        let spectrum = plans.forward_2d(&block, n, n).unwrap();
        assert!((spectrum[0].re - 4.0 * (n * n) as f64).abs() < 1e-9);
        assert!(spectrum[1..].iter().all(|c| c.norm() < 1e-9));
    }

    #[test]
    fn test_missing_plan() {
        let plans = FftPlans::for_lengths([4]);
        let result = plans.forward_2d(&[0.0; 12], 4, 3);
        assert!(matches!(result, Err(SpectralError::UnplannedLength(3))));
    }

    #[test]
    fn test_length_mismatch() {
        let plans = FftPlans::for_lengths([4]);
        let result = plans.forward_2d(&[0.0; 15], 4, 4);
        assert!(matches!(result, Err(SpectralError::InvalidImageData { expected_len: 16, actual_len: 15 })));
    }

    #[test]
    fn test_shift_centers_dc_odd() {
        let n = 15;
        let mut data = vec![0u8; n * n];
        data[0] = 1;
        let shifted = fft_shift(&data, n, n);
        assert_eq!(shifted[7 * n + 7], 1);
        assert_eq!(shifted.iter().filter(|&&v| v == 1).count(), 1);
    }

    #[test]
    fn test_shift_even_matches_half_roll() {
        // [0 1 2 3] -> [2 3 0 1]
        let shifted = fft_shift(&[0, 1, 2, 3], 4, 1);
        assert_eq!(shifted, vec![2, 3, 0, 1]);
        // [0 1 2 3 4] -> [3 4 0 1 2]
        let shifted = fft_shift(&[0, 1, 2, 3, 4], 5, 1);
        assert_eq!(shifted, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_transpose() {
        let data = [1, 2, 3, 4, 5, 6]; // 3 wide, 2 high
        assert_eq!(transpose(&data, 3, 2), vec![1, 4, 2, 5, 3, 6]);
    }
}
