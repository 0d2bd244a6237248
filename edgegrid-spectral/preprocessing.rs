use edgegrid_core::{CellBounds, LumaImage};
use std::f64::consts::PI;

use crate::error::{SpectralError, SpectralResult};
use crate::types::WindowFunction;

/// Block extraction, luminance conversion and resampling for the extractor
pub struct Preprocessing;

impl Preprocessing {
    /// ITU-R BT.601 luma of an interleaved RGB buffer (`299 R + 587 G + 114 B`)
    pub fn rgb_to_luma(rgb: &[u8], width: usize, height: usize) -> SpectralResult<LumaImage> {
        if rgb.len() != width * height * 3 {
            return Err(SpectralError::InvalidImageData {
                expected_len: width * height * 3,
                actual_len: rgb.len(),
            });
        }
        Ok(rgb
            .chunks_exact(3)
            .map(|px| {
                let y = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
                ((y + 500) / 1000) as u8
            })
            .collect())
    }

    /// Copy the pixels of `bounds` out of a row-major image as floats
    pub fn extract_block(img: &LumaImage, width: usize, bounds: CellBounds) -> Vec<f64> {
        let mut block = Vec::with_capacity(bounds.width() * bounds.height());
        for y in bounds.y0..bounds.y1 {
            let row = y * width;
            block.extend(img[row + bounds.x0..row + bounds.x1].iter().map(|&v| v as f64));
        }
        block
    }

    /// Separable window coefficients for a `width`×`height` block, row-major
    pub fn window_coefficients(window: WindowFunction, width: usize, height: usize) -> Option<Vec<f64>> {
        match window {
            WindowFunction::None => None,
            WindowFunction::Hann => {
                let wx = Self::hann(width);
                let wy = Self::hann(height);
                Some(wy.iter().flat_map(|&a| wx.iter().map(move |&b| a * b)).collect())
            }
        }
    }

    fn hann(n: usize) -> Vec<f64> {
        if n <= 1 {
            return vec![1.0; n];
        }
        (0..n)
            .map(|k| 0.5 - 0.5 * (2.0 * PI * k as f64 / (n - 1) as f64).cos())
            .collect()
    }

    /// Resize a row-major 8-bit block using bilinear interpolation
    pub fn resample_block(block: &[u8], src_width: usize, src_height: usize, target_width: usize, target_height: usize) -> Vec<u8> {
        if src_width == target_width && src_height == target_height {
            return block.to_vec();
        }

        let mut out = vec![0u8; target_width * target_height];
        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                // Sample at pixel centers
                let src_x = ((x as f32 + 0.5) * x_ratio - 0.5).clamp(0.0, (src_width - 1) as f32);
                let src_y = ((y as f32 + 0.5) * y_ratio - 0.5).clamp(0.0, (src_height - 1) as f32);
                let value = Self::bilinear_sample(block, src_width, src_height, src_x, src_y);
                out[y * target_width + x] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    fn bilinear_sample(img: &[u8], width: usize, height: usize, x: f32, y: f32) -> f32 {
        let x1 = x.floor() as usize;
        let y1 = y.floor() as usize;
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let p11 = img[y1 * width + x1] as f32;
        let p12 = img[y1 * width + x2] as f32;
        let p21 = img[y2 * width + x1] as f32;
        let p22 = img[y2 * width + x2] as f32;

        let top = p11 * (1.0 - fx) + p12 * fx;
        let bottom = p21 * (1.0 - fx) + p22 * fx;

        top * (1.0 - fy) + bottom * fy
    }
}
