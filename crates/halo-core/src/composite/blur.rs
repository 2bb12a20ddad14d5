//! Separable Gaussian blur over coverage masks
//!
//! Weights are quantized to Q16 so the result is reproducible bit for bit.
//! Pixels past the edge count as empty coverage: a glow fades out at the
//! border instead of smearing edge pixels inward.

use super::mask::CoverageMask;
use crate::error::{HaloError, Result};

/// Blur `mask` with a Gaussian of standard deviation `radius`
///
/// A radius of 0 returns the mask unchanged.
pub fn gaussian_blur(mask: &CoverageMask, radius: f32) -> Result<CoverageMask> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(HaloError::invalid(format!(
            "blur radius must be a finite value >= 0, got {radius}"
        )));
    }
    if radius == 0.0 || mask.width() == 0 || mask.height() == 0 {
        return Ok(mask.clone());
    }

    let max_reach = mask.width().max(mask.height()) as usize;
    let kernel = gaussian_kernel_q16(radius, max_reach)?;
    let (width, height) = (mask.width() as usize, mask.height() as usize);

    let mut tmp = vec![0u8; width * height];
    let mut out = vec![0u8; width * height];
    horizontal_pass(mask.data(), &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);

    CoverageMask::from_raw(mask.width(), mask.height(), out)
        .ok_or_else(|| HaloError::Pipeline("blur produced a mismatched buffer".into()))
}

/// Normalized kernel, half-width `ceil(3σ)` capped at `max_reach`
fn gaussian_kernel_q16(sigma: f32, max_reach: usize) -> Result<Vec<u32>> {
    let half = ((3.0 * sigma).ceil() as usize).clamp(1, max_reach.max(1));
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;

    let weights_f: Vec<f64> = (0..=2 * half)
        .map(|i| {
            let x = i as f64 - half as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(HaloError::Pipeline("gaussian kernel sum is zero".into()));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|&w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push the rounding residue into the center tap so weights sum to 1.0
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32]) {
    let half = kernel.len() / 2;
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0u64;
            for (ki, &kw) in kernel.iter().enumerate() {
                let sx = x + ki;
                if sx < half || sx - half >= width {
                    continue;
                }
                acc += u64::from(kw) * u64::from(row[sx - half]);
            }
            dst[y * width + x] = q16_to_u8(acc);
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32]) {
    let half = kernel.len() / 2;
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u64;
            for (ki, &kw) in kernel.iter().enumerate() {
                let sy = y + ki;
                if sy < half || sy - half >= height {
                    continue;
                }
                acc += u64::from(kw) * u64::from(src[(sy - half) * width + x]);
            }
            dst[y * width + x] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(size: u32) -> CoverageMask {
        let mut data = vec![0u8; (size * size) as usize];
        let c = size / 2;
        data[(c * size + c) as usize] = 255;
        CoverageMask::from_raw(size, size, data).unwrap()
    }

    fn lit_pixels(mask: &CoverageMask) -> usize {
        mask.data().iter().filter(|&&c| c > 0).count()
    }

    #[test]
    fn radius_zero_is_identity() {
        let mask = dot(9);
        assert_eq!(gaussian_blur(&mask, 0.0).unwrap(), mask);
    }

    #[test]
    fn kernel_weights_sum_to_one() {
        for sigma in [0.3, 1.0, 2.5, 8.0] {
            let kernel = gaussian_kernel_q16(sigma, 1024).unwrap();
            assert_eq!(kernel.iter().sum::<u32>(), 65536, "sigma {sigma}");
            assert_eq!(kernel.len() % 2, 1);
        }
    }

    #[test]
    fn kernel_is_capped_by_canvas() {
        let kernel = gaussian_kernel_q16(1000.0, 10).unwrap();
        assert_eq!(kernel.len(), 21);
    }

    #[test]
    fn constant_interior_is_preserved() {
        let size = 40u32;
        let mut data = vec![0u8; (size * size) as usize];
        for y in 5..35 {
            for x in 5..35 {
                data[(y * size + x) as usize] = 180;
            }
        }
        let mask = CoverageMask::from_raw(size, size, data).unwrap();
        let out = gaussian_blur(&mask, 1.0).unwrap();
        assert_eq!(out.get(20, 20), 180);
    }

    #[test]
    fn blur_spreads_energy_without_losing_it() {
        let mask = dot(21);
        let out = gaussian_blur(&mask, 1.5).unwrap();

        assert!(lit_pixels(&out) > 1);
        assert!(out.get(10, 10) < 255);
        let total = out.total() as i64;
        assert!((total - 255).abs() <= 32, "energy drifted to {total}");
    }

    #[test]
    fn larger_radius_spreads_further() {
        let mut block = vec![0u8; 41 * 41];
        for y in 18..23 {
            for x in 18..23 {
                block[y * 41 + x] = 255;
            }
        }
        let mask = CoverageMask::from_raw(41, 41, block).unwrap();

        let small = gaussian_blur(&mask, 1.0).unwrap();
        let large = gaussian_blur(&mask, 4.0).unwrap();
        assert!(lit_pixels(&large) > lit_pixels(&small));
        assert!(large.get(20, 20) < small.get(20, 20));
    }

    #[test]
    fn blur_is_deterministic() {
        let mask = dot(31);
        assert_eq!(
            gaussian_blur(&mask, 2.2).unwrap(),
            gaussian_blur(&mask, 2.2).unwrap()
        );
    }

    #[test]
    fn rejects_negative_radius() {
        assert!(gaussian_blur(&dot(3), -1.0).is_err());
        assert!(gaussian_blur(&dot(3), f32::NAN).is_err());
    }
}
