use crate::{
    enums::{ColorOrder, ValueRange},
    imagebuffer::ImageBuffer,
    primitives::ExecutionContext,
    resize,
    rgbimage::RgbImage,
    stats,
};

use anyhow::{anyhow, Result};

const SMALLGRAD_FRACTION: f64 = 0.3;
const SMALLGRAD_MIN_SAMPLES: usize = 10;
const METRIC_Q_PATCH_SIZE: usize = 8;
const AUTOCORR_MARGIN: usize = 50;
const PYRAMID_MIN_DIM: usize = 16;
const SATURATION_CUTOFF: f32 = 10.0 / 255.0;

fn gradient_magnitude(ctx: &ExecutionContext, band: &ImageBuffer) -> Result<Vec<f32>> {
    let (dx, dy) = ctx.backend().gradient(band)?;
    Ok(dx
        .buffer
        .iter()
        .zip(dy.buffer.iter())
        .map(|(gx, gy)| (gx * gx + gy * gy).sqrt())
        .collect())
}

/// Sum over bands of the p=0.66 robust gradient norm. Sharp images have
/// sparse gradients, so smaller is sharper.
pub fn sparsity(ctx: &ExecutionContext, tensor: &RgbImage) -> Result<f64> {
    tensor.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let mut result = 0.0_f64;
    for band in 0..tensor.num_bands() {
        let d = gradient_magnitude(ctx, tensor.get_band(band))?;
        result += ctx.backend().mean_norm(&d, 0.66)?;
    }
    Ok(result)
}

/// Robust spread of the lowest 30% of band-averaged gradient magnitudes.
/// Over-smoothed or noisy flat regions show up here.
pub fn smallgrad(ctx: &ExecutionContext, tensor: &RgbImage) -> Result<f64> {
    tensor.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let mut d = vec![0.0_f32; tensor.width * tensor.height];
    for band in 0..tensor.num_bands() {
        let mag = gradient_magnitude(ctx, tensor.get_band(band))?;
        for (acc, v) in d.iter_mut().zip(mag.iter()) {
            *acc += v;
        }
    }
    let band_count = tensor.num_bands() as f32;
    for v in d.iter_mut() {
        *v /= band_count;
    }

    d.sort_by(|a, b| a.total_cmp(b));
    // Floor of 10 samples; tiny images degenerate to near-full-sample stats
    let n = ((d.len() as f64 * SMALLGRAD_FRACTION).round() as usize)
        .max(SMALLGRAD_MIN_SAMPLES)
        .min(d.len());

    ctx.backend().robust_spread(&d[..n], 0.1)
}

/// Negated patch-anisotropy sharpness on the [0,255] grayscale projection.
/// The sign pairs with the trained weight and must not change independently.
pub fn metric_q(ctx: &ExecutionContext, tensor: &RgbImage) -> Result<f64> {
    tensor.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let gray = tensor.grayscale()?.scale(255.0)?;
    let quality = ctx
        .backend()
        .anisotropy_quality(&gray, METRIC_Q_PATCH_SIZE)?;
    Ok(-quality)
}

/// Radial-max aggregation of the grayscale self-correlation map. Periodic
/// ringing shows up as strong off-center correlation at some radius,
/// regardless of direction.
pub fn auto_corr(ctx: &ExecutionContext, tensor: &RgbImage) -> Result<f64> {
    tensor.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let gray = tensor.grayscale()?;
    let ncc = ctx
        .backend()
        .cross_correlate(&gray, &gray, AUTOCORR_MARGIN)?;

    if ncc.width != ncc.height {
        return Err(anyhow!(
            "auto_corr: correlation map is not square: {}x{}",
            ncc.width,
            ncc.height
        ));
    }
    if ncc.width % 2 != 1 {
        return Err(anyhow!(
            "auto_corr: correlation map side is not odd: {}",
            ncc.width
        ));
    }

    let radius = (ncc.width - 1) / 2;
    let mut max_m = vec![0.0_f64; radius + 1];

    for y in 0..ncc.height {
        for x in 0..ncc.width {
            let dist = ((y as f64 - radius as f64).powi(2)
                + (x as f64 - radius as f64).powi(2))
            .sqrt();
            let value = ncc.get(x, y).abs() as f64;
            // A cell feeds every integer radius within 1.0 of its distance
            for (r, slot) in max_m.iter_mut().enumerate() {
                if (dist - r as f64).abs() < 1.0 && value > *slot {
                    *slot = value;
                }
            }
        }
    }

    // Suppress the trivial self-correlation peak at the center
    max_m[0] = 0.0;

    Ok(max_m.iter().sum())
}

/// Ratio of the order-1 to order-2 gradient norms on grayscale. A flat
/// image has no gradient mass at all and maps to 0.
pub fn norm_sparsity(ctx: &ExecutionContext, tensor: &RgbImage) -> Result<f64> {
    tensor.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let d = gradient_magnitude(ctx, &tensor.grayscale()?)?;
    let n1 = ctx.backend().mean_norm(&d, 1.0)?;
    let n2 = ctx.backend().mean_norm(&d, 2.0)?;
    if n2 == 0.0 {
        return Ok(0.0);
    }
    Ok(n1 / n2)
}

/// Negated cumulative probability of blur detection on the 8-bit grayscale.
pub fn cpbd(ctx: &ExecutionContext, image: &RgbImage) -> Result<f64> {
    image.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let gray = image.grayscale()?.scale(255.0)?.clip(0.0, 255.0)?;
    let probability = ctx
        .backend()
        .blur_probability(&gray.to_vector_u8(), gray.width, gray.height)?;
    Ok(-probability)
}

/// Multi-scale ring artifact accumulation: align the pair, then sum the mean
/// ring-edge difference over the downsampled scales. The full-resolution
/// scale is excluded; halos read best at coarser scales and fine texture
/// would only add false positives.
pub fn pyr_ring(
    ctx: &ExecutionContext,
    deblurred: &RgbImage,
    blurred: &RgbImage,
) -> Result<f64> {
    deblurred.require(ColorOrder::Rgb, ValueRange::Unit)?;
    blurred.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let (aligned, reference) = ctx.backend().align(deblurred, blurred, true)?;

    let height = aligned.height;
    let width = aligned.width;

    let mut result = 0.0_f64;
    let mut j = 0_u32;
    loop {
        let coef = 0.5_f64.powi(j as i32);
        let cur_height = (height as f64 * coef).round() as usize;
        let cur_width = (width as f64 * coef).round() as usize;
        if cur_height.min(cur_width) < PYRAMID_MIN_DIM {
            break;
        }

        let cur_a = resize_image(&aligned, cur_width, cur_height)?;
        let cur_b = resize_image(&reference, cur_width, cur_height)?;

        let diff = ctx.backend().ring_difference(&cur_a, &cur_b)?;
        if j > 0 {
            result += stats::mean(&diff.buffer) as f64;
        }

        j += 1;
    }

    Ok(result)
}

fn resize_image(image: &RgbImage, to_width: usize, to_height: usize) -> Result<RgbImage> {
    let mut bands = Vec::with_capacity(image.num_bands());
    for band in 0..image.num_bands() {
        bands.push(resize::resize_to(image.get_band(band), to_width, to_height)?);
    }
    RgbImage::from_bands(bands, image.order(), image.range())
}

/// Fraction of pixels clipped near pure black or pure white.
pub fn saturation(image: &RgbImage) -> Result<f64> {
    image.require(ColorOrder::Rgb, ValueRange::Unit)?;

    let r = image.get_band(0);
    let g = image.get_band(1);
    let b = image.get_band(2);

    let mut count_low = 0_usize;
    let mut count_high = 0_usize;
    let pixel_count = image.width * image.height;

    for i in 0..pixel_count {
        let rv = r.buffer[i];
        let gv = g.buffer[i];
        let bv = b.buffer[i];
        let max_value = rv.max(gv).max(bv);
        let min_value = rv.min(gv).min(bv);
        if max_value <= SATURATION_CUTOFF {
            count_low += 1;
        }
        if min_value >= 1.0 - SATURATION_CUTOFF {
            count_high += 1;
        }
    }

    let result_low = count_low as f64 / pixel_count as f64;
    let result_high = count_high as f64 / pixel_count as f64;
    Ok(result_low + result_high)
}
