use crate::{
    imagebuffer::ImageBuffer,
    primitives::Primitives,
    rgbimage::RgbImage,
    stats,
};

use anyhow::{anyhow, Result};
use itertools::iproduct;

/// CPU reference backend. Exact, unaccelerated implementations of every
/// primitive; an accelerated backend can replace any subset behind the
/// `Primitives` trait.
#[derive(Debug, Default)]
pub struct ReferenceBackend;

// Minimum horizontal gradient for a pixel to count as an edge in the blur
// probability estimate.
const EDGE_GRADIENT_MIN: f32 = 10.0;

// Just-noticeable-blur widths from the CPBD literature: wider halos are
// tolerated across high-contrast edges.
const JNB_WIDTH_HIGH_CONTRAST: f64 = 5.0;
const JNB_WIDTH_LOW_CONTRAST: f64 = 3.0;
const JNB_CONTRAST_SPLIT: f32 = 50.0;
const JNB_BETA: f64 = 3.6;
const JNB_PROBABILITY: f64 = 0.63;

// Coherence gate for counting a patch as anisotropic.
const ANISOTROPY_COHERENCE_MIN: f64 = 0.5;

// Translation search window for image pair alignment.
const ALIGN_SEARCH_MARGIN: usize = 10;

impl ReferenceBackend {
    fn gradient_magnitude(&self, buffer: &ImageBuffer) -> Result<ImageBuffer> {
        let (dx, dy) = self.gradient(buffer)?;
        let v = dx
            .buffer
            .iter()
            .zip(dy.buffer.iter())
            .map(|(gx, gy)| (gx * gx + gy * gy).sqrt())
            .collect();
        ImageBuffer::from_vec(v, buffer.width, buffer.height)
    }
}

impl Primitives for ReferenceBackend {
    // Central differences in the interior, one-sided at the borders.
    fn gradient(&self, buffer: &ImageBuffer) -> Result<(ImageBuffer, ImageBuffer)> {
        let w = buffer.width;
        let h = buffer.height;
        let mut dx = ImageBuffer::new(w, h)?;
        let mut dy = ImageBuffer::new(w, h)?;

        for y in 0..h {
            for x in 0..w {
                let gx = if w < 2 {
                    0.0
                } else if x == 0 {
                    buffer.get(1, y) - buffer.get(0, y)
                } else if x == w - 1 {
                    buffer.get(w - 1, y) - buffer.get(w - 2, y)
                } else {
                    (buffer.get(x + 1, y) - buffer.get(x - 1, y)) * 0.5
                };

                let gy = if h < 2 {
                    0.0
                } else if y == 0 {
                    buffer.get(x, 1) - buffer.get(x, 0)
                } else if y == h - 1 {
                    buffer.get(x, h - 1) - buffer.get(x, h - 2)
                } else {
                    (buffer.get(x, y + 1) - buffer.get(x, y - 1)) * 0.5
                };

                dx.put(x, y, gx);
                dy.put(x, y, gy);
            }
        }

        Ok((dx, dy))
    }

    fn mean_norm(&self, data: &[f32], p: f32) -> Result<f64> {
        stats::mean_norm(data, p)
    }

    fn robust_spread(&self, data: &[f32], p: f32) -> Result<f64> {
        stats::quantile_spread(data, p)
    }

    // Zhu-Milanfar metric Q: per patch, singular values of the gradient
    // structure matrix gate and weight the contribution.
    fn anisotropy_quality(&self, gray: &ImageBuffer, patch_size: usize) -> Result<f64> {
        if patch_size == 0 {
            return Err(anyhow!("Patch size must be nonzero"));
        }

        let (dx, dy) = self.gradient(gray)?;

        let patches_x = gray.width / patch_size;
        let patches_y = gray.height / patch_size;
        if patches_x == 0 || patches_y == 0 {
            return Err(anyhow!(
                "Image {}x{} too small for {}px patches",
                gray.width,
                gray.height,
                patch_size
            ));
        }

        let mut total = 0.0_f64;
        for (py, px) in iproduct!(0..patches_y, 0..patches_x) {
            let mut jxx = 0.0_f64;
            let mut jxy = 0.0_f64;
            let mut jyy = 0.0_f64;
            for (y, x) in iproduct!(0..patch_size, 0..patch_size) {
                let gx = dx.get(px * patch_size + x, py * patch_size + y) as f64;
                let gy = dy.get(px * patch_size + x, py * patch_size + y) as f64;
                jxx += gx * gx;
                jxy += gx * gy;
                jyy += gy * gy;
            }

            // Eigenvalues of the 2x2 structure matrix
            let trace = jxx + jyy;
            let det = jxx * jyy - jxy * jxy;
            let disc = (trace * trace - 4.0 * det).max(0.0).sqrt();
            let s1 = ((trace + disc) * 0.5).max(0.0).sqrt();
            let s2 = ((trace - disc) * 0.5).max(0.0).sqrt();

            if s1 + s2 > 0.0 {
                let coherence = (s1 - s2) / (s1 + s2);
                if coherence > ANISOTROPY_COHERENCE_MIN {
                    total += s1 * coherence;
                }
            }
        }

        Ok(total / (patches_x * patches_y) as f64)
    }

    // Pearson correlation of the overlapping regions at every integer offset
    // in [-margin, margin] on both axes. Degenerate overlaps map to 0, so the
    // map is well defined even when the margin exceeds the image size.
    fn cross_correlate(
        &self,
        a: &ImageBuffer,
        b: &ImageBuffer,
        margin: usize,
    ) -> Result<ImageBuffer> {
        if a.width != b.width || a.height != b.height {
            return Err(anyhow!(
                "Correlation input size mismatch: {}x{} vs {}x{}",
                a.width,
                a.height,
                b.width,
                b.height
            ));
        }

        let m = margin as i32;
        let n = 2 * margin + 1;
        let w = a.width as i32;
        let h = a.height as i32;
        let mut map = ImageBuffer::new(n, n)?;

        for (dy, dx) in iproduct!(-m..=m, -m..=m) {
            let y0 = dy.max(0);
            let y1 = h + dy.min(0);
            let x0 = dx.max(0);
            let x1 = w + dx.min(0);
            if y0 >= y1 || x0 >= x1 {
                continue;
            }

            let mut sa = 0.0_f64;
            let mut sb = 0.0_f64;
            let mut saa = 0.0_f64;
            let mut sbb = 0.0_f64;
            let mut sab = 0.0_f64;
            let count = ((y1 - y0) * (x1 - x0)) as f64;

            for (y, x) in iproduct!(y0..y1, x0..x1) {
                let va = a.get(x as usize, y as usize) as f64;
                let vb = b.get((x - dx) as usize, (y - dy) as usize) as f64;
                sa += va;
                sb += vb;
                saa += va * va;
                sbb += vb * vb;
                sab += va * vb;
            }

            let cov = sab - sa * sb / count;
            let var_a = saa - sa * sa / count;
            let var_b = sbb - sb * sb / count;
            let ncc = if var_a > f64::EPSILON && var_b > f64::EPSILON {
                cov / (var_a * var_b).sqrt()
            } else {
                0.0
            };

            map.put((dx + m) as usize, (dy + m) as usize, ncc as f32);
        }

        Ok(map)
    }

    // Reduced CPBD: row-wise edge detection, edge width measured between the
    // neighboring luminance extrema, probability of blur accumulated per edge.
    fn blur_probability(&self, gray: &[u8], width: usize, height: usize) -> Result<f64> {
        if gray.len() != width * height {
            return Err(anyhow!(
                "Grayscale buffer length {} does not match {}x{}",
                gray.len(),
                width,
                height
            ));
        }
        if width < 3 {
            return Ok(0.0);
        }

        let row_at = |y: usize, x: usize| gray[y * width + x] as f32;

        let mut edges = 0_usize;
        let mut sharp = 0_usize;

        for y in 0..height {
            for x in 1..width - 1 {
                let gx = (row_at(y, x + 1) - row_at(y, x - 1)) * 0.5;
                if gx.abs() < EDGE_GRADIENT_MIN {
                    continue;
                }

                // Walk outward to the nearest local extrema on each side.
                let rising = gx > 0.0;
                let mut left = x;
                while left > 0 {
                    let further = row_at(y, left - 1);
                    let here = row_at(y, left);
                    let keep_going = if rising { further < here } else { further > here };
                    if !keep_going {
                        break;
                    }
                    left -= 1;
                }
                let mut right = x;
                while right < width - 1 {
                    let further = row_at(y, right + 1);
                    let here = row_at(y, right);
                    let keep_going = if rising { further > here } else { further < here };
                    if !keep_going {
                        break;
                    }
                    right += 1;
                }

                let edge_width = (right - left) as f64;
                let contrast = (row_at(y, right) - row_at(y, left)).abs();
                let jnb_width = if contrast > JNB_CONTRAST_SPLIT {
                    JNB_WIDTH_HIGH_CONTRAST
                } else {
                    JNB_WIDTH_LOW_CONTRAST
                };

                let p_blur = 1.0 - (-(edge_width / jnb_width).powf(JNB_BETA)).exp();
                edges += 1;
                if p_blur <= JNB_PROBABILITY {
                    sharp += 1;
                }
            }
        }

        if edges == 0 {
            return Ok(0.0);
        }
        Ok(sharp as f64 / edges as f64)
    }

    // Exhaustive integer-translation search on grayscale, then an optional
    // per-band gain/offset match of a onto b.
    fn align(&self, a: &RgbImage, b: &RgbImage, normalize: bool) -> Result<(RgbImage, RgbImage)> {
        if a.width != b.width || a.height != b.height {
            return Err(anyhow!(
                "Alignment input size mismatch: {}x{} vs {}x{}",
                a.width,
                a.height,
                b.width,
                b.height
            ));
        }

        let ga = a.grayscale()?;
        let gb = b.grayscale()?;
        let margin = ALIGN_SEARCH_MARGIN.min(a.width / 2).min(a.height / 2);
        let map = self.cross_correlate(&ga, &gb, margin)?;

        // Start from zero shift so flat inputs keep it on a tie.
        let m = margin as i32;
        let n = map.width;
        let mut best = map.get(margin, margin);
        let mut best_dx = 0_i32;
        let mut best_dy = 0_i32;
        for (y, x) in iproduct!(0..n, 0..n) {
            let v = map.get(x, y);
            if v > best {
                best = v;
                best_dx = x as i32 - m;
                best_dy = y as i32 - m;
            }
        }

        let mut bands: Vec<ImageBuffer> = Vec::with_capacity(3);
        for band in 0..a.num_bands() {
            let mut shifted = a.get_band(band).shift(-best_dx, -best_dy)?;

            if normalize {
                let target = b.get_band(band);
                let mean_a = shifted.mean();
                let mean_b = target.mean();
                let sd_a = stats::std_deviation(&shifted.buffer);
                let sd_b = stats::std_deviation(&target.buffer);
                let gain = if sd_a > f32::EPSILON { sd_b / sd_a } else { 1.0 };
                let v = shifted
                    .buffer
                    .iter()
                    .map(|p| (p - mean_a) * gain + mean_b)
                    .collect();
                shifted = ImageBuffer::from_vec(v, shifted.width, shifted.height)?;
            }

            bands.push(shifted);
        }

        let aligned = RgbImage::from_bands(bands, a.order(), a.range())?;
        Ok((aligned, b.clone()))
    }

    // Excess gradient of a over b, restricted to the dilated strong-edge
    // neighborhood of b. Halos around edges survive; the edges themselves
    // carry gradient in both images and cancel.
    fn ring_difference(&self, a: &RgbImage, b: &RgbImage) -> Result<ImageBuffer> {
        if a.width != b.width || a.height != b.height {
            return Err(anyhow!(
                "Ring difference input size mismatch: {}x{} vs {}x{}",
                a.width,
                a.height,
                b.width,
                b.height
            ));
        }

        let ga = self.gradient_magnitude(&a.grayscale()?)?;
        let gb = self.gradient_magnitude(&b.grayscale()?)?;
        let excess_map = ga.subtract(&gb)?;

        let w = ga.width;
        let h = ga.height;
        let threshold = 2.0 * gb.mean();

        let mut out = ImageBuffer::new(w, h)?;
        for (y, x) in iproduct!(0..h, 0..w) {
            let excess = excess_map.get(x, y).max(0.0);
            if excess <= 0.0 {
                continue;
            }

            // Chebyshev-radius-2 dilation of the strong-edge mask
            let mut near_edge = false;
            let y_lo = y.saturating_sub(2);
            let y_hi = (y + 2).min(h - 1);
            let x_lo = x.saturating_sub(2);
            let x_hi = (x + 2).min(w - 1);
            'search: for ny in y_lo..=y_hi {
                for nx in x_lo..=x_hi {
                    if gb.get(nx, ny) > threshold {
                        near_edge = true;
                        break 'search;
                    }
                }
            }

            if near_edge {
                out.put(x, y, excess);
            }
        }

        Ok(out)
    }
}
