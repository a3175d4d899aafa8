use deblurq::{features, prelude::*};

#[macro_use]
mod common;

#[test]
fn test_sparsity_of_flat_image_is_zero() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(32, 32, 0.5);
    let result = features::sparsity(&ctx, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_smallgrad_of_flat_image_is_zero() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(32, 32, 0.5);
    let result = features::smallgrad(&ctx, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_norm_sparsity_of_flat_image_is_zero() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(32, 32, 0.5);
    let result = features::norm_sparsity(&ctx, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_features_reject_untagged_conventions() {
    let ctx = ExecutionContext::default();
    let image = common::textured_image(32, 32)
        .convert_to(ColorOrder::Bgr, ValueRange::Unit)
        .unwrap();
    assert!(features::sparsity(&ctx, &image).is_err());
    assert!(features::saturation(&image).is_err());
}

#[test]
fn test_saturation_of_midtone_image_is_zero() {
    let image = common::solid_image(64, 64, 0.5);
    let result = features::saturation(&image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_saturation_of_black_image_is_one() {
    let image = common::solid_image(64, 64, 0.0);
    let result = features::saturation(&image).unwrap();
    assert_delta!(result, 1.0, common::DEFAULT_DELTA);
}

#[test]
fn test_saturation_of_white_image_is_one() {
    let image = common::solid_image(64, 64, 1.0);
    let result = features::saturation(&image).unwrap();
    assert_delta!(result, 1.0, common::DEFAULT_DELTA);
}

#[test]
fn test_saturation_half_black_half_white() {
    let mut bands: Vec<ImageBuffer> = Vec::with_capacity(3);
    for _ in 0..3 {
        let mut band = ImageBuffer::new(16, 16).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                band.put(x, y, if y < 8 { 0.0 } else { 1.0 });
            }
        }
        bands.push(band);
    }
    let image = RgbImage::from_bands(bands, ColorOrder::Rgb, ValueRange::Unit).unwrap();
    let result = features::saturation(&image).unwrap();
    assert_delta!(result, 1.0, common::DEFAULT_DELTA);
}

#[test]
fn test_saturation_within_bounds() {
    let image = common::textured_image(48, 48);
    let result = features::saturation(&image).unwrap();
    assert!((0.0..=2.0).contains(&result));
}

#[test]
fn test_auto_corr_center_peak_is_suppressed() {
    let ctx = ExecutionContext::default();
    let image = common::textured_image(64, 64);

    // The raw self-correlation map peaks at exactly 1 in the center...
    let gray = image.grayscale().unwrap();
    let map = ctx.backend().cross_correlate(&gray, &gray, 50).unwrap();
    assert_eq!(map.width, 101);
    assert_eq!(map.height, 101);
    assert_delta!(map.get(50, 50) as f64, 1.0, common::DEFAULT_DELTA);

    // ...but the feature forces the r=0 annulus to zero, so the sum stays
    // strictly below the annulus count even for a perfectly periodic input.
    let result = features::auto_corr(&ctx, &image).unwrap();
    assert!(result >= 0.0);
    assert!(result <= 50.0 + common::DEFAULT_DELTA);
}

#[test]
fn test_auto_corr_of_flat_image_is_zero() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(64, 64, 0.5);
    let result = features::auto_corr(&ctx, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_metric_q_of_flat_image_is_zero() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(32, 32, 0.5);
    let result = features::metric_q(&ctx, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_cpbd_of_flat_image_is_zero() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(32, 32, 0.5);
    let result = features::cpbd(&ctx, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}

#[test]
fn test_cpbd_is_nonpositive() {
    // blur_probability lands in [0,1]; the feature is its negation
    let ctx = ExecutionContext::default();
    let image = common::textured_image(64, 64);
    let result = features::cpbd(&ctx, &image).unwrap();
    assert!((-1.0..=0.0).contains(&result));
}

#[test]
fn test_pyr_ring_of_identical_pair_is_near_zero() {
    let ctx = ExecutionContext::default();
    let image = common::textured_image(64, 64);
    let result = features::pyr_ring(&ctx, &image, &image).unwrap();
    assert_delta!(result, 0.0, 0.01);
}

#[test]
fn test_pyr_ring_of_small_image_is_zero() {
    // Below the 16 px pyramid floor no scale qualifies at all
    let ctx = ExecutionContext::default();
    let image = common::textured_image(12, 12);
    let result = features::pyr_ring(&ctx, &image, &image).unwrap();
    assert_delta!(result, 0.0, common::DEFAULT_DELTA);
}
