use anyhow::Result;
use deblurq::{prelude::*, reference::ReferenceBackend, score};

#[macro_use]
mod common;

// Reference backend with the robust norm poisoned to NaN, for exercising the
// finite-value check on feature outputs.
struct NanNormBackend {
    inner: ReferenceBackend,
}

impl Primitives for NanNormBackend {
    fn gradient(&self, buffer: &ImageBuffer) -> Result<(ImageBuffer, ImageBuffer)> {
        self.inner.gradient(buffer)
    }

    fn mean_norm(&self, _data: &[f32], _p: f32) -> Result<f64> {
        Ok(f64::NAN)
    }

    fn robust_spread(&self, data: &[f32], p: f32) -> Result<f64> {
        self.inner.robust_spread(data, p)
    }

    fn anisotropy_quality(&self, gray: &ImageBuffer, patch_size: usize) -> Result<f64> {
        self.inner.anisotropy_quality(gray, patch_size)
    }

    fn cross_correlate(
        &self,
        a: &ImageBuffer,
        b: &ImageBuffer,
        margin: usize,
    ) -> Result<ImageBuffer> {
        self.inner.cross_correlate(a, b, margin)
    }

    fn blur_probability(&self, gray: &[u8], width: usize, height: usize) -> Result<f64> {
        self.inner.blur_probability(gray, width, height)
    }

    fn align(&self, a: &RgbImage, b: &RgbImage, normalize: bool) -> Result<(RgbImage, RgbImage)> {
        self.inner.align(a, b, normalize)
    }

    fn ring_difference(&self, a: &RgbImage, b: &RgbImage) -> Result<ImageBuffer> {
        self.inner.ring_difference(a, b)
    }
}

#[test]
fn test_score_is_deterministic() {
    let ctx = ExecutionContext::default();
    let deblurred = common::textured_image(64, 64);
    let blurred = common::textured_image(64, 64);

    let first = compute_score(&ctx, &deblurred, &blurred).unwrap();
    let second = compute_score(&ctx, &deblurred, &blurred).unwrap();
    assert_eq!(first, second);
    assert!(first.is_finite());
}

#[test]
fn test_score_of_flat_gray_pair() {
    // Every gradient-driven feature is exactly zero on a solid midtone;
    // with the reference backend the remaining features are zero too.
    let ctx = ExecutionContext::default();
    let image = common::solid_image(64, 64, 0.5);

    let features = score::compute_features(&ctx, &image, &image).unwrap();
    assert_delta!(features.sparsity, 0.0, common::DEFAULT_DELTA);
    assert_delta!(features.smallgrad, 0.0, common::DEFAULT_DELTA);
    assert_delta!(features.norm_sps, 0.0, common::DEFAULT_DELTA);
    assert_delta!(features.pyr_ring, 0.0, common::DEFAULT_DELTA);
    assert_delta!(features.saturation, 0.0, common::DEFAULT_DELTA);

    let result = compute_score(&ctx, &image, &image).unwrap();
    assert!(result.is_finite());
}

#[test]
fn test_black_image_saturation_term() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(64, 64, 0.0);

    let features = score::compute_features(&ctx, &image, &image).unwrap();
    assert_delta!(features.saturation, 1.0, common::DEFAULT_DELTA);

    // With every other feature at zero, the whole score is the saturation
    // term: 1.0 * -6.62421
    let result = compute_score(&ctx, &image, &image).unwrap();
    assert_delta!(result, -6.62421, common::DEFAULT_DELTA);
}

#[test]
fn test_score_rejects_mismatched_dimensions() {
    let ctx = ExecutionContext::default();
    let deblurred = common::textured_image(64, 64);
    let blurred = common::textured_image(32, 64);
    assert!(compute_score(&ctx, &deblurred, &blurred).is_err());
}

#[test]
fn test_score_accepts_any_tagged_convention() {
    // Inputs are normalized to the internal convention before extraction,
    // so a BGR 8-bit pair scores identically to its RGB unit-range twin.
    let ctx = ExecutionContext::default();
    let rgb = common::textured_image(64, 64);
    let bgr = rgb.convert_to(ColorOrder::Bgr, ValueRange::EightBit).unwrap();

    let score_rgb = compute_score(&ctx, &rgb, &rgb).unwrap();
    let score_bgr = compute_score(&ctx, &bgr, &bgr).unwrap();
    assert_delta!(score_rgb, score_bgr, 0.05);
}

#[test]
fn test_feature_set_order_matches_weights() {
    let feature_set = score::FeatureSet {
        sparsity: 0.0,
        smallgrad: 0.0,
        metric_q: 0.0,
        auto_corr: 0.0,
        norm_sps: 0.0,
        cpbd: 0.0,
        pyr_ring: 0.0,
        saturation: 0.0,
    };
    for ((name, _), (weight_name, _)) in feature_set.values().iter().zip(score::WEIGHTS.iter()) {
        assert_eq!(name, weight_name);
    }
}

#[test]
fn test_weights_are_all_negative() {
    for (_, weight) in score::WEIGHTS.iter() {
        assert!(*weight < 0.0);
    }
}

#[test]
fn test_non_finite_feature_is_reported_with_its_name() {
    let ctx = ExecutionContext::new(Box::new(NanNormBackend {
        inner: ReferenceBackend::default(),
    }));
    let image = common::solid_image(32, 32, 0.5);

    // sparsity consumes the poisoned robust norm first; its NaN must surface
    // as an error naming the feature, never as a partial score
    let err = score::compute_features(&ctx, &image, &image).unwrap_err();
    assert!(err.to_string().contains("sparsity"));
    assert!(err.to_string().contains("non-finite"));

    assert!(compute_score(&ctx, &image, &image).is_err());
}

#[test]
fn test_feature_set_serializes() {
    let ctx = ExecutionContext::default();
    let image = common::solid_image(64, 64, 0.5);
    let features = score::compute_features(&ctx, &image, &image).unwrap();
    let json = serde_json::to_string(&features).unwrap();
    assert!(json.contains("\"sparsity\""));
    assert!(json.contains("\"pyr_ring\""));
}
