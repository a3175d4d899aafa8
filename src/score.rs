use crate::{features, primitives::ExecutionContext, rgbimage::RgbImage};

use anyhow::{anyhow, Result};
use serde::Serialize;

/// The eight feature values for one image pair. Built once per pair and
/// consumed by the weighted combiner; also serializable as a report.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSet {
    pub sparsity: f64,
    pub smallgrad: f64,
    pub metric_q: f64,
    pub auto_corr: f64,
    pub norm_sps: f64,
    pub cpbd: f64,
    pub pyr_ring: f64,
    pub saturation: f64,
}

impl FeatureSet {
    /// Values in the fixed combiner order, paired with their names.
    pub fn values(&self) -> [(&'static str, f64); 8] {
        [
            ("sparsity", self.sparsity),
            ("smallgrad", self.smallgrad),
            ("metric_q", self.metric_q),
            ("auto_corr", self.auto_corr),
            ("norm_sps", self.norm_sps),
            ("cpbd", self.cpbd),
            ("pyr_ring", self.pyr_ring),
            ("saturation", self.saturation),
        ]
    }
}

/// Trained combination weights. Every raw feature is oriented so that larger
/// means worse, hence all-negative weights; higher scores are better.
pub const WEIGHTS: [(&str, f64); 8] = [
    ("sparsity", -8.70515),
    ("smallgrad", -62.23820),
    ("metric_q", -0.04109),
    ("auto_corr", -0.82738),
    ("norm_sps", -13.90913),
    ("cpbd", -2.20373),
    ("pyr_ring", -149.19139),
    ("saturation", -6.62421),
];

fn checked(name: &str, value: Result<f64>) -> Result<f64> {
    let value = value.map_err(|e| anyhow!("Feature '{}' failed: {}", name, e))?;
    if !value.is_finite() {
        return Err(anyhow!("Feature '{}' produced a non-finite value", name));
    }
    Ok(value)
}

fn validate_pair(deblurred: &RgbImage, blurred: &RgbImage) -> Result<()> {
    if deblurred.num_bands() != 3 || blurred.num_bands() != 3 {
        return Err(anyhow!(
            "Expected 3-band images, got {} and {}",
            deblurred.num_bands(),
            blurred.num_bands()
        ));
    }
    if deblurred.width != blurred.width || deblurred.height != blurred.height {
        return Err(anyhow!(
            "Image pair dimensions differ: {}x{} vs {}x{}",
            deblurred.width,
            deblurred.height,
            blurred.width,
            blurred.height
        ));
    }
    Ok(())
}

/// Extracts all eight features for a (deblurred, blurred) pair.
///
/// Inputs may carry any tagged order/range; both are brought to the planar
/// RGB unit-range form here, once, before feature extraction.
pub fn compute_features(
    ctx: &ExecutionContext,
    deblurred: &RgbImage,
    blurred: &RgbImage,
) -> Result<FeatureSet> {
    validate_pair(deblurred, blurred)?;

    let deblurred = deblurred.to_planar_rgb_unit()?;
    let blurred = blurred.to_planar_rgb_unit()?;

    Ok(FeatureSet {
        sparsity: checked("sparsity", features::sparsity(ctx, &deblurred))?,
        smallgrad: checked("smallgrad", features::smallgrad(ctx, &deblurred))?,
        metric_q: checked("metric_q", features::metric_q(ctx, &deblurred))?,
        auto_corr: checked("auto_corr", features::auto_corr(ctx, &deblurred))?,
        norm_sps: checked("norm_sps", features::norm_sparsity(ctx, &deblurred))?,
        cpbd: checked("cpbd", features::cpbd(ctx, &deblurred))?,
        pyr_ring: checked("pyr_ring", features::pyr_ring(ctx, &deblurred, &blurred))?,
        saturation: checked("saturation", features::saturation(&deblurred))?,
    })
}

/// Deblurring quality score for a (deblurred, blurred) pair: the fixed dot
/// product of the feature set with the trained weights. Pure and
/// deterministic; higher is better.
pub fn compute_score(
    ctx: &ExecutionContext,
    deblurred: &RgbImage,
    blurred: &RgbImage,
) -> Result<f64> {
    let feature_set = compute_features(ctx, deblurred, blurred)?;

    let score = feature_set
        .values()
        .iter()
        .zip(WEIGHTS.iter())
        .map(|((_, value), (_, weight))| value * weight)
        .sum();

    Ok(score)
}
