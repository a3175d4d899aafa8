use crate::{imagebuffer::ImageBuffer, rgbimage::RgbImage};

use anyhow::Result;

/// Numeric primitives consumed by the feature extractors.
///
/// Each method mirrors one external collaborator contract: the features only
/// see these signatures, so a backend can swap in accelerated or alternate
/// implementations without touching the feature code.
pub trait Primitives {
    /// Finite-difference gradients along width (dx) and height (dy),
    /// same shape as the input.
    fn gradient(&self, buffer: &ImageBuffer) -> Result<(ImageBuffer, ImageBuffer)>;

    /// Parametrized robust norm of a magnitude distribution (exponent p).
    fn mean_norm(&self, data: &[f32], p: f32) -> Result<f64>;

    /// Parametrized robust spread statistic over a sample.
    fn robust_spread(&self, data: &[f32], p: f32) -> Result<f64>;

    /// Patch-based anisotropy sharpness quality of a grayscale image
    /// in [0,255].
    fn anisotropy_quality(&self, gray: &ImageBuffer, patch_size: usize) -> Result<f64>;

    /// Normalized cross-correlation map over offsets in [-margin, margin]
    /// on both axes. The returned map is square with odd side 2*margin+1.
    fn cross_correlate(
        &self,
        a: &ImageBuffer,
        b: &ImageBuffer,
        margin: usize,
    ) -> Result<ImageBuffer>;

    /// Cumulative probability of blur detection on an 8-bit grayscale
    /// image. Expected range [0,1].
    fn blur_probability(&self, gray: &[u8], width: usize, height: usize) -> Result<f64>;

    /// Geometric (and, when `normalize`, photometric) alignment of `a`
    /// against `b`. Returns the aligned pair.
    fn align(&self, a: &RgbImage, b: &RgbImage, normalize: bool) -> Result<(RgbImage, RgbImage)>;

    /// Per-pixel ring/edge-halo difference between two images at one
    /// pyramid scale.
    fn ring_difference(&self, a: &RgbImage, b: &RgbImage) -> Result<ImageBuffer>;
}

/// Explicit execution context passed into `compute_score`.
///
/// Holds the primitive backend so backend selection is a call-site decision
/// rather than process-wide mutable state.
pub struct ExecutionContext {
    backend: Box<dyn Primitives + Send + Sync>,
}

impl ExecutionContext {
    pub fn new(backend: Box<dyn Primitives + Send + Sync>) -> ExecutionContext {
        ExecutionContext { backend }
    }

    pub fn backend(&self) -> &(dyn Primitives + Send + Sync) {
        self.backend.as_ref()
    }
}

impl Default for ExecutionContext {
    fn default() -> ExecutionContext {
        ExecutionContext::new(Box::new(crate::reference::ReferenceBackend::default()))
    }
}
