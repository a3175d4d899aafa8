pub use crate::enums::ColorOrder;
pub use crate::enums::ValueRange;
pub use crate::imagebuffer::ImageBuffer;
pub use crate::primitives::ExecutionContext;
pub use crate::primitives::Primitives;
pub use crate::rgbimage::RgbImage;
pub use crate::score::compute_features;
pub use crate::score::compute_score;
pub use crate::score::FeatureSet;
