pub mod enums;
pub mod features;
pub mod imagebuffer;
pub mod primitives;
pub mod reference;
pub mod resize;
pub mod rgbimage;
pub mod score;
pub mod stats;

pub mod prelude;
