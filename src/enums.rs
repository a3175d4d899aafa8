// Channel ordering of a three-band image. Tracked explicitly on every
// buffer so a BGR frame can never reach RGB-only math unnoticed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

// Sample value range. Doesn't enforce actual value data types in the structs
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValueRange {
    Unit,
    EightBit,
}

impl ValueRange {
    pub fn maxvalue(range: ValueRange) -> f32 {
        match range {
            ValueRange::Unit => 1.0,
            ValueRange::EightBit => 255.0,
        }
    }
}
