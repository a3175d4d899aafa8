use deblurq::prelude::*;

// https://stackoverflow.com/questions/30856285/assert-eq-with-floating-point-numbers-and-delta
#[macro_export]
macro_rules! assert_delta {
    ($x:expr, $y:expr, $d:expr) => {
        if ($x - $y).abs() > $d {
            panic!("{} != {} within {}", $x, $y, $d);
        }
    };
}

#[allow(dead_code)]
pub const DEFAULT_DELTA: f64 = 0.0001;

// A solid-color image with the same value in every band.
#[allow(dead_code)]
pub fn solid_image(width: usize, height: usize, value: f32) -> RgbImage {
    let bands = vec![
        ImageBuffer::new_with_fill(width, height, value).unwrap(),
        ImageBuffer::new_with_fill(width, height, value).unwrap(),
        ImageBuffer::new_with_fill(width, height, value).unwrap(),
    ];
    RgbImage::from_bands(bands, ColorOrder::Rgb, ValueRange::Unit).unwrap()
}

// A deterministic textured image with edges in every band.
#[allow(dead_code)]
pub fn textured_image(width: usize, height: usize) -> RgbImage {
    let mut bands: Vec<ImageBuffer> = Vec::with_capacity(3);
    for b in 0..3_usize {
        let mut v = vec![0.0_f32; width * height];
        for y in 0..height {
            for x in 0..width {
                let value = ((x * 31 + y * 17 + b * 7) % 97) as f32 / 96.0;
                v[y * width + x] = value;
            }
        }
        bands.push(ImageBuffer::from_vec(v, width, height).unwrap());
    }
    RgbImage::from_bands(bands, ColorOrder::Rgb, ValueRange::Unit).unwrap()
}

// A deterministic packed height-width-channel buffer in [0,1].
#[allow(dead_code)]
pub fn packed_data(width: usize, height: usize) -> Vec<f32> {
    (0..width * height * 3)
        .map(|i| ((i * 13 + 5) % 101) as f32 / 100.0)
        .collect()
}
