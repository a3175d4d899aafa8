use crate::{
    enums::{ColorOrder, ValueRange},
    imagebuffer::ImageBuffer,
};

use anyhow::{anyhow, Result};

/// A three-band planar raster tagged with its channel order and value range.
///
/// The planar band vector doubles as the channel-first "tensor" form used by
/// the gradient features (batch dimension is always 1 and left implicit).
/// Every conversion goes through [`RgbImage::convert_to`] so the tags can
/// never silently disagree with the data.
#[derive(Debug, Clone)]
pub struct RgbImage {
    bands: Vec<ImageBuffer>,
    pub width: usize,
    pub height: usize,
    order: ColorOrder,
    range: ValueRange,
}

// Grayscale projection weights for R, G, B.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

impl RgbImage {
    pub fn from_bands(
        bands: Vec<ImageBuffer>,
        order: ColorOrder,
        range: ValueRange,
    ) -> Result<RgbImage> {
        if bands.len() != 3 {
            return Err(anyhow!("Expected 3 bands, got {}", bands.len()));
        }
        let width = bands[0].width;
        let height = bands[0].height;
        for band in &bands {
            if band.width != width || band.height != height {
                return Err(anyhow!(
                    "Band size mismatch: {}x{} vs {}x{}",
                    band.width,
                    band.height,
                    width,
                    height
                ));
            }
        }
        Ok(RgbImage {
            bands,
            width,
            height,
            order,
            range,
        })
    }

    /// Builds a planar image from a packed height-width-channel buffer.
    pub fn from_packed(
        data: &[f32],
        width: usize,
        height: usize,
        order: ColorOrder,
        range: ValueRange,
    ) -> Result<RgbImage> {
        if data.len() != width * height * 3 {
            return Err(anyhow!(
                "Packed buffer length {} does not match {}x{}x3",
                data.len(),
                width,
                height
            ));
        }
        let mut bands: Vec<ImageBuffer> = Vec::with_capacity(3);
        for b in 0..3 {
            let mut v = vec![0.0_f32; width * height];
            for (i, value) in v.iter_mut().enumerate() {
                *value = data[i * 3 + b];
            }
            bands.push(ImageBuffer::from_vec(v, width, height)?);
        }
        RgbImage::from_bands(bands, order, range)
    }

    /// Exact inverse of [`RgbImage::from_packed`]: same tags, packed layout.
    pub fn to_packed(&self) -> Vec<f32> {
        let mut data = vec![0.0_f32; self.width * self.height * 3];
        for (b, band) in self.bands.iter().enumerate() {
            for (i, value) in band.buffer.iter().enumerate() {
                data[i * 3 + b] = *value;
            }
        }
        data
    }

    pub fn open(file_path: &str) -> Result<RgbImage> {
        let image_data = image::open(file_path)
            .map_err(|e| anyhow!("Failed to open {}: {}", file_path, e))?
            .into_rgb8();
        let (width, height) = image_data.dimensions();
        let width = width as usize;
        let height = height as usize;

        let mut bands: Vec<ImageBuffer> = Vec::with_capacity(3);
        for b in 0..3 {
            let mut v = vec![0.0_f32; width * height];
            for y in 0..height {
                for x in 0..width {
                    v[y * width + x] = image_data.get_pixel(x as u32, y as u32)[b] as f32 / 255.0;
                }
            }
            bands.push(ImageBuffer::from_vec(v, width, height)?);
        }
        RgbImage::from_bands(bands, ColorOrder::Rgb, ValueRange::Unit)
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn get_band(&self, band: usize) -> &ImageBuffer {
        &self.bands[band]
    }

    pub fn order(&self) -> ColorOrder {
        self.order
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }

    /// Fail-fast tag check. Feature code calls this on entry so a buffer with
    /// the wrong convention is rejected before any arithmetic happens.
    pub fn require(&self, order: ColorOrder, range: ValueRange) -> Result<()> {
        if self.order != order {
            return Err(anyhow!(
                "Color order mismatch: expected {:?}, got {:?}",
                order,
                self.order
            ));
        }
        if self.range != range {
            return Err(anyhow!(
                "Value range mismatch: expected {:?}, got {:?}",
                range,
                self.range
            ));
        }
        Ok(())
    }

    /// Converts to the requested order and range, reordering bands and
    /// rescaling samples as needed. A no-op conversion returns a plain clone.
    pub fn convert_to(&self, order: ColorOrder, range: ValueRange) -> Result<RgbImage> {
        let mut bands: Vec<ImageBuffer> = if self.order == order {
            self.bands.clone()
        } else {
            // Rgb <-> Bgr either way is a band reversal
            vec![
                self.bands[2].clone(),
                self.bands[1].clone(),
                self.bands[0].clone(),
            ]
        };

        if self.range != range {
            let scalar = ValueRange::maxvalue(range) / ValueRange::maxvalue(self.range);
            for band in bands.iter_mut() {
                *band = band.scale(scalar)?;
            }
        }

        RgbImage::from_bands(bands, order, range)
    }

    /// The tensor form consumed by the gradient-based features: planar,
    /// channel-first, RGB order, samples in [0,1].
    pub fn to_planar_rgb_unit(&self) -> Result<RgbImage> {
        self.convert_to(ColorOrder::Rgb, ValueRange::Unit)
    }

    /// Luminance projection (0.299 R + 0.587 G + 0.114 B). The stored order
    /// tag decides which band is which, so BGR input projects correctly.
    pub fn grayscale(&self) -> Result<ImageBuffer> {
        let (r, g, b) = match self.order {
            ColorOrder::Rgb => (&self.bands[0], &self.bands[1], &self.bands[2]),
            ColorOrder::Bgr => (&self.bands[2], &self.bands[1], &self.bands[0]),
        };
        let v = r
            .buffer
            .iter()
            .zip(g.buffer.iter())
            .zip(b.buffer.iter())
            .map(|((rv, gv), bv)| rv * LUMA_R + gv * LUMA_G + bv * LUMA_B)
            .collect();
        ImageBuffer::from_vec(v, self.width, self.height)
    }
}
