use anyhow::{anyhow, Result};

// A simple single-band image raster buffer.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    pub buffer: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl ImageBuffer {
    // Creates a new image buffer of the requested width and height
    pub fn new(width: usize, height: usize) -> Result<ImageBuffer> {
        ImageBuffer::new_with_fill(width, height, 0.0)
    }

    pub fn new_with_fill(width: usize, height: usize, fill_value: f32) -> Result<ImageBuffer> {
        if width == 0 || height == 0 {
            return Err(anyhow!("Cannot create zero-sized buffer: {}x{}", width, height));
        }
        Ok(ImageBuffer {
            buffer: vec![fill_value; width * height],
            width,
            height,
        })
    }

    // Creates a new image buffer at the requested width, height and data
    pub fn from_vec(v: Vec<f32>, width: usize, height: usize) -> Result<ImageBuffer> {
        if v.len() != width * height {
            return Err(anyhow!(
                "Dimensions do not match vector length: {}x{} vs {}",
                width,
                height,
                v.len()
            ));
        }
        Ok(ImageBuffer {
            buffer: v,
            width,
            height,
        })
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.buffer[y * self.width + x]
    }

    pub fn put(&mut self, x: usize, y: usize, val: f32) {
        self.buffer[y * self.width + x] = val;
    }

    // Bilinear sample. Coordinates past the last row/column clamp to the edge.
    pub fn get_interpolated(&self, x: f32, y: f32) -> f32 {
        let xf = x.floor();
        let yf = y.floor();
        let xd = x - xf;
        let yd = y - yf;

        let x0 = (xf as usize).min(self.width - 1);
        let y0 = (yf as usize).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let v00 = self.get(x0, y0);
        let v01 = self.get(x1, y0);
        let v10 = self.get(x0, y1);
        let v11 = self.get(x1, y1);

        let v0 = v01 * xd + v00 * (1.0 - xd);
        let v1 = v11 * xd + v10 * (1.0 - xd);
        v1 * yd + v0 * (1.0 - yd)
    }

    // Round and clamp to 8-bit samples.
    pub fn to_vector_u8(&self) -> Vec<u8> {
        self.buffer
            .iter()
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
            .collect()
    }

    pub fn subtract(&self, other: &ImageBuffer) -> Result<ImageBuffer> {
        if self.width != other.width || self.height != other.height {
            return Err(anyhow!(
                "Buffer size mismatch: {}x{} vs {}x{}",
                self.width,
                self.height,
                other.width,
                other.height
            ));
        }
        let v = self
            .buffer
            .iter()
            .zip(other.buffer.iter())
            .map(|(a, b)| a - b)
            .collect();
        ImageBuffer::from_vec(v, self.width, self.height)
    }

    pub fn scale(&self, scalar: f32) -> Result<ImageBuffer> {
        let v = self.buffer.iter().map(|a| a * scalar).collect();
        ImageBuffer::from_vec(v, self.width, self.height)
    }

    pub fn clip(&self, clip_min: f32, clip_max: f32) -> Result<ImageBuffer> {
        let v = self
            .buffer
            .iter()
            .map(|a| a.clamp(clip_min, clip_max))
            .collect();
        ImageBuffer::from_vec(v, self.width, self.height)
    }

    // Translate by whole pixels; vacated cells are zero-filled.
    pub fn shift(&self, horiz: i32, vert: i32) -> Result<ImageBuffer> {
        let mut shifted = ImageBuffer::new(self.width, self.height)?;

        let w = self.width as i32;
        let h = self.height as i32;

        for y in 0..h {
            for x in 0..w {
                let shift_x = x + horiz;
                let shift_y = y + vert;
                if shift_x >= 0 && shift_y >= 0 && shift_x < w && shift_y < h {
                    shifted.put(shift_x as usize, shift_y as usize, self.get(x as usize, y as usize));
                }
            }
        }
        Ok(shifted)
    }

    // Mean of all pixel values
    pub fn mean(&self) -> f32 {
        crate::stats::mean(&self.buffer)
    }
}
