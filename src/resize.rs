use crate::imagebuffer::ImageBuffer;

use anyhow::Result;

// Bilinear (order-1) resample. The ring pyramid runs on float data, so this
// samples the source directly rather than round-tripping through a 16-bit
// image codec.
pub fn resize_to(
    buffer: &ImageBuffer,
    to_width: usize,
    to_height: usize,
) -> Result<ImageBuffer> {
    let mut resized = ImageBuffer::new(to_width, to_height)?;

    let scale_x = buffer.width as f32 / to_width as f32;
    let scale_y = buffer.height as f32 / to_height as f32;

    for y in 0..to_height {
        for x in 0..to_width {
            // Center-aligned source coordinate
            let src_x = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
            let src_y = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
            resized.put(x, y, buffer.get_interpolated(src_x, src_y));
        }
    }

    Ok(resized)
}
