use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::models::device::VideoFrame;
use crate::models::error::WebcamError;
use crate::traits::surfaces::RasterSurface;

/// In-memory RGB raster backed by the `image` crate.
pub struct ImageCanvas {
    pixels: RgbImage,
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbImage::new(width, height),
        }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

impl Default for ImageCanvas {
    fn default() -> Self {
        Self::new(300, 150)
    }
}

impl RasterSurface for ImageCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbImage::new(width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn draw_frame(&mut self, frame: &VideoFrame, width: u32, height: u32) -> Result<(), WebcamError> {
        if width == 0 || height == 0 || frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }

        let source = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or_else(|| WebcamError::EncodingFailed("frame does not match its dimensions".into()))?;

        if (width, height) == source.dimensions() {
            imageops::replace(&mut self.pixels, &source, 0, 0);
        } else {
            let scaled = imageops::resize(&source, width, height, FilterType::Triangle);
            imageops::replace(&mut self.pixels, &scaled, 0, 0);
        }
        Ok(())
    }

    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, WebcamError> {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(WebcamError::EncodingFailed("cannot encode an empty canvas".into()));
        }

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode_image(&self.pixels)
            .map_err(|e| WebcamError::EncodingFailed(format!("jpeg encode failed: {}", e)))?;
        Ok(out)
    }
}
