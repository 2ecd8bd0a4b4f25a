//! Image cleanup ahead of recognition.

use crate::error::{Error, Result};
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;

/// Undecoded bytes of one page image.
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    data: &'a [u8],
}

impl<'a> RawImage<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }
}

/// A binarized grayscale page, ready for an [`super::OcrEngine`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    image: GrayImage,
    threshold: u8,
}

impl Preprocessed {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The binarized image; every pixel is 0 or 255.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Otsu level used for binarization.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

/// Decode, grayscale, denoise with a 3x3 median, then binarize at the Otsu
/// level. The same input always yields the same output.
pub fn preprocess(raw: &RawImage<'_>) -> Result<Preprocessed> {
    let decoded = image::load_from_memory(raw.bytes()).map_err(|e| Error::corrupt("image", e))?;
    let gray = decoded.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Err(Error::corrupt("image", "image has no pixels"));
    }

    let denoised = median_filter(&gray, 1, 1);
    let threshold = otsu_level(&denoised);
    let image = GrayImage::from_fn(denoised.width(), denoised.height(), |x, y| {
        if denoised.get_pixel(x, y)[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    log::debug!(
        "preprocessed {}x{} page, otsu level {}",
        image.width(),
        image.height(),
        threshold
    );

    Ok(Preprocessed { image, threshold })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(image: &GrayImage) -> Vec<u8> {
        let mut out = Vec::new();
        image.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn test_binarizes_two_tone_image() {
        let source = GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([30]) } else { Luma([220]) });
        let bytes = png(&source);
        let page = preprocess(&RawImage::new(&bytes)).unwrap();
        assert_eq!((page.width(), page.height()), (20, 10));
        assert!(page.image().pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(page.image().get_pixel(2, 5)[0], 0);
        assert_eq!(page.image().get_pixel(17, 5)[0], 255);
    }

    #[test]
    fn test_median_removes_speckle() {
        let mut source = GrayImage::from_pixel(9, 9, Luma([240]));
        source.put_pixel(4, 4, Luma([0]));
        for x in 0..9 {
            source.put_pixel(x, 8, Luma([10]));
        }
        let bytes = png(&source);
        let page = preprocess(&RawImage::new(&bytes)).unwrap();
        assert_eq!(page.image().get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn test_deterministic() {
        let source = GrayImage::from_fn(16, 16, |x, y| Luma([((x * 13 + y * 7) % 256) as u8]));
        let bytes = png(&source);
        let a = preprocess(&RawImage::new(&bytes)).unwrap();
        let b = preprocess(&RawImage::new(&bytes)).unwrap();
        assert_eq!(a.image(), b.image());
        assert_eq!(a.threshold(), b.threshold());
    }

    #[test]
    fn test_undecodable_bytes() {
        let err = preprocess(&RawImage::new(b"not an image")).unwrap_err();
        assert!(matches!(err, Error::CorruptInput { .. }));
    }
}
