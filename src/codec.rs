//! Decoding scans and encoding cards.

use crate::error::{Result, SegmentError};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Output encoding for finished cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFormat {
    Jpeg { quality: u8 },
    Png,
}

impl Default for CardFormat {
    fn default() -> Self {
        Self::Jpeg { quality: 90 }
    }
}

impl CardFormat {
    /// Parse a format name; JPEG uses `quality`
    pub fn from_name(name: &str, quality: u8) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg { quality }),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

/// Decode an encoded scan of any supported format into RGB8
pub fn decode_scan(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes).map_err(|e| SegmentError::Decode(e.to_string()))?;
    let rgb = image.into_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(SegmentError::InvalidInput(format!(
            "decoded scan has zero area ({}x{})",
            rgb.width(),
            rgb.height()
        )));
    }
    Ok(rgb)
}

/// Read and decode a scan; the path is only used to fetch bytes, the format
/// is sniffed from content
pub fn open_scan(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    decode_scan(&bytes).map_err(|e| match e {
        SegmentError::Decode(msg) => SegmentError::Decode(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

pub fn encode_card(card: &RgbImage, format: CardFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        CardFormat::Jpeg { quality } => {
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                .encode_image(card)
                .map_err(|e| SegmentError::Encode(e.to_string()))?;
        }
        CardFormat::Png => {
            card.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(|e| SegmentError::Encode(e.to_string()))?;
        }
    }
    Ok(buffer)
}

pub fn write_card(path: &Path, card: &RgbImage, format: CardFormat) -> Result<()> {
    let bytes = encode_card(card, format)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_card_decodes_back_exactly() {
        let card = RgbImage::from_fn(8, 5, |x, y| Rgb([x as u8 * 30, y as u8 * 50, 7]));
        let bytes = encode_card(&card, CardFormat::Png).unwrap();
        assert_eq!(decode_scan(&bytes).unwrap(), card);
    }

    #[test]
    fn test_jpeg_card_keeps_dimensions() {
        let card = RgbImage::from_pixel(40, 24, Rgb([200, 100, 50]));
        let bytes = encode_card(&card, CardFormat::default()).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(decode_scan(&bytes).unwrap().dimensions(), (40, 24));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = decode_scan(b"definitely not an image");
        assert!(matches!(result, Err(SegmentError::Decode(_))));
    }

    #[test]
    fn test_format_names() {
        assert_eq!(
            CardFormat::from_name("JPEG", 80),
            Some(CardFormat::Jpeg { quality: 80 })
        );
        assert_eq!(CardFormat::from_name("png", 80), Some(CardFormat::Png));
        assert_eq!(CardFormat::from_name("gif", 80), None);
        assert_eq!(CardFormat::Png.extension(), "png");
    }
}
