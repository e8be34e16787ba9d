use std::sync::Arc;

use super::{ExtractionError, Extractor};
use crate::formats::{DocumentFormat, ImageContainer};

/// Recognizes text in an encoded image (PNG, JPEG, ...).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// Image extractor: prepares the bytes according to the container and hands
/// them to the OCR engine.
pub struct ImageExtractor {
    engine: Option<Arc<dyn OcrEngine>>,
}

impl ImageExtractor {
    pub fn new(engine: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { engine }
    }
}

impl Extractor for ImageExtractor {
    fn extract(&self, content: &[u8], format: DocumentFormat) -> Result<String, ExtractionError> {
        let engine = self.engine.as_ref().ok_or(ExtractionError::OcrUnavailable)?;

        match format.image_container().unwrap_or(ImageContainer::Direct) {
            ImageContainer::Direct => engine.recognize(content),
            ImageContainer::Heif => {
                let png = heif_to_png(content)?;
                engine.recognize(&png)
            }
        }
    }
}

/// Decodes the primary HEIF image and re-encodes it as PNG, in memory.
#[cfg(feature = "heic")]
fn heif_to_png(content: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let heif_err = |e: libheif_rs::HeifError| ExtractionError::Image(e.to_string());

    let lib = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(content).map_err(heif_err)?;
    let handle = ctx.primary_image_handle().map_err(heif_err)?;
    let decoded = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_err)?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ExtractionError::Image("HEIF image has no interleaved plane".to_string()))?;

    let row_len = plane.width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
    for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
        pixels.extend_from_slice(&row[..row_len]);
    }

    let rgb = image::RgbImage::from_raw(plane.width, plane.height, pixels)
        .ok_or_else(|| ExtractionError::Image("HEIF pixel buffer has the wrong size".to_string()))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(rgb)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ExtractionError::Image(e.to_string()))?;
    Ok(png)
}

#[cfg(not(feature = "heic"))]
fn heif_to_png(_content: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    Err(ExtractionError::Image(
        "HEIC decoding is not enabled in this build".to_string(),
    ))
}

/// Tesseract engine. A fresh handle is created per call since the
/// underlying API is not thread safe.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    tessdata_dir: std::path::PathBuf,
    language: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    pub fn new(tessdata_dir: &std::path::Path, language: &str) -> Result<Self, ExtractionError> {
        let primary = language.split('+').next().unwrap_or("eng");
        let traineddata = tessdata_dir.join(format!("{}.traineddata", primary));
        if !traineddata.exists() {
            return Err(ExtractionError::Image(format!(
                "missing {}",
                traineddata.display()
            )));
        }
        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            language: language.to_string(),
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String, ExtractionError> {
        let tessdata = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::Image("invalid tessdata path".to_string()))?;

        let mut tess = tesseract::Tesseract::new(Some(tessdata), Some(&self.language))
            .map_err(|e| ExtractionError::Image(format!("{:?}", e)))?
            .set_image_from_mem(image)
            .map_err(|e| ExtractionError::Image(format!("{:?}", e)))?;

        tess.get_text()
            .map_err(|e| ExtractionError::Image(format!("{:?}", e)))
    }
}
