//! Image uploads: reading multipart forms, checking that an upload really is a
//! JPEG or PNG, and pushing it to the image host.

pub mod form;
pub mod uploader;

use std::io::Cursor;

use image::ImageFormat;
use serde::Serialize;

use crate::error::AppError;

pub use form::MultipartForm;
pub use uploader::{CloudinaryUploader, ImageUploader};

/// How many leading bytes are inspected when sniffing the format.
const SIGNATURE_WINDOW: usize = 512;
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8];
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A file part of a multipart request, fully buffered. Serializes without its
/// contents, which keeps them out of validation error params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: Option<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename,
            content_type,
            bytes,
        }
    }
}

/// Image formats accepted for avatars, banners and post media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    fn format(self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }
}

/// Detects the format from the file signature. The declared content type and
/// file extension are ignored.
pub fn sniff(bytes: &[u8]) -> Option<ImageKind> {
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    if window.starts_with(JPEG_SIGNATURE) {
        Some(ImageKind::Jpeg)
    } else if window.starts_with(PNG_SIGNATURE) {
        Some(ImageKind::Png)
    } else {
        None
    }
}

/// Confirms that `bytes` is a well-formed JPEG or PNG: the signature must
/// match and the image header must decode to non-zero dimensions.
pub fn validate_image(bytes: &[u8]) -> Result<ImageKind, String> {
    let kind = sniff(bytes).ok_or_else(|| "unsupported image format".to_string())?;

    let (width, height) = image::io::Reader::with_format(Cursor::new(bytes), kind.format())
        .into_dimensions()
        .map_err(|e| format!("image header decoding failed: {}", e))?;
    if width == 0 || height == 0 {
        return Err("image has no pixels".to_string());
    }

    Ok(kind)
}

/// Validates an upload and turns any failure into the client error `message`.
pub fn ensure_image(file: &UploadedFile, message: &str) -> Result<ImageKind, AppError> {
    validate_image(&file.bytes).map_err(|reason| {
        log::debug!(
            "rejected upload {:?}: {}",
            file.filename.as_deref().unwrap_or("<unnamed>"),
            reason
        );
        AppError::BadRequest(message.to_string())
    })
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    pub fn encode(format: ImageOutputFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, image::Rgb([200, 30, 30])));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    pub fn png() -> Vec<u8> {
        encode(ImageOutputFormat::Png)
    }

    pub fn jpeg() -> Vec<u8> {
        encode(ImageOutputFormat::Jpeg(80))
    }
}
