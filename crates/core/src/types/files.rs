//! Upload validation and file-size formatting.
//!
//! Uploads are checked here before anything is sent to object storage or
//! written to the database.

/// Largest accepted catalog PDF (10 MiB).
pub const MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;

/// Largest accepted image (2 MiB).
pub const MAX_IMAGE_BYTES: u64 = 2 * 1024 * 1024;

/// MIME types accepted for product, category, site and thumbnail images.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Reasons an upload is rejected.
///
/// The `Display` text is shown to the admin as-is.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadError {
    #[error("El archivo debe ser un PDF")]
    NotPdf,
    #[error("El archivo no debe exceder 10MB")]
    PdfTooLarge,
    #[error("La imagen debe ser JPG, PNG o WebP")]
    UnsupportedImage,
    #[error("La imagen no debe exceder 2MB")]
    ImageTooLarge,
    #[error("El archivo está vacío")]
    Empty,
}

/// Check a catalog PDF before upload.
///
/// # Errors
///
/// Returns [`UploadError::NotPdf`] for any other content type and
/// [`UploadError::PdfTooLarge`] above [`MAX_PDF_BYTES`].
pub fn validate_pdf(content_type: &str, size: u64) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if !content_type.eq_ignore_ascii_case("application/pdf") {
        return Err(UploadError::NotPdf);
    }
    if size > MAX_PDF_BYTES {
        return Err(UploadError::PdfTooLarge);
    }
    Ok(())
}

/// Check an image before upload.
///
/// # Errors
///
/// Returns [`UploadError::UnsupportedImage`] for content types outside
/// [`IMAGE_CONTENT_TYPES`] and [`UploadError::ImageTooLarge`] above
/// [`MAX_IMAGE_BYTES`].
pub fn validate_image(content_type: &str, size: u64) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::Empty);
    }
    if !IMAGE_CONTENT_TYPES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(content_type))
    {
        return Err(UploadError::UnsupportedImage);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(UploadError::ImageTooLarge);
    }
    Ok(())
}

/// File extension to use when storing an upload of the given content type.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_ascii_lowercase().as_str() {
        "application/pdf" => "pdf",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Human-readable file size: `0 Bytes`, `1 KB`, `1.5 KB`, `10 MB`.
///
/// Uses 1024-byte units and at most two decimals, without trailing zeros.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit < UNITS.len() - 1 && bytes >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = ((bytes as f64 / divisor as f64) * 100.0).round() / 100.0;
    let label = UNITS.get(unit).copied().unwrap_or("GB");

    format!("{value} {label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size_reference_values() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
    }

    #[test]
    fn test_format_file_size_other_units() {
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
        assert_eq!(format_file_size(1100), "1.07 KB");
    }

    #[test]
    fn test_format_file_size_caps_at_gigabytes() {
        assert_eq!(format_file_size(2048 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_validate_pdf() {
        assert_eq!(validate_pdf("application/pdf", 1024), Ok(()));
        assert_eq!(validate_pdf("application/pdf", MAX_PDF_BYTES), Ok(()));
        assert_eq!(validate_pdf("image/png", 1024), Err(UploadError::NotPdf));
        assert_eq!(
            validate_pdf("application/pdf", MAX_PDF_BYTES + 1),
            Err(UploadError::PdfTooLarge)
        );
        assert_eq!(validate_pdf("application/pdf", 0), Err(UploadError::Empty));
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image("image/jpeg", 2048), Ok(()));
        assert_eq!(validate_image("image/webp", MAX_IMAGE_BYTES), Ok(()));
        assert_eq!(
            validate_image("image/gif", 2048),
            Err(UploadError::UnsupportedImage)
        );
        assert_eq!(
            validate_image("image/png", MAX_IMAGE_BYTES + 1),
            Err(UploadError::ImageTooLarge)
        );
    }

    #[test]
    fn test_upload_error_messages() {
        assert_eq!(UploadError::ImageTooLarge.to_string(), "La imagen no debe exceder 2MB");
        assert_eq!(UploadError::NotPdf.to_string(), "El archivo debe ser un PDF");
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("application/pdf"), "pdf");
        assert_eq!(extension_for("IMAGE/PNG"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
    }
}
