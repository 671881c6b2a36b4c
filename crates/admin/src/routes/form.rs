//! Multipart form handling for the upload forms.
//!
//! Every admin form that can carry a file is posted as
//! `multipart/form-data`; this collects its text fields and files in one
//! pass so handlers can validate the whole submission before touching
//! storage.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;

use bultex_core::{UploadError, validate_image, validate_pdf};

use crate::services::Upload;

/// A fully read multipart submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Read every part of the body.
    ///
    /// File inputs left empty by the browser (no file name, no bytes) are
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid multipart or exceeds the
    /// request body limit.
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            match field.file_name().map(ToString::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.insert(
                        name,
                        Upload {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Form with only text fields.
    #[cfg(test)]
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    /// Raw text value.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Trimmed text value, `None` when blank.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<String> {
        super::non_empty(self.text(name))
    }

    /// Checkbox state: present with any value other than `false`.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        self.text(name).is_some_and(|v| v != "false")
    }

    /// Optional image, validated.
    ///
    /// # Errors
    ///
    /// Returns the validation failure when a file was sent but is not an
    /// acceptable image.
    pub fn image(&self, name: &str) -> Result<Option<&Upload>, UploadError> {
        self.files
            .get(name)
            .map(|upload| validate_image(&upload.content_type, upload.size()).map(|()| upload))
            .transpose()
    }

    /// Optional PDF, validated.
    ///
    /// # Errors
    ///
    /// Returns the validation failure when a file was sent but is not an
    /// acceptable PDF.
    pub fn pdf(&self, name: &str) -> Result<Option<&Upload>, UploadError> {
        self.files
            .get(name)
            .map(|upload| validate_pdf(&upload.content_type, upload.size()).map(|()| upload))
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    use super::*;

    const BOUNDARY: &str = "XBULTEX";

    async fn parse(parts: &[(&str, Option<(&str, &str)>, &str)]) -> MultipartForm {
        let mut body = Vec::new();
        for (name, file, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        MultipartForm::read(multipart).await.unwrap()
    }

    #[tokio::test]
    async fn test_reads_text_and_files() {
        let form = parse(&[
            ("title", None, "  Catalogo 2026 "),
            ("is_active", None, "on"),
            ("file", Some(("c.pdf", "application/pdf")), "%PDF-1.7"),
        ])
        .await;

        assert_eq!(form.value("title").as_deref(), Some("Catalogo 2026"));
        assert!(form.checked("is_active"));
        assert!(!form.checked("missing"));

        let pdf = form.pdf("file").unwrap().unwrap();
        assert_eq!(pdf.file_name, "c.pdf");
        assert_eq!(pdf.size(), 8);
    }

    #[tokio::test]
    async fn test_empty_file_input_is_absent() {
        let form = parse(&[("image", Some(("", "application/octet-stream")), "")]).await;
        assert!(form.image("image").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_type_is_rejected() {
        let form = parse(&[("image", Some(("doc.pdf", "application/pdf")), "%PDF")]).await;
        assert!(matches!(form.image("image"), Err(UploadError::UnsupportedImage)));

        let form = parse(&[("file", Some(("photo.png", "image/png")), "png")]).await;
        assert!(matches!(form.pdf("file"), Err(UploadError::NotPdf)));
    }

    #[tokio::test]
    async fn test_named_but_empty_file_is_rejected() {
        let form = parse(&[("file", Some(("empty.pdf", "application/pdf")), "")]).await;
        assert!(matches!(form.pdf("file"), Err(UploadError::Empty)));
    }
}
