//! Payment QR code upload.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use shopfront_client::api::{ApiError, Credential, QrCode};
use tracing::instrument;

use super::AdminApi;

/// Multipart field the backend reads the image from.
const QR_FIELD: &str = "qrCode";

/// An image to upload as the store's payment QR code.
#[derive(Clone)]
pub struct QrUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl std::fmt::Debug for QrUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

impl QrUpload {
    /// Wrap raw image bytes, guessing the media type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name);
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    /// Read an image from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "qr.png".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(Form::new().part(QR_FIELD, part))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

impl AdminApi {
    /// The store's current payment QR code.
    ///
    /// # Errors
    ///
    /// Returns an error if no QR code is configured or the request fails.
    pub async fn qr_code(&self) -> Result<QrCode, ApiError> {
        self.client.qr_code().await
    }

    /// Replace the store's payment QR code.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the image or the request fails.
    #[instrument(skip(self, upload), fields(file = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_qr(&self, upload: QrUpload) -> Result<QrCode, ApiError> {
        let form = upload.into_form()?;
        self.client
            .post_multipart("/admin/qr/upload", form, Credential::Admin)
            .await
    }
}
