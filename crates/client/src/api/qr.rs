//! Payment QR code retrieval.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::instrument;

use super::{ApiClient, ApiError, Credential, QrCode};

impl ApiClient {
    /// Fetch the store's payment QR code reference.
    ///
    /// # Errors
    ///
    /// Returns an error if no QR code is configured or the request fails.
    #[instrument(skip(self))]
    pub async fn qr_code(&self) -> Result<QrCode, ApiError> {
        self.get("/qr", Credential::Anonymous).await
    }
}

/// Decode a base64 `data:` URL into its media type and bytes.
///
/// Returns `None` for plain URLs or malformed data URLs.
#[must_use]
pub fn decode_data_url(value: &str) -> Option<(String, Vec<u8>)> {
    let rest = value.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let media_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(data.trim()).ok()?;
    Some((media_type.to_string(), bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_data_url() {
        let (media, bytes) = decode_data_url("data:image/png;base64,iVBORw0K").unwrap();
        assert_eq!(media, "image/png");
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_data_url_rejects_plain_urls() {
        assert!(decode_data_url("https://cdn.example.in/qr.png").is_none());
        assert!(decode_data_url("data:image/png,rawdata").is_none());
        assert!(decode_data_url("data:image/png;base64,@@@").is_none());
    }
}
