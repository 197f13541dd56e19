//! Submit form parsing. Uploaded files are decoded in memory and never
//! touch the filesystem.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::UploadError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Source text and requirements taken from a submit form.
#[derive(Debug)]
pub struct Submission {
    pub text: String,
    pub requirements: String,
}

/// Decode an uploaded file as UTF-8, falling back to GBK.
pub fn decode_upload(bytes: &[u8]) -> Result<String, UploadError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }
    let (text, had_errors) = encoding_rs::GBK.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(UploadError::EncodingUnsupported);
    }
    tracing::debug!(bytes = bytes.len(), "upload decoded as GBK");
    Ok(text.into_owned())
}

fn form_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge
    } else {
        UploadError::Multipart(err.body_text())
    }
}

/// Read `text_input`, `file` and `requirements` from the form. Non-blank
/// typed text wins over an uploaded file.
pub async fn read_submission(mut multipart: Multipart) -> Result<Submission, UploadError> {
    let mut text_input = None;
    let mut file = None;
    let mut requirements = String::new();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text_input" => text_input = Some(field.text().await.map_err(form_error)?),
            "requirements" => requirements = field.text().await.map_err(form_error)?,
            "file" => {
                let named = field.file_name().is_some_and(|n| !n.is_empty());
                let bytes = field.bytes().await.map_err(form_error)?;
                if named {
                    file = Some(bytes);
                }
            }
            _ => {}
        }
    }

    let text = match text_input {
        Some(text) if !text.trim().is_empty() => text,
        _ => match file {
            Some(bytes) => decode_upload(&bytes)?,
            None => String::new(),
        },
    };
    if text.trim().is_empty() {
        return Err(UploadError::EmptyInput);
    }

    Ok(Submission { text, requirements })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_upload("夜色 night".as_bytes()).unwrap(), "夜色 night");
    }

    #[test]
    fn bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"text");
        assert_eq!(decode_upload(&bytes).unwrap(), "text");
    }

    #[test]
    fn gbk_fallback() {
        // "你好" in GBK
        let bytes = [0xC4, 0xE3, 0xBA, 0xC3];
        assert_eq!(decode_upload(&bytes).unwrap(), "你好");
    }

    #[test]
    fn undecodable_bytes_rejected() {
        assert!(matches!(
            decode_upload(&[0xFF, 0xFF, 0xFF]),
            Err(UploadError::EncodingUnsupported)
        ));
    }
}
