use actix_multipart::Multipart;
use actix_multipart::MultipartError;
use futures::{StreamExt, TryStreamExt};
use unicode_normalization::UnicodeNormalization;

pub const FILE_FIELD: &str = "file";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No se envió el archivo con key 'file'")]
    MissingFile,
    #[error("Archivo vacío")]
    EmptyFilename,
    #[error("Archivo demasiado grande (máximo {limit} bytes)")]
    TooLarge { limit: usize },
    #[error("Error leyendo la subida: {0}")]
    Multipart(String),
    #[error("No es una imagen válida: {0}")]
    InvalidImage(#[from] image::ImageError),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        match err {
            // Not a multipart body at all, so there is no file to read.
            MultipartError::ContentTypeMissing
            | MultipartError::ContentTypeParse
            | MultipartError::ContentTypeIncompatible
            | MultipartError::BoundaryMissing => UploadError::MissingFile,
            other => UploadError::Multipart(other.to_string()),
        }
    }
}

/// Raw upload as received, before sanitization or decoding.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Reads the first `file` field that carries a filename. Other fields are
/// drained and ignored.
pub async fn read_file_field(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<UploadedFile, UploadError> {
    while let Some(mut field) = payload.try_next().await? {
        let filename = match (field.name(), field.content_disposition()) {
            (Some(FILE_FIELD), Some(cd)) => cd.get_filename().map(str::to_owned),
            _ => None,
        };
        let Some(filename) = filename else {
            while field.try_next().await?.is_some() {}
            continue;
        };
        if filename.is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if data.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge { limit: max_bytes });
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(UploadedFile { filename, data });
    }
    Err(UploadError::MissingFile)
}

/// ASCII-only filename safe to store and echo back. Accented letters are
/// NFKD-folded to their base letter, path separators and whitespace collapse
/// to `_`, anything outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing
/// `.` and `_` are stripped.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(secure_filename("chest_01.jpeg"), "chest_01.jpeg");
    }

    #[test]
    fn strips_directories_and_spaces() {
        assert_eq!(
            secure_filename("../../etc/passwd"),
            "etc_passwd"
        );
        assert_eq!(secure_filename("My X-ray scan.png"), "My_X-ray_scan.png");
        assert_eq!(secure_filename(r"C:\Users\ana\rx.jpg"), "C_Users_ana_rx.jpg");
    }

    #[test]
    fn folds_accents_to_ascii() {
        assert_eq!(secure_filename("radiografía tórax.jpg"), "radiografia_torax.jpg");
        assert_eq!(secure_filename("niño_Ñandú.png"), "nino_Nandu.png");
    }

    #[test]
    fn drops_characters_without_ascii_form() {
        assert_eq!(secure_filename("胸部 scan.jpg"), "scan.jpg");
    }

    #[test]
    fn non_multipart_bodies_count_as_missing_file() {
        for err in [
            MultipartError::ContentTypeMissing,
            MultipartError::ContentTypeParse,
            MultipartError::ContentTypeIncompatible,
            MultipartError::BoundaryMissing,
        ] {
            assert!(matches!(UploadError::from(err), UploadError::MissingFile));
        }
    }

    #[test]
    fn hidden_files_lose_leading_dot() {
        assert_eq!(secure_filename(".bashrc"), "bashrc");
    }
}
