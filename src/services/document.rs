use crate::core::validation::{has_allowed_extension, is_blank, secure_filename};
use crate::services::summary::classify::ErrorCategory;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,
    #[error("No file selected")]
    NoFilename,
    #[error("Invalid file type. Only TXT files are allowed.")]
    InvalidType,
    #[error("File encoding error. Please ensure the file is UTF-8 encoded.")]
    Encoding,
    #[error("File is empty")]
    Empty,
    #[error("Error processing file: {0}")]
    Malformed(String),
}

impl UploadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UploadError::NoFile | UploadError::NoFilename | UploadError::InvalidType | UploadError::Empty => {
                ErrorCategory::Validation
            }
            UploadError::Encoding => ErrorCategory::Encoding,
            UploadError::Malformed(_) => ErrorCategory::Internal,
        }
    }
}

/// A validated upload. Lives for a single request and is never written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub filename: String,
    pub content: String,
}

/// Checks the declared filename, decodes the payload as UTF-8 and rejects
/// blank documents. `filename` is `None` when the part carried no filename.
pub fn validate_upload(filename: Option<&str>, bytes: Vec<u8>) -> Result<UploadedDocument, UploadError> {
    let filename = filename.ok_or(UploadError::NoFile)?;
    if filename.is_empty() {
        return Err(UploadError::NoFilename);
    }
    if !has_allowed_extension(filename) {
        return Err(UploadError::InvalidType);
    }

    let content = String::from_utf8(bytes).map_err(|_| UploadError::Encoding)?;
    if is_blank(&content) {
        return Err(UploadError::Empty);
    }

    Ok(UploadedDocument {
        filename: secure_filename(filename),
        content,
    })
}
