//! Shared rules for files received from multipart uploads.

use crate::errors::AppError;

/// 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// A file part pulled out of a multipart request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Accepted media types and size ceiling for one kind of asset.
#[derive(Debug, Clone, Copy)]
pub struct FileRules {
    pub label: &'static str,
    pub allowed_types: &'static [&'static str],
    pub max_bytes: usize,
}

pub const SYLLABUS_RULES: FileRules = FileRules {
    label: "Syllabus",
    allowed_types: &["application/pdf"],
    max_bytes: MAX_UPLOAD_BYTES,
};

pub const IMAGE_RULES: FileRules = FileRules {
    label: "Image",
    allowed_types: &["image/jpeg", "image/png", "image/webp", "image/gif"],
    max_bytes: MAX_UPLOAD_BYTES,
};

impl FileRules {
    /// Reject a file before anything is sent anywhere.
    pub fn check(&self, file: &IncomingFile) -> Result<(), AppError> {
        let declared = file
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if !self.allowed_types.contains(&declared.as_str()) {
            return Err(AppError::Validation(format!(
                "{} must be one of [{}], got '{}'",
                self.label,
                self.allowed_types.join(", "),
                file.content_type
            )));
        }
        if file.data.is_empty() {
            return Err(AppError::Validation(format!("{} file is empty", self.label)));
        }
        if file.data.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "{} exceeds the {} MiB limit ({} bytes)",
                self.label,
                self.max_bytes / (1024 * 1024),
                file.data.len()
            )));
        }
        Ok(())
    }
}

/// Require a non-blank identifier field.
pub fn require_id<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}
