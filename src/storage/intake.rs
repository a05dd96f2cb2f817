//! Pre-write validation for uploaded files.
//!
//! Every file in a request is checked before any blob is written, so a
//! rejected upload leaves no partial state behind.

use std::collections::HashMap;

use axum::body::Bytes;
use thiserror::Error;

use crate::storage::slots::Slot;

/// Types accepted by the document slots. The profile image slot instead
/// accepts any `image/*` type.
pub const DOCUMENT_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Unexpected file field '{0}'")]
    UnknownField(String),

    #[error("File type '{content_type}' is not allowed for {field}")]
    UnsupportedType {
        field: &'static str,
        content_type: String,
    },

    #[error("File '{name}' exceeds the {limit_bytes} byte size limit")]
    TooLarge { name: String, limit_bytes: usize },

    #[error("Too many files for {field} (limit {limit})")]
    TooMany { field: &'static str, limit: usize },
}

/// One uploaded file, fully buffered.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// All files attached to one request, grouped by slot. A slot with no entry
/// was not touched by the request.
#[derive(Debug, Default)]
pub struct UploadBundle {
    files: HashMap<Slot, Vec<IncomingFile>>,
}

impl UploadBundle {
    pub fn push(&mut self, slot: Slot, file: IncomingFile) {
        self.files.entry(slot).or_default().push(file);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True when the request attached at least one file for this slot.
    pub fn touched(&self, slot: Slot) -> bool {
        self.files.contains_key(&slot)
    }

    pub fn get(&self, slot: Slot) -> &[IncomingFile] {
        self.files.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IntakeLimits {
    pub max_file_size_bytes: usize,
    pub max_files_per_slot: usize,
}

/// Checks every attached file against its slot's type allow-list, the
/// per-file size cap, and the slot's file-count limit.
pub fn validate(bundle: &UploadBundle, limits: IntakeLimits) -> Result<(), IntakeError> {
    for slot in Slot::ALL {
        let files = bundle.get(slot);
        let max_files = if slot.is_multi() { limits.max_files_per_slot } else { 1 };
        if files.len() > max_files {
            return Err(IntakeError::TooMany {
                field: slot.field_name(),
                limit: max_files,
            });
        }
        for file in files {
            if !mime_allowed(slot, &file.content_type) {
                return Err(IntakeError::UnsupportedType {
                    field: slot.field_name(),
                    content_type: file.content_type.clone(),
                });
            }
            if file.bytes.len() > limits.max_file_size_bytes {
                return Err(IntakeError::TooLarge {
                    name: file.original_name.clone(),
                    limit_bytes: limits.max_file_size_bytes,
                });
            }
        }
    }
    Ok(())
}

pub fn mime_allowed(slot: Slot, content_type: &str) -> bool {
    // Strip any parameters; `image/png; charset=binary` still means image/png.
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match slot {
        Slot::ProfileImage => essence.starts_with("image/"),
        _ => DOCUMENT_MIME_TYPES.contains(&essence),
    }
}
