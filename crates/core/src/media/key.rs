//! Object key derivation.

use uuid::Uuid;

use super::error::MediaError;

/// File extension for a content type, dot included.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        _ => ".bin",
    }
}

/// Derive the storage key for an upload.
///
/// A non-empty `file_name` is used verbatim apart from leading `/`; otherwise
/// the name is a random UUID plus [`extension_for`] the content type. A
/// non-empty `path` is joined in front with exactly one `/`. The key never
/// starts with `/`.
#[must_use]
pub fn derive_object_key(path: &str, file_name: &str, content_type: &str) -> String {
    let name = file_name.trim_start_matches('/');
    let name = if name.is_empty() {
        format!("{}{}", Uuid::new_v4(), extension_for(content_type))
    } else {
        name.to_string()
    };

    let prefix = path.trim_end_matches('/');
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

/// Reject path components that could address keys outside the caller's prefix.
///
/// `path` must be relative, and neither `path` nor `file_name` may contain
/// `.` or `..` segments. Separators inside `file_name` are allowed.
pub fn check_key_components(path: &str, file_name: &str) -> Result<(), MediaError> {
    if path.starts_with('/') {
        return Err(MediaError::invalid_object_key(format!(
            "path '{path}' must be relative"
        )));
    }
    if file_name.ends_with('/') {
        return Err(MediaError::invalid_object_key(format!(
            "file name '{file_name}' must not end with '/'"
        )));
    }

    for (label, value) in [("path", path), ("file name", file_name)] {
        if value.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(MediaError::invalid_object_key(format!(
                "{label} '{value}' contains a relative segment"
            )));
        }
    }

    Ok(())
}
