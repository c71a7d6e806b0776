//! Name and filename conventions for the catalog layout.
//!
//! Every directory and file the store writes gets its name from this module:
//!
//! - Product directories use a **slug** derived from the display name:
//!   `Camisa Romántica Antracita` → `CAMISA_ROMANTICA_ANTRACITA`.
//! - Uploaded photos keep a **sanitized base** of their original filename:
//!   `my file!!.jpg` → `myfile`.
//! - Brand names are used verbatim, so they must already be a single safe
//!   path component.
//!
//! All functions here are pure and never fail. Characters outside the
//! accepted classes are dropped, and an empty result falls back to a fixed
//! token instead of producing an empty path component.

use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Slug used when a product name has no usable characters.
pub const FALLBACK_SLUG: &str = "PRODUCTO";

/// Upload extensions accepted for logos and photos (compared lowercase).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Derive the directory slug for a product display name.
///
/// - Accented letters are decomposed and their marks dropped (`á` → `a`)
/// - Anything but ASCII letters, digits, whitespace, `-` and `_` is removed
/// - Each run of whitespace and hyphens becomes a single `_`
/// - The result is upper-cased and stripped of leading/trailing `_`
///
/// Removal happens before collapsing, so `"a - ! - b"` is one gap: `A_B`.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_gap = false;

    for c in name.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_whitespace() || c == '-' {
            in_gap = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if in_gap {
                slug.push('_');
                in_gap = false;
            }
            slug.push(c.to_ascii_uppercase());
        }
    }

    let trimmed = slug.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sanitize an uploaded filename into a base name for storage.
///
/// Takes the stem (extension stripped) and keeps only ASCII letters, digits,
/// `-` and `_`. Returns `fallback` when nothing survives.
pub fn sanitize_base(filename: &str, fallback: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let base: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if base.is_empty() {
        fallback.to_string()
    } else {
        base
    }
}

/// Whether `name` can be used as exactly one path component under a root.
///
/// Rejects empty/blank names, `.` and `..`, and anything containing a path
/// separator or NUL.
pub fn is_safe_component(name: &str) -> bool {
    if name.trim().is_empty() || name == "." || name == ".." {
        return false;
    }
    !name.chars().any(|c| matches!(c, '/' | '\\' | '\0'))
}

/// Lowercased extension of an uploaded filename, if any.
pub fn upload_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Whether an uploaded filename carries one of [`ACCEPTED_EXTENSIONS`].
///
/// Only the extension is checked; content is never inspected.
pub fn is_accepted_upload(filename: &str) -> bool {
    upload_extension(filename).is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
}
