//! Photo ordering and the featured tag.
//!
//! A product's photos carry their state in the filename:
//!
//! ```text
//! fotos/
//! ├── 01_front.jpg          # index 1
//! ├── 02_back_solo.jpg      # index 2, featured
//! └── 05_detail.jpg         # gaps are fine after deletions
//! ```
//!
//! The two-digit prefix orders photos (zero-padding makes filename order equal
//! index order) and the `_solo` marker flags the single featured shot. This
//! module parses those names into a [`PhotoDescriptor`] and writes them back,
//! so the rest of the crate never edits filename strings directly.
//!
//! Indices are assigned as `1..=N` when a product is created and continue from
//! the current maximum when photos are appended. Deleting a photo never
//! renumbers the others.

use crate::naming::sanitize_base;
use crate::types::{PhotoUpload, UploadedFile};
use std::io;
use std::path::{Path, PathBuf};

/// Extension every stored photo gets, whatever the upload format.
pub const PHOTO_EXTENSION: &str = "jpg";

/// Marker appended to the base name of the featured photo.
pub const FEATURED_MARKER: &str = "_solo";

/// Structured form of a photo filename `NN_<base>[_solo].jpg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDescriptor {
    pub index: u32,
    /// Sanitized base name, without prefix or marker.
    pub base: String,
    pub featured: bool,
}

impl PhotoDescriptor {
    pub fn new(index: u32, base: impl Into<String>, featured: bool) -> Self {
        Self {
            index,
            base: base.into(),
            featured,
        }
    }

    /// Parse a filename such as `02_back_solo.jpg`.
    ///
    /// Returns `None` unless the name starts with `<digits>_`. The marker is
    /// looked for after the prefix; every occurrence is removed from `base`.
    pub fn parse(filename: &str) -> Option<Self> {
        let stem = Path::new(filename).file_stem()?.to_string_lossy();
        let (digits, rest) = stem.split_once('_')?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse::<u32>().ok()?;
        Some(Self {
            index,
            base: rest.replace(FEATURED_MARKER, ""),
            featured: rest.contains(FEATURED_MARKER),
        })
    }

    /// Stored filename with the canonical `.jpg` extension.
    pub fn file_name(&self) -> String {
        self.file_name_with(PHOTO_EXTENSION)
    }

    /// Filename with an explicit extension (empty for none).
    pub fn file_name_with(&self, extension: &str) -> String {
        let marker = if self.featured { FEATURED_MARKER } else { "" };
        if extension.is_empty() {
            format!("{:02}_{}{}", self.index, self.base, marker)
        } else {
            format!("{:02}_{}{}.{}", self.index, self.base, marker, extension)
        }
    }
}

/// Parse just the `<digits>_` prefix of a filename.
fn parse_index_prefix(name: &str) -> Option<u32> {
    let (digits, _) = name.split_once('_')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next free index for a product: the largest existing prefix plus one.
///
/// Names without a parsable prefix are ignored. Max-based rather than
/// count-based, so gaps left by deletions are never reused.
pub fn next_index<'a>(names: impl IntoIterator<Item = &'a str>) -> u32 {
    names
        .into_iter()
        .filter_map(parse_index_prefix)
        .max()
        .unwrap_or(0)
        + 1
}

/// Fallback base name for a photo whose original name sanitizes to nothing.
pub fn fallback_base(slug: &str, index: u32) -> String {
    format!("{slug}_{index:02}")
}

/// Assign indices and names to the photos of a new product.
///
/// Uploads are stably sorted by their desired order and numbered from 1.
/// Every upload marked featured gets the marker; keeping that to one photo
/// is up to the caller.
pub fn assign_bulk<'a>(slug: &str, uploads: &'a [PhotoUpload]) -> Vec<(PhotoDescriptor, &'a PhotoUpload)> {
    let mut ordered: Vec<&PhotoUpload> = uploads.iter().collect();
    ordered.sort_by_key(|u| u.order);

    ordered
        .into_iter()
        .zip(1u32..)
        .map(|(upload, index)| {
            let base = sanitize_base(&upload.file.name, &fallback_base(slug, index));
            (PhotoDescriptor::new(index, base, upload.featured), upload)
        })
        .collect()
}

/// Assign indices and names to photos appended to an existing product,
/// continuing from `start`. Appended photos are never featured.
pub fn assign_appended<'a>(
    slug: &str,
    start: u32,
    files: &'a [UploadedFile],
) -> Vec<(PhotoDescriptor, &'a UploadedFile)> {
    files
        .iter()
        .zip(start..)
        .map(|(file, index)| {
            let base = sanitize_base(&file.name, &fallback_base(slug, index));
            (PhotoDescriptor::new(index, base, false), file)
        })
        .collect()
}

/// Move the featured marker to `chosen`, or clear it when `chosen` is `None`.
///
/// Every tagged photo other than `chosen` loses its marker first (prefix and
/// extension kept); then `chosen` gains it unless it already has it. However
/// many photos were tagged before, at most one is tagged afterwards.
///
/// Returns the photo list with renamed paths, in input order. Paths whose
/// names don't follow the photo convention are left as they are. A rename
/// that would overwrite another file fails with `AlreadyExists`.
pub fn retag_featured(photos: &[PathBuf], chosen: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let mut result = Vec::with_capacity(photos.len());
    let mut chosen_slot = None;

    for path in photos {
        let Some(descriptor) = descriptor_of(path) else {
            tracing::warn!(path = %path.display(), "skipping photo with unrecognized name");
            result.push(path.clone());
            continue;
        };
        if chosen == Some(path.as_path()) {
            chosen_slot = Some((result.len(), descriptor));
            result.push(path.clone());
        } else if descriptor.featured {
            let cleared = PhotoDescriptor {
                featured: false,
                ..descriptor
            };
            result.push(rename_to(path, &cleared)?);
        } else {
            result.push(path.clone());
        }
    }

    if let Some((slot, descriptor)) = chosen_slot
        && !descriptor.featured
    {
        let tagged = PhotoDescriptor {
            featured: true,
            ..descriptor
        };
        result[slot] = rename_to(&photos[slot], &tagged)?;
    }

    Ok(result)
}

fn descriptor_of(path: &Path) -> Option<PhotoDescriptor> {
    PhotoDescriptor::parse(&path.file_name()?.to_string_lossy())
}

fn rename_to(path: &Path, descriptor: &PhotoDescriptor) -> io::Result<PathBuf> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let target = path.with_file_name(descriptor.file_name_with(&extension));
    if target == path {
        return Ok(target);
    }
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("cannot rename {} to existing {}", path.display(), target.display()),
        ));
    }
    std::fs::rename(path, &target)?;
    tracing::debug!(from = %path.display(), to = %target.display(), "renamed photo");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn upload(name: &str, order: u32, featured: bool) -> PhotoUpload {
        PhotoUpload {
            file: UploadedFile::new(name, name.as_bytes().to_vec()),
            order,
            featured,
        }
    }

    fn touch_all(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|n| {
                let p = dir.join(n);
                fs::write(&p, n.as_bytes()).unwrap();
                p
            })
            .collect()
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    // =========================================================================
    // PhotoDescriptor
    // =========================================================================

    #[test]
    fn parse_plain_photo() {
        let d = PhotoDescriptor::parse("03_front.jpg").unwrap();
        assert_eq!(d, PhotoDescriptor::new(3, "front", false));
    }

    #[test]
    fn parse_featured_photo() {
        let d = PhotoDescriptor::parse("02_back_solo.jpg").unwrap();
        assert_eq!(d, PhotoDescriptor::new(2, "back", true));
    }

    #[test]
    fn parse_keeps_underscores_in_base() {
        let d = PhotoDescriptor::parse("10_BLUE_SHIRT_10.jpg").unwrap();
        assert_eq!(d.index, 10);
        assert_eq!(d.base, "BLUE_SHIRT_10");
    }

    #[test]
    fn parse_rejects_names_without_prefix() {
        assert_eq!(PhotoDescriptor::parse("front.jpg"), None);
        assert_eq!(PhotoDescriptor::parse("_front.jpg"), None);
        assert_eq!(PhotoDescriptor::parse("a1_front.jpg"), None);
    }

    #[test]
    fn file_name_pads_index() {
        assert_eq!(PhotoDescriptor::new(1, "front", false).file_name(), "01_front.jpg");
        assert_eq!(PhotoDescriptor::new(7, "back", true).file_name(), "07_back_solo.jpg");
        assert_eq!(PhotoDescriptor::new(123, "x", false).file_name(), "123_x.jpg");
    }

    // =========================================================================
    // next_index
    // =========================================================================

    #[test]
    fn next_index_is_max_based() {
        assert_eq!(next_index(["01_a.jpg", "03_b.jpg"]), 4);
    }

    #[test]
    fn next_index_starts_at_one() {
        assert_eq!(next_index(std::iter::empty()), 1);
    }

    #[test]
    fn next_index_ignores_unparsable_names() {
        assert_eq!(next_index(["cover.jpg", "02_x.jpg", "x_03.jpg"]), 3);
    }

    // =========================================================================
    // Bulk assignment
    // =========================================================================

    #[test]
    fn bulk_orders_by_desired_position() {
        let uploads = vec![
            upload("third.png", 3, false),
            upload("first.jpg", 1, true),
            upload("second.webp", 2, false),
        ];
        let names: Vec<String> = assign_bulk("SHIRT", &uploads)
            .iter()
            .map(|(d, _)| d.file_name())
            .collect();
        assert_eq!(names, vec!["01_first_solo.jpg", "02_second.jpg", "03_third.jpg"]);
    }

    #[test]
    fn bulk_ties_keep_submission_order() {
        let uploads = vec![upload("b.jpg", 1, false), upload("a.jpg", 1, false)];
        let names: Vec<String> = assign_bulk("X", &uploads)
            .iter()
            .map(|(d, _)| d.file_name())
            .collect();
        assert_eq!(names, vec!["01_b.jpg", "02_a.jpg"]);
    }

    #[test]
    fn bulk_uses_slug_fallback() {
        let uploads = vec![upload("ok.jpg", 1, false), upload("###.jpg", 2, false)];
        let assigned = assign_bulk("BLUE_SHIRT", &uploads);
        assert_eq!(assigned[1].0.file_name(), "02_BLUE_SHIRT_02.jpg");
    }

    #[test]
    fn bulk_tags_every_marked_entry() {
        let uploads = vec![upload("a.jpg", 1, true), upload("b.jpg", 2, true)];
        let assigned = assign_bulk("X", &uploads);
        assert!(assigned.iter().all(|(d, _)| d.featured));
    }

    #[test]
    fn appended_continue_from_start() {
        let files = vec![UploadedFile::new("new.png", vec![1]), UploadedFile::new("!!.jpg", vec![2])];
        let names: Vec<String> = assign_appended("COAT", 4, &files)
            .iter()
            .map(|(d, _)| d.file_name())
            .collect();
        assert_eq!(names, vec!["04_new.jpg", "05_COAT_05.jpg"]);
    }

    // =========================================================================
    // Re-tagging on disk
    // =========================================================================

    #[test]
    fn retag_moves_marker_to_chosen() {
        let tmp = TempDir::new().unwrap();
        let photos = touch_all(tmp.path(), &["01_a_solo.jpg", "02_b.jpg"]);

        let updated = retag_featured(&photos, Some(&photos[1])).unwrap();

        assert_eq!(names_in(tmp.path()), vec!["01_a.jpg", "02_b_solo.jpg"]);
        assert_eq!(updated[1], tmp.path().join("02_b_solo.jpg"));
    }

    #[test]
    fn retag_with_none_clears_marker() {
        let tmp = TempDir::new().unwrap();
        let photos = touch_all(tmp.path(), &["01_a_solo.jpg", "02_b.jpg"]);

        retag_featured(&photos, None).unwrap();

        assert_eq!(names_in(tmp.path()), vec!["01_a.jpg", "02_b.jpg"]);
    }

    #[test]
    fn retag_resolves_multiple_tags() {
        let tmp = TempDir::new().unwrap();
        let photos = touch_all(tmp.path(), &["01_a_solo.jpg", "02_b_solo.jpg", "03_c.jpg"]);

        retag_featured(&photos, Some(&photos[2])).unwrap();

        assert_eq!(names_in(tmp.path()), vec!["01_a.jpg", "02_b.jpg", "03_c_solo.jpg"]);
    }

    #[test]
    fn retag_keeps_already_featured_choice() {
        let tmp = TempDir::new().unwrap();
        let photos = touch_all(tmp.path(), &["01_a_solo.jpg", "02_b_solo.jpg"]);

        retag_featured(&photos, Some(&photos[0])).unwrap();

        assert_eq!(names_in(tmp.path()), vec!["01_a_solo.jpg", "02_b.jpg"]);
    }

    #[test]
    fn retag_preserves_content() {
        let tmp = TempDir::new().unwrap();
        let photos = touch_all(tmp.path(), &["01_a.jpg"]);

        let updated = retag_featured(&photos, Some(&photos[0])).unwrap();

        assert_eq!(fs::read(&updated[0]).unwrap(), b"01_a.jpg");
    }

    #[test]
    fn retag_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let photos = touch_all(tmp.path(), &["01_a.jpg", "01_a_solo.jpg"]);

        let err = retag_featured(&photos, None).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(names_in(tmp.path()), vec!["01_a.jpg", "01_a_solo.jpg"]);
    }
}
