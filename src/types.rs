//! Shared types passed into and returned from catalog operations.
//!
//! Requests ([`NewProduct`], [`ProductUpdate`], [`PhotoUpload`]) carry every
//! value an operation needs; the store keeps no state between calls.
//! [`ProductInfo`] is the `info.json` record and its field names are part of
//! the on-disk format.

use crate::photos::PhotoDescriptor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Product metadata as stored in `info.json`.
///
/// Field order and JSON names are fixed: `nombre`, `marca`, `precio`,
/// `tallas`, `categoria`, `url`. Missing keys deserialize to their defaults,
/// so older or hand-edited records still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfo {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "precio")]
    pub price: Option<f64>,
    #[serde(rename = "tallas")]
    pub sizes: Vec<String>,
    #[serde(rename = "categoria")]
    pub category: String,
    pub url: String,
}

/// A file received from the operator: its original name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A photo submitted at product creation, with its desired position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file: UploadedFile,
    /// Desired position; lower comes first, ties keep submission order.
    pub order: u32,
    /// Mark this photo as the featured ("solo") shot.
    pub featured: bool,
}

/// Everything needed to create a product.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    /// `None` when no brand was selected.
    pub brand: Option<String>,
    pub name: String,
    pub price: Option<f64>,
    pub sizes: Vec<String>,
    pub category: String,
    pub url: String,
    pub photos: Vec<PhotoUpload>,
}

/// Replacement metadata for an existing product.
///
/// A name whose slug differs from the current directory renames the product.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: String,
    pub price: Option<f64>,
    pub sizes: Vec<String>,
    pub category: String,
    pub url: String,
}

/// A product as found on disk.
#[derive(Debug, Clone)]
pub struct Product {
    pub brand: String,
    /// Directory name; stable until an explicit rename.
    pub slug: String,
    pub dir: PathBuf,
    /// Empty when `info.json` is missing or unreadable.
    pub info: ProductInfo,
    /// `.jpg` files in `fotos/`, sorted by filename (and so by index).
    pub photos: Vec<PathBuf>,
}

impl Product {
    /// Display name, falling back to the slug for records without one.
    pub fn display_name(&self) -> &str {
        if self.info.name.trim().is_empty() {
            &self.slug
        } else {
            &self.info.name
        }
    }

    /// The featured photo, if any. With several tagged, the first wins.
    pub fn featured_photo(&self) -> Option<&Path> {
        self.photos
            .iter()
            .find(|p| {
                p.file_name()
                    .and_then(|n| PhotoDescriptor::parse(&n.to_string_lossy()))
                    .is_some_and(|d| d.featured)
            })
            .map(PathBuf::as_path)
    }

    /// Directory holding the product's photos.
    pub fn photos_dir(&self) -> PathBuf {
        self.dir.join(crate::store::PHOTOS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_serializes_with_fixed_field_names() {
        let info = ProductInfo {
            name: "Blue Shirt".into(),
            brand: "Acme".into(),
            price: Some(19.99),
            sizes: vec!["S".into(), "M".into()],
            category: "Shirts".into(),
            url: String::new(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(
            json,
            r#"{"nombre":"Blue Shirt","marca":"Acme","precio":19.99,"tallas":["S","M"],"categoria":"Shirts","url":""}"#
        );
    }

    #[test]
    fn missing_price_serializes_as_null() {
        let json = serde_json::to_string(&ProductInfo::default()).unwrap();
        assert!(json.contains(r#""precio":null"#));
    }

    #[test]
    fn partial_record_fills_defaults() {
        let info: ProductInfo = serde_json::from_str(r#"{"nombre": "Polo"}"#).unwrap();
        assert_eq!(info.name, "Polo");
        assert_eq!(info.price, None);
        assert!(info.sizes.is_empty());
    }

    #[test]
    fn display_name_falls_back_to_slug() {
        let product = Product {
            brand: "Acme".into(),
            slug: "BLUE_SHIRT".into(),
            dir: PathBuf::from("assets/productos/Acme/BLUE_SHIRT"),
            info: ProductInfo::default(),
            photos: vec![],
        };
        assert_eq!(product.display_name(), "BLUE_SHIRT");
    }

    #[test]
    fn featured_photo_found_by_marker() {
        let product = Product {
            brand: "Acme".into(),
            slug: "BLUE_SHIRT".into(),
            dir: PathBuf::from("p"),
            info: ProductInfo::default(),
            photos: vec![
                PathBuf::from("p/fotos/01_front.jpg"),
                PathBuf::from("p/fotos/02_back_solo.jpg"),
            ],
        };
        assert_eq!(
            product.featured_photo(),
            Some(Path::new("p/fotos/02_back_solo.jpg"))
        );
    }
}
