//! Shared test utilities for the catalog-admin test suite.
//!
//! Provides a recording [`MockNotifier`], catalog setup in a temp directory,
//! request builders, and lookup helpers that panic with a clear message.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let catalog = catalog_in(&tmp);
//! catalog.create_product(shirt_request("Acme")).unwrap();
//!
//! let products = catalog.list_products("Acme");
//! let shirt = find_product(&products, "BLUE_SHIRT");
//! assert_eq!(file_names(&shirt.photos_dir()), vec!["01_front.jpg", "02_back_solo.jpg"]);
//! assert_eq!(catalog.notifier().calls(), 1);
//! ```

use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::notify::{IndexOutput, Notifier, NotifyError};
use crate::store::{Catalog, CatalogLayout};
use crate::types::{NewProduct, PhotoUpload, Product, UploadedFile};

// =========================================================================
// Mock notifier
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Success,
    /// A step ran and exited non-zero.
    Failure,
    /// The first step could not be started.
    Unavailable,
}

/// Notifier that counts regeneration requests instead of running anything.
/// Uses Mutex (not Cell) so it stays Sync like the real notifiers.
pub struct MockNotifier {
    outcome: MockOutcome,
    calls: Mutex<usize>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::with_outcome(MockOutcome::Success)
    }

    pub fn failing() -> Self {
        Self::with_outcome(MockOutcome::Failure)
    }

    pub fn unavailable() -> Self {
        Self::with_outcome(MockOutcome::Unavailable)
    }

    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for MockNotifier {
    fn regenerate(&self) -> Result<IndexOutput, NotifyError> {
        *self.calls.lock().unwrap() += 1;
        match self.outcome {
            MockOutcome::Success => Ok(IndexOutput {
                success: true,
                log: "[mock]\nok\n".to_string(),
            }),
            MockOutcome::Failure => Ok(IndexOutput {
                success: false,
                log: "[mock]\n\nboom\n".to_string(),
            }),
            MockOutcome::Unavailable => Err(NotifyError::Spawn {
                step: "mock".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}

// =========================================================================
// Catalog setup
// =========================================================================

/// Catalog rooted at `<tmp>/assets` with a succeeding mock notifier.
pub fn catalog_in(tmp: &TempDir) -> Catalog<MockNotifier> {
    catalog_with(tmp, MockNotifier::new())
}

pub fn catalog_with(tmp: &TempDir, notifier: MockNotifier) -> Catalog<MockNotifier> {
    Catalog::new(CatalogLayout::new(tmp.path().join("assets")), notifier)
}

/// A photo upload whose content is its own name.
pub fn upload(name: &str, order: u32, featured: bool) -> PhotoUpload {
    PhotoUpload {
        file: UploadedFile::new(name, name.as_bytes().to_vec()),
        order,
        featured,
    }
}

/// A complete "Blue Shirt" request: price 19.99, sizes S and M, category
/// Shirts, photos `front.jpg` (order 1) and `back.png` (order 2, featured).
pub fn shirt_request(brand: &str) -> NewProduct {
    NewProduct {
        brand: Some(brand.to_string()),
        name: "Blue Shirt".to_string(),
        price: Some(19.99),
        sizes: vec!["S".to_string(), "M".to_string()],
        category: "Shirts".to_string(),
        url: String::new(),
        photos: vec![upload("front.jpg", 1, false), upload("back.png", 2, true)],
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a product by slug. Panics if not found.
pub fn find_product<'a>(products: &'a [Product], slug: &str) -> &'a Product {
    products.iter().find(|p| p.slug == slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = products.iter().map(|p| p.slug.as_str()).collect();
        panic!("product '{slug}' not found. Available: {slugs:?}")
    })
}

/// Sorted names of every entry in a directory.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
