//! Filesystem-backed catalog store.
//!
//! The directory tree under the assets directory is the database:
//!
//! ```text
//! assets/
//! ├── logos/
//! │   └── Acme.png                  # raw uploaded bytes, always named .png
//! └── productos/
//!     └── Acme/                     # brand
//!         └── BLUE_SHIRT/           # product slug
//!             ├── info.json         # {nombre, marca, precio, tallas, categoria, url}
//!             └── fotos/
//!                 ├── 01_front.jpg
//!                 └── 02_back_solo.jpg
//! ```
//!
//! A brand exists if it has a logo, a product directory, or both. A product's
//! directory name is its slug, derived from the display name when it is
//! created and changed only by a rename in [`Catalog::update_product`].
//!
//! ## Reads are tolerant
//!
//! A missing or malformed `info.json` loads as empty metadata (see
//! [`InfoRecord`]); the operator fixes it by editing the product. Missing
//! directories list as empty.
//!
//! ## Writes are single-shot
//!
//! Every mutation is a plain sequence of file operations with no locking and
//! no rollback. After a successful mutation the store asks its [`Notifier`]
//! to regenerate downstream indexes; that outcome is returned in [`Saved`]
//! and never turns a completed mutation into an error.
//!
//! Paths passed in by the caller are resolved symlink by symlink before they
//! are checked. Anything that resolves outside the products root is refused
//! with [`CatalogError::Security`] before anything is touched, and the
//! mutation then runs on the resolved path. Operations on a single product
//! also require the path to be exactly `<brand>/<slug>` below the root.

use crate::naming::{derive_slug, is_accepted_upload, is_safe_component, upload_extension};
use crate::notify::{IndexReport, Notifier};
use crate::photos::{self, PHOTO_EXTENSION};
use crate::types::{NewProduct, Product, ProductInfo, ProductUpdate, UploadedFile};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Logo directory inside the assets directory.
pub const LOGOS_DIR: &str = "logos";
/// Products root inside the assets directory.
pub const PRODUCTS_DIR: &str = "productos";
/// Photo directory inside each product.
pub const PHOTOS_DIR: &str = "fotos";
/// Metadata file inside each product.
pub const INFO_FILENAME: &str = "info.json";
/// Extension every stored logo gets, whatever the upload format.
pub const LOGO_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("A product with slug '{slug}' already exists in brand '{brand}'")]
    AlreadyExists { brand: String, slug: String },
    #[error("Path is outside the catalog: {0}")]
    Security(PathBuf),
    #[error("Unsupported format: {0} (use PNG/JPG/JPEG/WEBP)")]
    UnsupportedFormat(String),
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paths of the catalog layout below an assets directory.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    assets: PathBuf,
}

impl CatalogLayout {
    pub fn new(assets: impl Into<PathBuf>) -> Self {
        Self {
            assets: assets.into(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets
    }

    pub fn logos_dir(&self) -> PathBuf {
        self.assets.join(LOGOS_DIR)
    }

    pub fn products_dir(&self) -> PathBuf {
        self.assets.join(PRODUCTS_DIR)
    }

    pub fn logo_path(&self, brand: &str) -> PathBuf {
        self.logos_dir().join(format!("{brand}.{LOGO_EXTENSION}"))
    }

    pub fn brand_dir(&self, brand: &str) -> PathBuf {
        self.products_dir().join(brand)
    }

    pub fn product_dir(&self, brand: &str, slug: &str) -> PathBuf {
        self.brand_dir(brand).join(slug)
    }
}

/// Result of reading a product's `info.json`.
///
/// Both `Missing` and `Unreadable` map to empty metadata through
/// [`InfoRecord::into_info`]; the distinction is kept for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoRecord {
    Found(ProductInfo),
    Missing,
    Unreadable(String),
}

impl InfoRecord {
    pub fn read(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return InfoRecord::Missing,
            Err(e) => return InfoRecord::Unreadable(e.to_string()),
        };
        match serde_json::from_str(&content) {
            Ok(info) => InfoRecord::Found(info),
            Err(e) => InfoRecord::Unreadable(e.to_string()),
        }
    }

    pub fn into_info(self) -> ProductInfo {
        match self {
            InfoRecord::Found(info) => info,
            InfoRecord::Missing | InfoRecord::Unreadable(_) => ProductInfo::default(),
        }
    }
}

/// A completed mutation together with the index regeneration outcome.
#[derive(Debug)]
pub struct Saved<T> {
    pub value: T,
    /// `None` when the operation turned out to change nothing.
    pub index: Option<IndexReport>,
}

/// The catalog store. Holds only its layout and notifier; every operation
/// receives the rest of its inputs from the caller.
pub struct Catalog<N> {
    layout: CatalogLayout,
    notifier: N,
}

impl<N: Notifier> Catalog<N> {
    pub fn new(layout: CatalogLayout, notifier: N) -> Self {
        Self { layout, notifier }
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Brand names: logo stems united with brand directory names, sorted.
    pub fn list_brands(&self) -> Vec<String> {
        let mut brands = BTreeSet::new();

        for path in child_entries(&self.layout.logos_dir()) {
            if path.is_file()
                && path
                    .file_name()
                    .is_some_and(|n| is_accepted_upload(&n.to_string_lossy()))
                && let Some(stem) = path.file_stem()
            {
                brands.insert(stem.to_string_lossy().to_string());
            }
        }
        for path in child_entries(&self.layout.products_dir()) {
            if path.is_dir()
                && let Some(name) = path.file_name()
            {
                brands.insert(name.to_string_lossy().to_string());
            }
        }

        brands.into_iter().collect()
    }

    /// Products of a brand, sorted by slug. Unknown brands have none.
    pub fn list_products(&self, brand: &str) -> Vec<Product> {
        if !is_safe_component(brand) {
            return Vec::new();
        }
        child_entries(&self.layout.brand_dir(brand))
            .into_iter()
            .filter(|p| p.is_dir())
            .map(|dir| load_product(brand, dir))
            .collect()
    }

    /// A single product by brand and slug.
    pub fn find_product(&self, brand: &str, slug: &str) -> Result<Product, CatalogError> {
        ensure_safe_brand(&self.layout, brand)?;
        if !is_safe_component(slug) {
            return Err(CatalogError::Security(self.layout.brand_dir(brand).join(slug)));
        }
        let dir = self.layout.product_dir(brand, slug);
        if !dir.is_dir() {
            return Err(CatalogError::NotFound(dir));
        }
        Ok(load_product(brand, dir))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a product directory with its metadata and photos.
    ///
    /// All missing fields are reported together. Photo formats are checked
    /// before anything is written. An existing product with the same slug is
    /// overwritten in place: its `info.json` is replaced and the new photos
    /// are written next to the old ones.
    pub fn create_product(&self, request: NewProduct) -> Result<Saved<Product>, CatalogError> {
        let mut missing = Vec::new();
        let brand = request
            .brand
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty());
        if brand.is_none() {
            missing.push("brand".to_string());
        }
        let name = request.name.trim();
        if name.is_empty() {
            missing.push("name".to_string());
        }
        if !is_valid_price(request.price) {
            missing.push("price".to_string());
        }
        let sizes = clean_sizes(&request.sizes);
        if sizes.is_empty() {
            missing.push("sizes".to_string());
        }
        let category = request.category.trim();
        if category.is_empty() {
            missing.push("category".to_string());
        }
        if request.photos.is_empty() {
            missing.push("photos".to_string());
        }
        let brand = match brand {
            Some(b) if missing.is_empty() => b,
            _ => return Err(CatalogError::Validation(missing)),
        };

        ensure_safe_brand(&self.layout, brand)?;
        for upload in &request.photos {
            ensure_accepted(&upload.file)?;
        }

        let slug = derive_slug(name);
        let dir = self.layout.product_dir(brand, &slug);
        if dir.exists() {
            tracing::warn!(path = %dir.display(), "product directory already exists, overwriting");
        }
        let photos_dir = dir.join(PHOTOS_DIR);
        fs::create_dir_all(&photos_dir)?;

        let info = ProductInfo {
            name: name.to_string(),
            brand: brand.to_string(),
            price: request.price,
            sizes,
            category: category.to_string(),
            url: request.url.trim().to_string(),
        };
        write_info(&dir, &info)?;

        for (descriptor, upload) in photos::assign_bulk(&slug, &request.photos) {
            let path = photos_dir.join(descriptor.file_name());
            fs::write(&path, &upload.file.content)?;
            tracing::debug!(path = %path.display(), "wrote photo");
        }
        tracing::info!(brand, slug = %slug, "created product");

        let product = load_product(brand, dir);
        Ok(self.saved(product))
    }

    /// Replace a product's metadata, renaming its directory when the new
    /// name derives a different slug.
    ///
    /// The rename happens first and fails with [`CatalogError::AlreadyExists`]
    /// if the target slug is taken, leaving everything untouched. The
    /// metadata is then written at the final location; if that write fails
    /// the rename stays committed.
    pub fn update_product(
        &self,
        brand: &str,
        product_dir: &Path,
        update: ProductUpdate,
    ) -> Result<Saved<Product>, CatalogError> {
        let mut missing = Vec::new();
        let name = update.name.trim();
        if name.is_empty() {
            missing.push("name".to_string());
        }
        if !is_valid_price(update.price) {
            missing.push("price".to_string());
        }
        let sizes = clean_sizes(&update.sizes);
        if sizes.is_empty() {
            missing.push("sizes".to_string());
        }
        let category = update.category.trim();
        if category.is_empty() {
            missing.push("category".to_string());
        }
        if !missing.is_empty() {
            return Err(CatalogError::Validation(missing));
        }

        ensure_safe_brand(&self.layout, brand)?;
        let (owner, current_slug) = self.locate_product(product_dir)?;
        if owner != brand {
            tracing::warn!(brand, owner = %owner, "product belongs to another brand");
            return Err(CatalogError::Security(product_dir.to_path_buf()));
        }
        let product_dir = self.layout.product_dir(brand, &current_slug);

        let new_slug = derive_slug(name);
        let final_dir = if new_slug == current_slug {
            product_dir
        } else {
            let target = self.layout.product_dir(brand, &new_slug);
            if target.exists() {
                return Err(CatalogError::AlreadyExists {
                    brand: brand.to_string(),
                    slug: new_slug,
                });
            }
            fs::rename(&product_dir, &target)?;
            tracing::info!(brand, from = %current_slug, to = %new_slug, "renamed product");
            target
        };

        let info = ProductInfo {
            name: name.to_string(),
            brand: brand.to_string(),
            price: update.price,
            sizes,
            category: category.to_string(),
            url: update.url.trim().to_string(),
        };
        write_info(&final_dir, &info)?;

        let product = load_product(brand, final_dir);
        Ok(self.saved(product))
    }

    /// Recursively remove a product directory.
    ///
    /// Refused unless the path resolves strictly inside the products root.
    /// The resolved path is what gets removed, and is returned. Removal is
    /// best-effort; a directory that is already gone is fine.
    pub fn delete_product(&self, product_dir: &Path) -> Result<Saved<PathBuf>, CatalogError> {
        let target = self.resolve_inside_products(product_dir)?;

        match fs::remove_dir_all(&target) {
            Ok(()) => tracing::info!(path = %target.display(), "deleted product"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %target.display(), error = %e, "product only partly deleted")
            }
        }

        Ok(self.saved(target))
    }

    /// Remove a single photo. Missing files and non-`.jpg` paths are left
    /// alone; the returned value says whether a file was removed.
    pub fn delete_photo(&self, photo_path: &Path) -> Result<Saved<bool>, CatalogError> {
        let photo_path = self.resolve_inside_products(photo_path)?;

        let is_photo = photo_path.is_file()
            && photo_path
                .extension()
                .is_some_and(|e| e.to_string_lossy().to_lowercase() == PHOTO_EXTENSION);
        if !is_photo {
            return Ok(Saved {
                value: false,
                index: None,
            });
        }

        match fs::remove_file(&photo_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Saved {
                    value: false,
                    index: None,
                });
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(path = %photo_path.display(), "deleted photo");
        Ok(self.saved(true))
    }

    /// Append photos after the highest existing index. Existing photos and
    /// the featured tag are not touched.
    pub fn add_photos(
        &self,
        product_dir: &Path,
        files: &[UploadedFile],
    ) -> Result<Saved<Vec<PathBuf>>, CatalogError> {
        if files.is_empty() {
            return Err(CatalogError::Validation(vec!["photos".to_string()]));
        }
        let (brand, slug) = self.locate_product(product_dir)?;
        let product_dir = self.layout.product_dir(&brand, &slug);
        for file in files {
            ensure_accepted(file)?;
        }

        let photos_dir = product_dir.join(PHOTOS_DIR);
        fs::create_dir_all(&photos_dir)?;
        let existing = photo_names(&photos_dir);
        let start = photos::next_index(existing.iter().map(String::as_str));

        let mut saved = Vec::with_capacity(files.len());
        for (descriptor, file) in photos::assign_appended(&slug, start, files) {
            let path = photos_dir.join(descriptor.file_name());
            fs::write(&path, &file.content)?;
            tracing::debug!(path = %path.display(), "wrote photo");
            saved.push(path);
        }

        Ok(self.saved(saved))
    }

    /// Make `chosen` (a filename in the product's `fotos/`) the only featured
    /// photo, or clear the tag when `chosen` is `None`.
    pub fn set_featured_photo(
        &self,
        product_dir: &Path,
        chosen: Option<&str>,
    ) -> Result<Saved<Vec<PathBuf>>, CatalogError> {
        let (brand, slug) = self.locate_product(product_dir)?;
        let photos_dir = self.layout.product_dir(&brand, &slug).join(PHOTOS_DIR);
        let current = photo_paths(&photos_dir);

        let chosen_path = match chosen {
            Some(name) => {
                let path = photos_dir.join(name);
                if !current.contains(&path) {
                    return Err(CatalogError::NotFound(path));
                }
                Some(path)
            }
            None => None,
        };

        let updated = photos::retag_featured(&current, chosen_path.as_deref())?;
        Ok(self.saved(updated))
    }

    /// Store a brand logo as `logos/<brand>.png`.
    ///
    /// The extension of `original_filename` must be an accepted upload
    /// format. The bytes are written unchanged; only the name says PNG.
    pub fn save_logo(
        &self,
        brand: &str,
        bytes: &[u8],
        original_filename: &str,
    ) -> Result<Saved<PathBuf>, CatalogError> {
        let brand = brand.trim();
        if brand.is_empty() {
            return Err(CatalogError::Validation(vec!["brand".to_string()]));
        }
        ensure_safe_brand(&self.layout, brand)?;
        if !is_accepted_upload(original_filename) {
            return Err(unsupported(original_filename));
        }

        fs::create_dir_all(self.layout.logos_dir())?;
        let path = self.layout.logo_path(brand);
        fs::write(&path, bytes)?;
        tracing::info!(brand, path = %path.display(), "saved logo");

        Ok(self.saved(path))
    }

    /// Run index regeneration on demand.
    pub fn regenerate_index(&self) -> IndexReport {
        let report = IndexReport::from_result(self.notifier.regenerate());
        if !report.is_ok() {
            tracing::warn!("{report}");
        }
        report
    }

    fn saved<T>(&self, value: T) -> Saved<T> {
        Saved {
            value,
            index: Some(self.regenerate_index()),
        }
    }

    /// Resolve `path` and check that it lies strictly inside the products
    /// root. Mutations must use the returned path, not the caller's.
    fn resolve_inside_products(&self, path: &Path) -> Result<PathBuf, CatalogError> {
        let root = resolve_lenient(&self.layout.products_dir())?;
        let target = resolve_lenient(path)?;
        if target != root && target.starts_with(&root) {
            Ok(target)
        } else {
            tracing::warn!(path = %path.display(), "refusing path outside the products root");
            Err(CatalogError::Security(path.to_path_buf()))
        }
    }

    /// Brand and slug of an existing product directory.
    ///
    /// The resolved path must sit exactly at `<products>/<brand>/<slug>`;
    /// brand directories and anything deeper are refused. Since the resolved
    /// path has no symlinks left, `layout.product_dir(brand, slug)` names the
    /// same directory.
    fn locate_product(&self, product_dir: &Path) -> Result<(String, String), CatalogError> {
        let root = resolve_lenient(&self.layout.products_dir())?;
        let target = self.resolve_inside_products(product_dir)?;
        let refused = || CatalogError::Security(product_dir.to_path_buf());

        let relative = target.strip_prefix(&root).map_err(|_| refused())?;
        let mut parts = relative.components();
        let (brand, slug) = match (parts.next(), parts.next(), parts.next()) {
            (Some(Component::Normal(brand)), Some(Component::Normal(slug)), None) => (
                brand.to_string_lossy().to_string(),
                slug.to_string_lossy().to_string(),
            ),
            _ => {
                tracing::warn!(path = %product_dir.display(), "not a product directory");
                return Err(refused());
            }
        };
        if !target.is_dir() {
            return Err(CatalogError::NotFound(product_dir.to_path_buf()));
        }
        Ok((brand, slug))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Non-hidden direct children of `dir`, sorted. Missing directories yield
/// nothing.
fn child_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| !n.to_string_lossy().starts_with('.'))
        })
        .collect();
    entries.sort();
    entries
}

/// Stored photos of a product: `.jpg` files directly in `fotos/`, sorted.
fn photo_paths(photos_dir: &Path) -> Vec<PathBuf> {
    child_entries(photos_dir)
        .into_iter()
        .filter(|p| {
            p.is_file() && p.extension().is_some_and(|e| e == PHOTO_EXTENSION)
        })
        .collect()
}

fn photo_names(photos_dir: &Path) -> Vec<String> {
    photo_paths(photos_dir)
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect()
}

fn load_product(brand: &str, dir: PathBuf) -> Product {
    let record = InfoRecord::read(&dir.join(INFO_FILENAME));
    if let InfoRecord::Unreadable(reason) = &record {
        tracing::warn!(path = %dir.display(), %reason, "unreadable info.json, using empty metadata");
    }
    Product {
        brand: brand.to_string(),
        slug: dir_name(&dir),
        photos: photo_paths(&dir.join(PHOTOS_DIR)),
        info: record.into_info(),
        dir,
    }
}

fn write_info(dir: &Path, info: &ProductInfo) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(info)?;
    fs::write(dir.join(INFO_FILENAME), json)?;
    Ok(())
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_valid_price(price: Option<f64>) -> bool {
    price.is_some_and(|p| p.is_finite() && p > 0.0)
}

/// Trimmed, non-empty sizes in their given order.
fn clean_sizes(sizes: &[String]) -> Vec<String> {
    sizes
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn ensure_safe_brand(layout: &CatalogLayout, brand: &str) -> Result<(), CatalogError> {
    if is_safe_component(brand) {
        Ok(())
    } else {
        Err(CatalogError::Security(layout.products_dir().join(brand)))
    }
}

fn ensure_accepted(file: &UploadedFile) -> Result<(), CatalogError> {
    if is_accepted_upload(&file.name) {
        Ok(())
    } else {
        Err(unsupported(&file.name))
    }
}

fn unsupported(filename: &str) -> CatalogError {
    let label = upload_extension(filename)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| filename.to_string());
    CatalogError::UnsupportedFormat(label)
}

/// Absolute form of `path` resolved the way the OS walks it: one component
/// at a time, each symlink replaced by its target before a following `..`
/// is applied. Components that don't exist are kept as written, so the path
/// itself need not exist.
fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => {
                resolved.push(other.as_os_str());
                let is_link = fs::symlink_metadata(&resolved)
                    .is_ok_and(|m| m.file_type().is_symlink());
                if is_link {
                    resolved = resolved.canonicalize()?;
                }
            }
        }
    }
    Ok(resolved)
}
