//! CLI output formatting for catalog commands.
//!
//! # Information-First Display
//!
//! The primary display for every entity (brand, product, photo) is its
//! semantic identity: positional index plus display name. Directory and file
//! names follow as indented context lines so the operator can still find
//! things on disk.
//!
//! # Output Format
//!
//! ## Brands
//!
//! ```text
//! Brands
//! 001 Acme
//! 002 Bravo (no logo)
//! ```
//!
//! ## Products
//!
//! ```text
//! Acme (2 products)
//! 001 Blue Shirt (2 photos)
//!     Source: BLUE_SHIRT/
//!     Price: 19.99
//! 002 LINEN_PANTS (0 photos)
//!     Source: LINEN_PANTS/
//!     Price: -
//! ```
//!
//! ## Product
//!
//! ```text
//! Blue Shirt
//!     Brand: Acme
//!     Source: BLUE_SHIRT/
//!     Price: 19.99
//!     Sizes: S, M
//!     Category: Shirts
//!     URL: -
//! Photos
//!     001 01_front.jpg
//!     002 02_back_solo.jpg (featured)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::notify::IndexReport;
use crate::photos::PhotoDescriptor;
use crate::types::Product;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format a price with two decimals, `-` when unset.
fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{:.2}", p),
        None => "-".to_string(),
    }
}

/// A metadata value, `-` when blank.
fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Brands
// ============================================================================

/// Format the brand list. `has_logo` tells which brands have a stored logo.
pub fn format_brands(brands: &[String], has_logo: impl Fn(&str) -> bool) -> Vec<String> {
    let mut lines = vec!["Brands".to_string()];
    if brands.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (i, brand) in brands.iter().enumerate() {
        let marker = if has_logo(brand) { "" } else { " (no logo)" };
        lines.push(format!("{} {}{}", format_index(i + 1), brand, marker));
    }
    lines
}

pub fn print_brands(brands: &[String], has_logo: impl Fn(&str) -> bool) {
    for line in format_brands(brands, has_logo) {
        println!("{}", line);
    }
}

// ============================================================================
// Products
// ============================================================================

/// Format the products of one brand.
pub fn format_products(brand: &str, products: &[Product]) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", brand, plural(products.len(), "product"))];
    for (i, product) in products.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            product.display_name(),
            plural(product.photos.len(), "photo")
        ));
        lines.push(format!("    Source: {}/", product.slug));
        lines.push(format!("    Price: {}", format_price(product.info.price)));
    }
    lines
}

pub fn print_products(brand: &str, products: &[Product]) {
    for line in format_products(brand, products) {
        println!("{}", line);
    }
}

/// Format a single product with its metadata and photos.
pub fn format_product(product: &Product) -> Vec<String> {
    let info = &product.info;
    let mut lines = vec![
        product.display_name().to_string(),
        format!("    Brand: {}", product.brand),
        format!("    Source: {}/", product.slug),
        format!("    Price: {}", format_price(info.price)),
        format!("    Sizes: {}", or_dash(&info.sizes.join(", "))),
        format!("    Category: {}", or_dash(&info.category)),
        format!("    URL: {}", or_dash(&info.url)),
    ];
    lines.extend(format_photos(&product.photos));
    lines
}

pub fn print_product(product: &Product) {
    for line in format_product(product) {
        println!("{}", line);
    }
}

/// Format a photo list, flagging the featured one.
pub fn format_photos(photos: &[impl AsRef<Path>]) -> Vec<String> {
    let mut lines = vec!["Photos".to_string()];
    if photos.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (i, photo) in photos.iter().enumerate() {
        let name = file_name(photo.as_ref());
        let featured = PhotoDescriptor::parse(&name).is_some_and(|d| d.featured);
        let marker = if featured { " (featured)" } else { "" };
        lines.push(format!("    {} {}{}", format_index(i + 1), name, marker));
    }
    lines
}

pub fn print_photos(photos: &[impl AsRef<Path>]) {
    for line in format_photos(photos) {
        println!("{}", line);
    }
}

// ============================================================================
// Sizes
// ============================================================================

pub fn format_sizes(sizes: &[String]) -> Vec<String> {
    let mut lines = vec!["Sizes".to_string()];
    lines.extend(sizes.iter().map(|s| format!("    {}", s)));
    lines
}

pub fn print_sizes(sizes: &[String]) {
    for line in format_sizes(sizes) {
        println!("{}", line);
    }
}

// ============================================================================
// Index regeneration
// ============================================================================

/// Format an index regeneration report.
///
/// The captured step output is shown when regeneration did not succeed, or
/// always with `verbose`.
pub fn format_index_report(report: &IndexReport, verbose: bool) -> Vec<String> {
    let mut lines = vec![report.to_string()];
    if verbose || !report.is_ok() {
        lines.extend(
            report
                .log()
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| format!("    {}", l)),
        );
    }
    lines
}

/// Print an index report; warnings go to stderr.
pub fn print_index_report(report: &IndexReport, verbose: bool) {
    for line in format_index_report(report, verbose) {
        if report.is_ok() {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
