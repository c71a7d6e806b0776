//! # Catalog Admin
//!
//! Administration tool for a filesystem-backed product catalog. The
//! directory tree is the database: brands are directories and logo files,
//! products are directories holding an `info.json` record and a `fotos/`
//! folder, and photo order and the featured shot live in the filenames.
//!
//! ```text
//! assets/
//! ├── logos/<brand>.png
//! └── productos/<brand>/<SLUG>/
//!     ├── info.json
//!     └── fotos/NN_<base>[_solo].jpg
//! ```
//!
//! After every change the catalog asks a [`notify::Notifier`] to rebuild the
//! downstream index files (by default two Node scripts). A failed rebuild is
//! reported to the operator and never undoes the change.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | The catalog: list, create, update, delete products; photos; logos |
//! | [`photos`] | `NN_<base>[_solo].jpg` filename convention: indices and the featured tag |
//! | [`naming`] | Slug derivation, upload name sanitizing, accepted formats |
//! | [`notify`] | Index regeneration through external scripts |
//! | [`config`] | `catalog.toml` loading, merging, and validation |
//! | [`types`] | Requests and records shared by the operations (`ProductInfo`, `NewProduct`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Database, No Locks
//!
//! The catalog is consumed by a static site generator that reads the same
//! tree, so the tree itself is the only source of truth. Operations are
//! short sequences of file writes and renames with no locking; the tool is
//! meant for a single operator.
//!
//! ## Tolerant Reads
//!
//! Hand-edited or half-written `info.json` files load as empty metadata
//! rather than failing the listing. The product stays visible and can be
//! repaired by editing it.
//!
//! ## Stable Slugs
//!
//! A product's directory name is derived from its name once, at creation.
//! Editing the name renames the directory only when the derived slug
//! changes, and never onto an existing product.

pub mod config;
pub mod naming;
pub mod notify;
pub mod output;
pub mod photos;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
