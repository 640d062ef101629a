//! Loading and normalization of HDMF/NWB format specifications.
//!
//! The crate reads namespace files and the schema source files they list
//! into a [`SpecCatalog`]: one read-only, fully resolved graph of type
//! definitions shared by every documentation renderer.
//!
//! ```
//! use std::path::PathBuf;
//!
//! use specdoc_schema::{CatalogOptions, InMemory, TypeKey, load_catalog};
//!
//! let files = InMemory::new()
//!     .with_file(
//!         "core.namespace.yaml",
//!         "namespaces:\n- name: core\n  schema:\n  - source: core.base.yaml\n",
//!     )
//!     .with_file(
//!         "core.base.yaml",
//!         "groups:\n- data_type_def: Child\n  data_type_inc: Parent\n- data_type_def: Parent\n",
//!     );
//!
//! let normalized = load_catalog(
//!     &files,
//!     &[PathBuf::from("core.namespace.yaml")],
//!     &CatalogOptions::default(),
//! )
//! .unwrap();
//!
//! let child = TypeKey::new("core", "Child");
//! assert_eq!(normalized.catalog.ancestors(&child)[0].key.name(), "Parent");
//! ```

use std::path::PathBuf;

mod catalog;
pub mod error;
mod loader;
pub mod model;
mod raw;
mod span;

pub use catalog::{CatalogOptions, Normalized, SpecCatalog};
pub use loader::{FileSystem, InMemory, LoadedSpecs, SpecSource, load};
pub use model::{
    CompoundField, DataType, FieldEntry, Namespace, NodeKind, Quantity, SourceSection, TypeKey,
    TypeNode, TypeRef,
};
pub use span::Span;

/// Load the namespace files and normalize them in one step.
pub fn load_catalog<S: SpecSource + ?Sized>(
    source: &S,
    namespace_files: &[PathBuf],
    options: &CatalogOptions,
) -> Result<Normalized, error::LoadError> {
    let specs = load(source, namespace_files)?;
    SpecCatalog::build(specs, options)
}
