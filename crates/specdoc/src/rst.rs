//! reStructuredText documentation.
//!
//! The [`RstGenerator`] walks the catalog and builds a [`DocumentSection`]
//! tree; [`emit`] renders the tree to text. Included types are linked with
//! `:ref:` cross-references instead of being expanded, so dense or cyclic
//! composition never grows a document beyond one section per type.
//!
//! # Example
//!
//! ```
//! # use specdoc::rst::{Block, DocumentSection, HeadingLevel, Property, emit};
//! let mut section = DocumentSection::new("Types", HeadingLevel::Section);
//! section.push(Block::PropertyList(vec![Property::text("Name", "core")]));
//! assert_eq!(emit(&section), "Types\n=====\n\n* **Name:** core\n");
//! ```

mod document;
mod emit;
mod generator;
mod table;
mod text;

pub use document::{
    Block, BulletItem, DocumentSection, HeadingLevel, Property, PropertyValue, literal, reference,
    section_label,
};
pub use emit::emit;
pub use generator::{Generated, RstGenerator};
pub use table::GridTable;
pub use text::clean_doc;
