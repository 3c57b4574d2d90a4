//! Tag extraction and normalization
//!
//! - [`document`]: decoded-document lookup abstraction
//! - [`reader`]: typed attribute reads with defaults
//! - [`orientation`]: plane classification
//! - [`normalizer`]: composes the above into a [`CanonicalRecord`](crate::domain::CanonicalRecord)

pub mod document;
pub mod normalizer;
pub mod orientation;
pub mod reader;

pub use document::{Attribute, AttributeSource, TagDocument};
pub use normalizer::{normalize_document, RecordNormalizer};
pub use orientation::{classify_plane, major_axis, Direction};
pub use reader::{read_attribute, read_or_default, AttributeDefault};
