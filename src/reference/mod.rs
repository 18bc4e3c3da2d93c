//! Reference Data Module
//!
//! Named reference sets (varieties, products, equipment, ...) served from the
//! local cache and refreshed from a remote source.

mod catalog;

pub use catalog::{ReferenceCatalog, ReferenceSource};
