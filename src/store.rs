mod client;
mod memory;

pub use client::{Document, DocumentStore, HttpStore, StoreError};
pub use memory::MemoryStore;

/// Collection holding the point markers.
pub const MARKER_COLLECTION: &str = "markers";
/// Collection holding the drawn vector features.
pub const FEATURE_COLLECTION: &str = "features";
