//! Per-sample processing pipeline: hashing, EXIF extraction, media
//! transforms, the bounded scheduler, and the sample processor that ties them
//! together.

pub mod exif;
pub mod hash;
pub mod processor;
pub mod scheduler;
pub mod transform;

// Re-exports for convenient access
pub use exif::extract_exif;
pub use hash::HashAlgorithm;
pub use processor::{ColumnIndices, SampleProcessor};
pub use scheduler::BoundedScheduler;
pub use transform::{MediaTransform, PassthroughTransform, TransformedImage};
