pub mod providers;
pub mod recommendations;
pub mod scoring;
pub mod snapshot_writer;

pub use recommendations::{normalize_limit, RecommendationService, RecommendationSettings};
pub use snapshot_writer::{SnapshotWriter, SnapshotWriterHandle};
