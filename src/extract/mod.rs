pub mod counts;
pub mod orchestrator;
pub mod overlay;
pub mod relocate;
pub mod scoped;
pub mod trending;

pub use counts::parse_count;
pub use orchestrator::ExtractionOrchestrator;
pub use overlay::{DetailFields, DetailOutcome, OverlayNavigator};
pub use relocate::{canonical_key, ListRelocator};
pub use scoped::{ExtractedRecord, FieldKind, FieldSpec, FieldValue, ScopedExtractor};
pub use trending::TrendingScraper;
