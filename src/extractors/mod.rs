// src/extractors/mod.rs
pub mod headers;
pub mod ids;
pub mod record;
pub mod sections;

// Re-export key extraction types for convenience
pub use headers::{compute_top_k, HeaderCounts, SectionConfig, TopHeaderSet};
pub use ids::extract_ids;
pub use record::parse_record_page;
pub use sections::{extract_sections, section_column_name, SectionMap};
