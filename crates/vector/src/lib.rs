//! Theory Explorer vector index
//!
//! Embeds theory records, keeps them in insertion order, persists them as a
//! single JSON snapshot and answers exact cosine top-k queries.

mod engine;
mod index;
mod persistence;
mod seed;
mod similarity;
mod types;

pub use engine::TheoryStore;
pub use index::VectorIndex;
pub use persistence::{load_items, save_items, DEFAULT_STORE_FILE};
pub use seed::{load_seed_file, theory_to_text, FIELD_DELIMITER};
pub use similarity::{cosine_similarity, COSINE_EPSILON};
pub use types::{Item, Meta, SearchResult, StoreStats, StoreStatus, TheoryRecord};
