//! Semantic index over scraped evidence.
//!
//! - `FragmentEngine`: splits documents into category-tagged fragments
//! - `FragmentStore`: storage seam, with an in-memory implementation
//! - `SemanticIndex`: embeds, writes and queries fragments by intent

mod engine;
pub mod index;
pub mod memory;
pub mod store;

pub use engine::FragmentEngine;
pub use index::{category_for_intent, IndexHits, IndexWrite, SemanticIndex};
pub use memory::InMemoryFragmentStore;
pub use store::{FragmentCategory, FragmentFilter, FragmentStore, IndexedFragment, ScoredFragment};
