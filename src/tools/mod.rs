pub mod search;
pub mod vector_math;

pub use search::{GoogleSearchProvider, SearchProvider, SearchResult};
