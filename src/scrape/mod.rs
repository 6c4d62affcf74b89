pub mod client;
pub mod pool;
pub mod types;

pub use client::{HttpScrapeClient, ScrapeClient};
pub use pool::ScraperPool;
pub use types::{CompatibilityEntry, EvidenceDocument, PartRecord, QnaPair, UserStory};
