pub mod classify;
pub mod compose;
pub mod error;
pub mod extract;
pub mod locate;
pub mod prompts;
pub mod retrieve;
pub mod router;
pub mod scope;
pub mod types;

pub use classify::{Classification, IntentClassifier};
pub use compose::{select_top_part, CompatibilityVerdict, ResponseComposer};
pub use error::{LocatorTarget, MissingField, PipelineError, Stage};
pub use extract::EntityExtractor;
pub use locate::EvidenceLocator;
pub use retrieve::{ContentRetriever, PageShape};
pub use router::QueryRouter;
pub use types::{ApplianceType, ChatOutcome, EntitySet, Intent, OutcomeStatus, Query};
