pub mod config;
pub mod mt;
pub mod store;
pub mod sync;

// Re-export the types needed to wire up a run
pub use config::{Credentials, Mode, RunConfig, page_id_from_url};
pub use mt::{GoogleTranslateProvider, MockMode, MockTranslator, MtError, TextTranslator};
pub use store::{DocumentStore, InMemoryStore, NotionClient, StoreError};
pub use sync::{PassReport, SyncError, Synchronizer};
