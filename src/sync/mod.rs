//! Translation sync engine
//!
//! 1. **Marking** - the completion marker and the two marked-text layouts
//! 2. **Classifier** - which handling a block kind gets
//! 3. **Reconciler** - the create/revert state machine for one node
//! 4. **Driver** - breadth-first collection, passes and the polling loop
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use notion_translate::{GoogleTranslateProvider, NotionClient, RunConfig, Synchronizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = NotionClient::new("secret_...")?;
//!     let translator = GoogleTranslateProvider::from_env()?;
//!     let config = RunConfig::create(Some("en".into()), Some("ko".into())).with_subpages(true);
//!
//!     let sync = Synchronizer::new(Arc::new(store), Arc::new(translator), config);
//!     let report = sync.run_once("0123456789abcdef0123456789abcdef").await?;
//!     println!("{} nodes changed", report.changed());
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod driver;
pub mod engine;
pub mod error;
pub mod marking;


pub use classify::{Handling, classify};
pub use driver::{PassReport, Synchronizer, collect};
pub use engine::{Outcome, Reconciler, SkipReason};
pub use error::{SyncError, SyncResult};
pub use marking::{COMPLETION_MARK, MAX_TEXT_LENGTH, MarkState};
