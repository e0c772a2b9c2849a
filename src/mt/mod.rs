/// Machine Translation Module
///
/// The text-translator collaborator used by the sync engine: a provider trait,
/// the Google Translate v2 implementation and a deterministic mock.
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod translator;

pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use translator::TextTranslator;
