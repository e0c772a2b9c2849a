//! Document store collaborator
//!
//! The sync engine only ever talks to the tree through [`DocumentStore`].
//! [`NotionClient`] is the production implementation; [`InMemoryStore`] backs
//! the tests and records every mutation it receives.

pub mod error;
pub mod memory;
pub mod model;
pub mod notion;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, Mutation};
pub use model::{BlockKind, NewBlock, Node, TextRun};
pub use notion::NotionClient;

use async_trait::async_trait;

/// Read and write access to a tree of pages and blocks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Plain text of a page's title.
    async fn get_title(&self, page_id: &str) -> StoreResult<String>;

    /// Replace a page's title with a single plain run.
    async fn set_title(&self, page_id: &str, title: &str) -> StoreResult<()>;

    /// Direct children of a page or block, in order. Pagination is handled
    /// by the implementation; callers always get the full list.
    async fn get_children(&self, node_id: &str) -> StoreResult<Vec<Node>>;

    /// Persist `node.runs` as the node's rich text.
    async fn update_node(&self, node: &Node) -> StoreResult<()>;

    async fn delete_node(&self, node_id: &str) -> StoreResult<()>;

    /// Append blocks after the parent's existing children.
    async fn append_children(&self, parent_id: &str, blocks: &[NewBlock]) -> StoreResult<()>;
}
