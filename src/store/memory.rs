//! In-memory document store
//!
//! Holds a page/block tree in a mutex and logs every write as a [`Mutation`],
//! so tests can assert both the final tree and the exact calls that got it
//! there. Ids of appended blocks are `mem-1`, `mem-2`, ...

use crate::store::error::{StoreError, StoreResult};
use crate::store::model::{NewBlock, Node};
use crate::store::DocumentStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A write received by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetTitle { page_id: String, title: String },
    Update { node_id: String, text: String },
    Delete { node_id: String },
    Append { parent_id: String, texts: Vec<String> },
}

#[derive(Debug, Default)]
struct Tree {
    titles: HashMap<String, String>,
    children: HashMap<String, Vec<Node>>,
    failing: HashSet<String>,
    mutations: Vec<Mutation>,
    next_id: u64,
    reads: usize,
}

impl Tree {
    fn find_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.children
            .values_mut()
            .flat_map(|nodes| nodes.iter_mut())
            .find(|node| node.id == node_id)
    }

    fn check(&self, node_id: &str) -> StoreResult<()> {
        if self.failing.contains(node_id) {
            return Err(StoreError::ApiError {
                status: 500,
                code: "internal_server_error".to_string(),
                message: format!("simulated failure for {}", node_id),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tree: Mutex<Tree>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a page title (root page or sub-page).
    pub fn with_title(self, page_id: &str, title: &str) -> Self {
        self.lock()
            .titles
            .insert(page_id.to_string(), title.to_string());
        self
    }

    /// Seed a child under `parent_id`, after any existing children.
    pub fn with_child(self, parent_id: &str, node: Node) -> Self {
        self.insert_child(parent_id, node);
        self
    }

    pub fn insert_child(&self, parent_id: &str, mut node: Node) {
        let mut tree = self.lock();
        node.has_children = tree
            .children
            .get(&node.id)
            .is_some_and(|nodes| !nodes.is_empty());
        if let Some(parent) = tree.find_mut(parent_id) {
            parent.has_children = true;
        }
        tree.children
            .entry(parent_id.to_string())
            .or_default()
            .push(node);
    }

    /// Make every call touching `node_id` fail with a 500.
    pub fn fail_on(&self, node_id: &str) {
        self.lock().failing.insert(node_id.to_string());
    }

    pub fn title(&self, page_id: &str) -> Option<String> {
        self.lock().titles.get(page_id).cloned()
    }

    pub fn children_of(&self, parent_id: &str) -> Vec<Node> {
        self.lock()
            .children
            .get(parent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn node(&self, node_id: &str) -> Option<Node> {
        self.lock().find_mut(node_id).map(|node| node.clone())
    }

    /// Simulate a user edit: replace a node's text and bump its edit time.
    pub fn edit_text(&self, node_id: &str, text: &str) {
        let mut tree = self.lock();
        if let Some(node) = tree.find_mut(node_id) {
            node.runs = vec![crate::store::TextRun::plain(text)];
            node.last_edited_time = Utc::now();
        }
    }

    /// Number of `get_children` calls served.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.lock().mutations.clear();
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_title(&self, page_id: &str) -> StoreResult<String> {
        let tree = self.lock();
        tree.check(page_id)?;
        tree.titles
            .get(page_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(page_id.to_string()))
    }

    async fn set_title(&self, page_id: &str, title: &str) -> StoreResult<()> {
        let mut tree = self.lock();
        tree.check(page_id)?;
        tree.titles.insert(page_id.to_string(), title.to_string());
        tree.mutations.push(Mutation::SetTitle {
            page_id: page_id.to_string(),
            title: title.to_string(),
        });
        Ok(())
    }

    async fn get_children(&self, node_id: &str) -> StoreResult<Vec<Node>> {
        let mut tree = self.lock();
        tree.reads += 1;
        tree.check(node_id)?;
        Ok(tree.children.get(node_id).cloned().unwrap_or_default())
    }

    async fn update_node(&self, node: &Node) -> StoreResult<()> {
        let mut tree = self.lock();
        tree.check(&node.id)?;
        let stored = tree
            .find_mut(&node.id)
            .ok_or_else(|| StoreError::NotFound(node.id.clone()))?;
        stored.runs = node.runs.clone();
        stored.last_edited_time = Utc::now();
        let text = stored.plain_text();
        tree.mutations.push(Mutation::Update {
            node_id: node.id.clone(),
            text,
        });
        Ok(())
    }

    async fn delete_node(&self, node_id: &str) -> StoreResult<()> {
        let mut tree = self.lock();
        tree.check(node_id)?;
        let mut found = false;
        for nodes in tree.children.values_mut() {
            let before = nodes.len();
            nodes.retain(|node| node.id != node_id);
            found |= nodes.len() != before;
        }
        if !found {
            return Err(StoreError::NotFound(node_id.to_string()));
        }
        tree.children.remove(node_id);
        tree.mutations.push(Mutation::Delete {
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    async fn append_children(&self, parent_id: &str, blocks: &[NewBlock]) -> StoreResult<()> {
        let mut tree = self.lock();
        tree.check(parent_id)?;
        let mut appended = Vec::with_capacity(blocks.len());
        for block in blocks {
            tree.next_id += 1;
            let node = Node::new(
                format!("mem-{}", tree.next_id),
                block.kind.clone(),
                block.runs.clone(),
            );
            appended.push(node);
        }
        let texts = appended.iter().map(Node::plain_text).collect();
        if let Some(parent) = tree.find_mut(parent_id) {
            parent.has_children = true;
        }
        tree.children
            .entry(parent_id.to_string())
            .or_default()
            .extend(appended);
        tree.mutations.push(Mutation::Append {
            parent_id: parent_id.to_string(),
            texts,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::model::{BlockKind, TextRun};

    #[tokio::test]
    async fn test_append_then_list_children() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "Hello"));
        store
            .append_children("p1", &[NewBlock::text_block(BlockKind::Paragraph, "Hola")])
            .await
            .unwrap();

        let children = store.get_children("p1").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "mem-1");
        assert_eq!(children[0].plain_text(), "Hola");
        assert!(store.node("p1").unwrap().has_children);
        assert_eq!(
            store.mutations(),
            vec![Mutation::Append {
                parent_id: "p1".to_string(),
                texts: vec!["Hola".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "a"));
        let mut node = store.node("p1").unwrap();
        node.runs.push(TextRun::plain("b"));
        store.update_node(&node).await.unwrap();
        assert_eq!(store.node("p1").unwrap().plain_text(), "ab");

        store.delete_node("p1").await.unwrap();
        assert!(store.node("p1").is_none());
        assert!(matches!(
            store.delete_node("p1").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_title_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.get_title("nope").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_on_injects_api_error() {
        let store = InMemoryStore::new().with_title("page", "Title");
        store.fail_on("page");
        assert!(matches!(
            store.get_title("page").await,
            Err(StoreError::ApiError { status: 500, .. })
        ));
        assert!(store.mutations().is_empty());
    }
}
