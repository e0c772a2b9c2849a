//! Per-node reconciliation
//!
//! Each node is brought to the state the run mode asks for, using only what is
//! persisted in the store: the completion marker says whether a translation
//! exists, and a translation child's embedded length says whether it is still
//! current. Nothing is cached between nodes.
//!
//! # Invariants
//! - Original text is never modified in create mode; only appended to (inline)
//!   or prefixed in the title.
//! - After a create pass over a container node, it has at most one marked child.
//! - A node whose trimmed text is empty is never written.
//!
//! The length fingerprint cannot tell apart two sources of equal length. An
//! edit that keeps the character count is not re-translated.

use crate::config::{Mode, RunConfig};
use crate::mt::TextTranslator;
use crate::store::{DocumentStore, NewBlock, Node, TextRun};
use crate::sync::classify::{Handling, classify};
use crate::sync::error::SyncResult;
use crate::sync::marking::{
    self, MAX_TEXT_LENGTH, MarkState, build_container_mark, build_create_mark, has_mark,
    mark_state, parse_container_mark, sanitize_translation, split_revert, text_length,
    truncate_chars,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// What reconciling one node did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A translation was written where there was none.
    Created,
    /// An outdated translation child was rewritten in place.
    Refreshed,
    /// Translations were removed and the original restored.
    Reverted,
    /// Already in the requested state.
    Unchanged,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Trimmed text is empty.
    Empty,
    /// Edited before the realtime window.
    Stale,
    /// Kind carries no translatable text.
    Unsupported,
}

/// Applies the run mode to individual nodes.
pub struct Reconciler<'a> {
    store: &'a dyn DocumentStore,
    translator: &'a dyn TextTranslator,
    config: &'a RunConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        translator: &'a dyn TextTranslator,
        config: &'a RunConfig,
    ) -> Self {
        Self {
            store,
            translator,
            config,
        }
    }

    /// Reconcile a collected node, dispatching on its kind.
    pub async fn reconcile_node(&self, node: &Node, now: DateTime<Utc>) -> SyncResult<Outcome> {
        let handling = classify(&node.kind);
        if handling == Handling::Skip {
            return Ok(Outcome::Skipped(SkipReason::Unsupported));
        }
        if self.is_stale(node, now) {
            debug!(node_id = %node.id, "skipping node outside the realtime window");
            return Ok(Outcome::Skipped(SkipReason::Stale));
        }

        match handling {
            Handling::Title => self.reconcile_title(&node.id).await,
            Handling::Inline => self.reconcile_inline(node).await,
            Handling::Container => self.reconcile_container(node).await,
            Handling::Skip => Ok(Outcome::Skipped(SkipReason::Unsupported)),
        }
    }

    /// Reconcile a page title (root page or sub-page).
    pub async fn reconcile_title(&self, page_id: &str) -> SyncResult<Outcome> {
        let title = self.store.get_title(page_id).await?;
        let source = title.trim();
        if source.is_empty() {
            return Ok(Outcome::Skipped(SkipReason::Empty));
        }

        match &self.config.mode {
            Mode::Create { .. } => {
                if mark_state(source) == MarkState::Translated {
                    return Ok(Outcome::Unchanged);
                }
                let translated = self.translate(source).await?;
                let marked = build_create_mark(&translated, source);
                self.store.set_title(page_id, &marked).await?;
                debug!(page_id, title = %marked, "title translated");
                Ok(Outcome::Created)
            }
            Mode::Revert => match split_revert(source) {
                Some(original) => {
                    self.store.set_title(page_id, &original).await?;
                    debug!(page_id, title = %original, "title restored");
                    Ok(Outcome::Reverted)
                }
                None => Ok(Outcome::Unchanged),
            },
        }
    }

    async fn reconcile_inline(&self, node: &Node) -> SyncResult<Outcome> {
        let text = node.plain_text();
        let source = text.trim();
        if source.is_empty() {
            return Ok(Outcome::Skipped(SkipReason::Empty));
        }

        match &self.config.mode {
            Mode::Create { .. } => {
                if has_mark(source) {
                    return Ok(Outcome::Unchanged);
                }
                let translated = sanitize_translation(&self.translate(source).await?);
                let mut updated = node.clone();
                updated.runs.push(TextRun::plain(marking::separator()));
                updated.runs.push(TextRun::plain(truncate_chars(
                    &translated,
                    MAX_TEXT_LENGTH,
                )));
                self.store.update_node(&updated).await?;
                debug!(node_id = %node.id, "inline translation appended");
                Ok(Outcome::Created)
            }
            Mode::Revert => {
                let Some(index) = node.runs.iter().position(|run| has_mark(&run.text)) else {
                    return Ok(Outcome::Unchanged);
                };
                let mut updated = node.clone();
                updated.runs.truncate(index);
                self.store.update_node(&updated).await?;
                debug!(node_id = %node.id, runs = index, "inline translation removed");
                Ok(Outcome::Reverted)
            }
        }
    }

    async fn reconcile_container(&self, node: &Node) -> SyncResult<Outcome> {
        let text = node.plain_text();
        let source = text.trim();
        if source.is_empty() {
            return Ok(Outcome::Skipped(SkipReason::Empty));
        }

        // Leaf blocks cannot hold a translation child yet.
        let children = if node.has_children {
            self.store.get_children(&node.id).await?
        } else {
            Vec::new()
        };

        match &self.config.mode {
            Mode::Create { .. } => {
                let mut candidate: Option<(Node, Option<usize>)> = None;
                for child in children {
                    let child_text = child.plain_text();
                    if !has_mark(&child_text) {
                        continue;
                    }
                    if candidate.is_none() {
                        let recorded = parse_container_mark(&child_text).map(|(_, len)| len);
                        candidate = Some((child, recorded));
                        continue;
                    }
                    match self.store.delete_node(&child.id).await {
                        Ok(()) => debug!(node_id = %child.id, "duplicate translation removed"),
                        Err(err) => warn!(
                            node_id = %child.id,
                            error = %err,
                            "failed to remove duplicate translation"
                        ),
                    }
                }

                let source_length = text_length(source);
                if let Some((_, Some(recorded))) = &candidate {
                    if *recorded == source_length {
                        return Ok(Outcome::Unchanged);
                    }
                }

                let translated = self.translate(source).await?;
                let marked = build_container_mark(&translated, source_length);

                match candidate {
                    Some((mut child, _)) => {
                        child.runs = vec![TextRun::plain(marked)];
                        self.store.update_node(&child).await?;
                        debug!(node_id = %node.id, child_id = %child.id, "translation refreshed");
                        Ok(Outcome::Refreshed)
                    }
                    None => {
                        let block = NewBlock::text_block(node.kind.clone(), marked);
                        self.store.append_children(&node.id, &[block]).await?;
                        debug!(node_id = %node.id, "translation child created");
                        Ok(Outcome::Created)
                    }
                }
            }
            Mode::Revert => {
                let mut removed = 0;
                for child in children {
                    if has_mark(&child.plain_text()) {
                        self.store.delete_node(&child.id).await?;
                        removed += 1;
                    }
                }
                if removed == 0 {
                    return Ok(Outcome::Unchanged);
                }
                debug!(node_id = %node.id, removed, "translation children removed");
                Ok(Outcome::Reverted)
            }
        }
    }

    async fn translate(&self, text: &str) -> SyncResult<String> {
        let (source, target) = self.config.languages();
        Ok(self.translator.translate(text, source, target).await?)
    }

    fn is_stale(&self, node: &Node, now: DateTime<Utc>) -> bool {
        if !(self.config.realtime && self.config.is_create()) {
            return false;
        }
        match (now - node.last_edited_time).to_std() {
            Ok(age) => age > self.config.stale_after,
            // Edited "in the future" relative to `now`: certainly recent.
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::{MockMode, MockTranslator, MtError};
    use crate::store::{BlockKind, InMemoryStore, Mutation, StoreError};
    use chrono::Duration;

    fn create_config() -> RunConfig {
        RunConfig::create(Some("en".to_string()), Some("ko".to_string()))
    }

    #[tokio::test]
    async fn test_unsupported_node_is_skipped_without_calls() {
        let store = InMemoryStore::new();
        let mock = MockTranslator::new(MockMode::Suffix);
        let config = create_config();
        let reconciler = Reconciler::new(&store, &mock, &config);

        let node = Node::with_text("d1", BlockKind::Unsupported("divider".into()), "");
        let outcome = reconciler.reconcile_node(&node, Utc::now()).await.unwrap();
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Unsupported));
        assert_eq!(mock.calls(), 0);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_title_create_and_revert() {
        let store = InMemoryStore::new().with_title("page", "  Hello  ");
        let mock = MockTranslator::new(MockMode::Suffix);

        let create = create_config();
        let outcome = Reconciler::new(&store, &mock, &create)
            .reconcile_title("page")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Created);
        assert_eq!(store.title("page").unwrap(), "Hello_ko ⚐ Hello");

        let revert = RunConfig::revert();
        let outcome = Reconciler::new(&store, &mock, &revert)
            .reconcile_title("page")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Reverted);
        assert_eq!(store.title("page").unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_title_revert_without_marker_is_noop() {
        let store = InMemoryStore::new().with_title("page", "Hello");
        let mock = MockTranslator::new(MockMode::Suffix);
        let revert = RunConfig::revert();
        let outcome = Reconciler::new(&store, &mock, &revert)
            .reconcile_title("page")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_inline_revert_restores_formatted_runs() {
        let bold = serde_json::json!({
            "type": "text",
            "text": { "content": "Intro" },
            "annotations": { "bold": true },
            "plain_text": "Intro"
        });
        let heading = Node::new(
            "h1",
            BlockKind::Heading2,
            vec![TextRun::from_raw(bold.clone()), TextRun::plain(" part")],
        );
        let store = InMemoryStore::new().with_child("page", heading.clone());
        let mock = MockTranslator::new(MockMode::Suffix);

        let create = create_config();
        Reconciler::new(&store, &mock, &create)
            .reconcile_node(&heading, Utc::now())
            .await
            .unwrap();
        let translated = store.node("h1").unwrap();
        assert_eq!(translated.plain_text(), "Intro part ⚐ Intro part_ko");

        let revert = RunConfig::revert();
        Reconciler::new(&store, &mock, &revert)
            .reconcile_node(&translated, Utc::now())
            .await
            .unwrap();
        let restored = store.node("h1").unwrap();
        assert_eq!(restored.runs.len(), 2);
        assert_eq!(restored.runs[0].to_json(), bold);
    }

    #[tokio::test]
    async fn test_container_unparsable_fingerprint_is_rewritten_in_place() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "Hello"))
            .with_child("p1", Node::with_text("c1", BlockKind::Paragraph, "Hola ⚐ ???"));
        let mock = MockTranslator::new(MockMode::Suffix);
        let config = create_config();
        let node = store.node("p1").unwrap();

        let outcome = Reconciler::new(&store, &mock, &config)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Refreshed);
        assert_eq!(
            store.mutations(),
            vec![Mutation::Update {
                node_id: "c1".to_string(),
                text: "Hello_ko ⚐ 0005".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_container_revert_removes_every_marked_child() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Quote, "Hello"))
            .with_child("p1", Node::with_text("c1", BlockKind::Quote, "Hola ⚐ 0005"))
            .with_child("p1", Node::with_text("c2", BlockKind::Quote, "user note"))
            .with_child("p1", Node::with_text("c3", BlockKind::Quote, "Hola ⚐ 0004"));
        let mock = MockTranslator::new(MockMode::Suffix);
        let config = RunConfig::revert();
        let node = store.node("p1").unwrap();

        let outcome = Reconciler::new(&store, &mock, &config)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Reverted);
        let remaining: Vec<String> = store.children_of("p1").into_iter().map(|n| n.id).collect();
        assert_eq!(remaining, vec!["c2".to_string()]);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_realtime_skips_stale_nodes_only_in_create_mode() {
        let now = Utc::now();
        let old = Node::with_text("p1", BlockKind::Paragraph, "Hello")
            .edited_at(now - Duration::minutes(6));
        let fresh = Node::with_text("p2", BlockKind::Paragraph, "Hello")
            .edited_at(now - Duration::minutes(4));
        let store = InMemoryStore::new()
            .with_child("page", old.clone())
            .with_child("page", fresh.clone());
        let mock = MockTranslator::new(MockMode::Suffix);

        let config = create_config().with_realtime(true);
        let reconciler = Reconciler::new(&store, &mock, &config);
        assert_eq!(
            reconciler.reconcile_node(&old, now).await.unwrap(),
            Outcome::Skipped(SkipReason::Stale)
        );
        assert_eq!(
            reconciler.reconcile_node(&fresh, now).await.unwrap(),
            Outcome::Created
        );

        let batch = create_config();
        assert_eq!(
            Reconciler::new(&store, &mock, &batch)
                .reconcile_node(&old, now)
                .await
                .unwrap(),
            Outcome::Created
        );
    }

    #[tokio::test]
    async fn test_translator_error_leaves_store_untouched() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "Hello"));
        let mock = MockTranslator::new(MockMode::Error(MtError::ApiError {
            status: 403,
            message: "quota".into(),
        }));
        let config = create_config();
        let node = store.node("p1").unwrap();

        let err = Reconciler::new(&store, &mock, &config)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(store.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_duplicate_delete_does_not_abort() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "Hello"))
            .with_child("p1", Node::with_text("c1", BlockKind::Paragraph, "Hola ⚐ 0005"))
            .with_child("p1", Node::with_text("c2", BlockKind::Paragraph, "Hola ⚐ 0005"));
        store.fail_on("c2");
        let mock = MockTranslator::new(MockMode::Suffix);
        let config = create_config();
        let node = store.node("p1").unwrap();

        let outcome = Reconciler::new(&store, &mock, &config)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.children_of("p1").len(), 2);
    }

    #[tokio::test]
    async fn test_leaf_container_is_not_listed() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "Hello"));
        let mock = MockTranslator::new(MockMode::Suffix);
        let node = store.node("p1").unwrap();
        assert!(!node.has_children);

        let revert = RunConfig::revert();
        let outcome = Reconciler::new(&store, &mock, &revert)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.reads(), 0);

        let create = create_config();
        let outcome = Reconciler::new(&store, &mock, &create)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Created);
        assert_eq!(store.reads(), 0);
        assert_eq!(store.children_of("p1").len(), 1);

        // The next pass sees the new child and lists it.
        let node = store.node("p1").unwrap();
        assert!(node.has_children);
        let outcome = Reconciler::new(&store, &mock, &create)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_store_error_is_reported() {
        let store = InMemoryStore::new()
            .with_child("page", Node::with_text("p1", BlockKind::Paragraph, "Hello"))
            .with_child("p1", Node::with_text("n1", BlockKind::Paragraph, "note"));
        store.fail_on("p1");
        let mock = MockTranslator::new(MockMode::Suffix);
        let config = create_config();
        let node = store.node("p1").unwrap();

        let err = Reconciler::new(&store, &mock, &config)
            .reconcile_node(&node, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::sync::SyncError::Store(StoreError::ApiError { status: 500, .. })
        ));
        assert_eq!(mock.calls(), 0);
    }
}
