//! Tree traversal and the polling loop
//!
//! A pass collects the page's blocks breadth-first, reconciles the page title,
//! then reconciles every collected node strictly in collection order. Calls
//! are awaited one at a time; there is no fan-out across nodes.

use crate::config::RunConfig;
use crate::mt::TextTranslator;
use crate::store::{BlockKind, DocumentStore, Node};
use crate::sync::engine::{Outcome, Reconciler};
use crate::sync::error::SyncResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Collect every block under `root_id` in breadth-first order.
///
/// With `include_subpages`, the children of each `child_page` block are
/// appended after everything found before them. The sub-page block itself
/// always stays in the sequence. A sub-page that cannot be listed is logged
/// and skipped; failing to list the root is an error.
pub async fn collect(
    store: &dyn DocumentStore,
    root_id: &str,
    include_subpages: bool,
) -> SyncResult<Vec<Node>> {
    let mut nodes = store.get_children(root_id).await?;

    if include_subpages {
        let mut next = 0;
        while next < nodes.len() {
            if nodes[next].kind == BlockKind::ChildPage {
                let page_id = nodes[next].id.clone();
                match store.get_children(&page_id).await {
                    Ok(children) => nodes.extend(children),
                    Err(err) => warn!(page_id = %page_id, error = %err, "failed to list sub-page"),
                }
            }
            next += 1;
        }
    }

    info!("Found {} blocks", nodes.len());
    Ok(nodes)
}

/// Counts for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Collected nodes, not counting the root title.
    pub nodes: usize,
    pub created: usize,
    pub refreshed: usize,
    pub reverted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl PassReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Refreshed => self.refreshed += 1,
            Outcome::Reverted => self.reverted += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }

    /// Number of nodes whose stored content changed.
    pub fn changed(&self) -> usize {
        self.created + self.refreshed + self.reverted
    }
}

/// Runs passes of the sync engine over one page.
pub struct Synchronizer {
    store: Arc<dyn DocumentStore>,
    translator: Arc<dyn TextTranslator>,
    config: RunConfig,
}

impl Synchronizer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        translator: Arc<dyn TextTranslator>,
        config: RunConfig,
    ) -> Self {
        Self {
            store,
            translator,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// One pass using the current time for the realtime window.
    pub async fn run_once(&self, page_id: &str) -> SyncResult<PassReport> {
        self.run_once_at(page_id, Utc::now()).await
    }

    /// One pass with an explicit "now".
    ///
    /// Per-node failures are logged and counted; a fatal error stops the pass
    /// and is returned.
    pub async fn run_once_at(&self, page_id: &str, now: DateTime<Utc>) -> SyncResult<PassReport> {
        let started = Instant::now();
        let nodes = collect(self.store.as_ref(), page_id, self.config.include_subpages).await?;
        let reconciler = Reconciler::new(
            self.store.as_ref(),
            self.translator.as_ref(),
            &self.config,
        );

        let mut report = PassReport {
            nodes: nodes.len(),
            ..PassReport::default()
        };

        let outcome = reconciler.reconcile_title(page_id).await;
        Self::record(&mut report, page_id, outcome)?;

        for node in &nodes {
            let outcome = reconciler.reconcile_node(node, now).await;
            Self::record(&mut report, &node.id, outcome)?;
        }

        report.elapsed = started.elapsed();
        info!(
            nodes = report.nodes,
            created = report.created,
            refreshed = report.refreshed,
            reverted = report.reverted,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "Conversion cycle took {} seconds",
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }

    fn record(
        report: &mut PassReport,
        node_id: &str,
        outcome: SyncResult<Outcome>,
    ) -> SyncResult<()> {
        match outcome {
            Ok(outcome) => report.record(outcome),
            Err(err) if err.is_fatal() => {
                error!(node_id, error = %err, "aborting pass");
                return Err(err);
            }
            Err(err) => {
                warn!(node_id, error = %err, "node not reconciled");
                report.failed += 1;
            }
        }
        Ok(())
    }

    /// Repeat passes forever, sleeping `poll_interval` between them.
    ///
    /// An aborted pass is logged and the loop carries on; the marker state in
    /// the store lets the next pass pick up where it stopped. Stops only when
    /// the process does.
    pub async fn run_forever(&self, page_id: &str) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "watching page {} for changes", page_id
        );
        loop {
            if let Err(err) = self.run_once(page_id).await {
                error!(error = %err, "pass aborted, retrying after the poll interval");
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
