//! Notion REST API implementation of [`DocumentStore`]
//!
//! Talks to API version `2022-06-28`. Every non-success status is turned into
//! [`StoreError::ApiError`] carrying Notion's `code` and `message`, so the
//! engine decides what to skip instead of this client printing and moving on.

use crate::store::error::{StoreError, StoreResult};
use crate::store::model::{BlockKind, NewBlock, Node, TextRun};
use crate::store::DocumentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// One page of a paginated list endpoint.
#[derive(Debug, Deserialize)]
struct ListPage {
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

/// A block object as returned by `GET /blocks/{id}/children`.
#[derive(Debug, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    block_type: String,
    last_edited_time: DateTime<Utc>,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    body: Map<String, Value>,
}

impl From<RawBlock> for Node {
    fn from(raw: RawBlock) -> Self {
        let runs = raw
            .body
            .get(&raw.block_type)
            .and_then(|body| body["rich_text"].as_array())
            .map(|runs| runs.iter().cloned().map(TextRun::from_raw).collect())
            .unwrap_or_default();
        Node {
            id: raw.id,
            kind: BlockKind::from_type(&raw.block_type),
            last_edited_time: raw.last_edited_time,
            has_children: raw.has_children,
            runs,
        }
    }
}

/// Parse the `results` of a children listing into nodes.
pub(crate) fn parse_blocks(results: Vec<Value>) -> StoreResult<Vec<Node>> {
    results
        .into_iter()
        .map(|value| {
            serde_json::from_value::<RawBlock>(value)
                .map(Node::from)
                .map_err(StoreError::from)
        })
        .collect()
}

/// Concatenate the `plain_text` of every title property item.
pub(crate) fn title_from_items(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(|item| item["title"]["plain_text"].as_str())
        .collect()
}

/// Build an `ApiError` from Notion's `{status, code, message}` error object.
pub(crate) fn api_error(status: u16, body: &Value) -> StoreError {
    StoreError::ApiError {
        status,
        code: body["code"].as_str().unwrap_or("unknown").to_string(),
        message: body["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Notion API client
#[derive(Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    /// Create a client authenticated with an integration token.
    pub fn new(api_key: &str) -> StoreResult<Self> {
        if api_key.trim().is_empty() {
            return Err(StoreError::ConfigError(
                "API key cannot be empty".to_string(),
            ));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| StoreError::ConfigError(format!("Invalid API key: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("notion-version", HeaderValue::from_static(NOTION_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                StoreError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: "https://api.notion.com/v1".to_string(),
        })
    }

    /// Point the client at a different endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        let body: Value = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw)?
        };

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(body)
    }

    /// Follow `next_cursor` until the listing is exhausted.
    async fn list_all(&self, url: &str) -> StoreResult<Vec<Value>> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page_url = match &cursor {
                Some(cursor) => format!("{}?page_size={}&start_cursor={}", url, PAGE_SIZE, cursor),
                None => format!("{}?page_size={}", url, PAGE_SIZE),
            };
            let body = self.send(self.client.get(&page_url)).await?;
            let page: ListPage = serde_json::from_value(body)?;
            results.extend(page.results);

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(results)
    }
}

impl std::fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn get_title(&self, page_id: &str) -> StoreResult<String> {
        let url = format!("{}/pages/{}/properties/title", self.base_url, page_id);
        let items = self.list_all(&url).await?;
        Ok(title_from_items(&items))
    }

    async fn set_title(&self, page_id: &str, title: &str) -> StoreResult<()> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        let payload = json!({
            "properties": {
                "title": { "title": [ TextRun::plain(title).to_json() ] }
            }
        });
        self.send(self.client.patch(&url).json(&payload)).await?;
        debug!(page_id, "title updated");
        Ok(())
    }

    async fn get_children(&self, node_id: &str) -> StoreResult<Vec<Node>> {
        let url = format!("{}/blocks/{}/children", self.base_url, node_id);
        let results = self.list_all(&url).await?;
        parse_blocks(results)
    }

    async fn update_node(&self, node: &Node) -> StoreResult<()> {
        let url = format!("{}/blocks/{}", self.base_url, node.id);
        let mut payload = json!({});
        payload[node.kind.as_str()] = json!({ "rich_text": node.rich_text_json() });
        self.send(self.client.patch(&url).json(&payload)).await?;
        debug!(block_id = %node.id, "block updated");
        Ok(())
    }

    async fn delete_node(&self, node_id: &str) -> StoreResult<()> {
        let url = format!("{}/blocks/{}", self.base_url, node_id);
        self.send(self.client.delete(&url)).await?;
        debug!(block_id = node_id, "block deleted");
        Ok(())
    }

    async fn append_children(&self, parent_id: &str, blocks: &[NewBlock]) -> StoreResult<()> {
        let url = format!("{}/blocks/{}/children", self.base_url, parent_id);
        let children: Vec<Value> = blocks.iter().map(NewBlock::to_json).collect();
        let payload = json!({ "children": children });
        self.send(self.client.patch(&url).json(&payload)).await?;
        debug!(parent_id, count = blocks.len(), "children appended");
        Ok(())
    }
}
