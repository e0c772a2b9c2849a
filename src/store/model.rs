//! Read model for document tree nodes
//!
//! Nodes mirror Notion blocks closely enough to round-trip rich text, but only
//! carry what the sync engine looks at: identity, kind, edit time and runs.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

/// Block types the store knows how to read text from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Paragraph,
    BulletedListItem,
    NumberedListItem,
    Toggle,
    ToDo,
    Quote,
    Callout,
    /// A nested page; its text lives in the page title, not in runs
    ChildPage,
    /// Anything else (dividers, images, tables, ...), keeps the raw type name
    Unsupported(String),
}

impl BlockKind {
    pub fn from_type(block_type: &str) -> Self {
        match block_type {
            "heading_1" => Self::Heading1,
            "heading_2" => Self::Heading2,
            "heading_3" => Self::Heading3,
            "paragraph" => Self::Paragraph,
            "bulleted_list_item" => Self::BulletedListItem,
            "numbered_list_item" => Self::NumberedListItem,
            "toggle" => Self::Toggle,
            "to_do" => Self::ToDo,
            "quote" => Self::Quote,
            "callout" => Self::Callout,
            "child_page" => Self::ChildPage,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Heading1 => "heading_1",
            Self::Heading2 => "heading_2",
            Self::Heading3 => "heading_3",
            Self::Paragraph => "paragraph",
            Self::BulletedListItem => "bulleted_list_item",
            Self::NumberedListItem => "numbered_list_item",
            Self::Toggle => "toggle",
            Self::ToDo => "to_do",
            Self::Quote => "quote",
            Self::Callout => "callout",
            Self::ChildPage => "child_page",
            Self::Unsupported(name) => name,
        }
    }

    /// Whether blocks of this kind carry a `rich_text` array.
    pub fn has_rich_text(&self) -> bool {
        !matches!(self, Self::ChildPage | Self::Unsupported(_))
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rich-text run.
///
/// `raw` keeps the run exactly as the store returned it (annotations, links,
/// mentions) so writing a node back does not flatten its formatting. Runs the
/// engine synthesizes have no `raw` and serialize as plain text objects.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub raw: Option<Value>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: None,
        }
    }

    pub fn from_raw(raw: Value) -> Self {
        let text = raw["plain_text"]
            .as_str()
            .or_else(|| raw["text"]["content"].as_str())
            .unwrap_or_default()
            .to_string();
        Self {
            text,
            raw: Some(raw),
        }
    }

    pub fn to_json(&self) -> Value {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => json!({ "type": "text", "text": { "content": self.text } }),
        }
    }
}

/// A document tree element as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: BlockKind,
    pub last_edited_time: DateTime<Utc>,
    pub has_children: bool,
    pub runs: Vec<TextRun>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: BlockKind, runs: Vec<TextRun>) -> Self {
        Self {
            id: id.into(),
            kind,
            last_edited_time: Utc::now(),
            has_children: false,
            runs,
        }
    }

    /// Convenience for a node holding one plain run.
    pub fn with_text(id: impl Into<String>, kind: BlockKind, text: &str) -> Self {
        Self::new(id, kind, vec![TextRun::plain(text)])
    }

    pub fn edited_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_edited_time = at;
        self
    }

    /// Concatenated plain text of all runs; empty for kinds without rich text.
    pub fn plain_text(&self) -> String {
        if !self.kind.has_rich_text() {
            return String::new();
        }
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// `rich_text` array for update payloads.
    pub fn rich_text_json(&self) -> Value {
        Value::Array(self.runs.iter().map(TextRun::to_json).collect())
    }
}

/// A block to be created under a parent.
///
/// Built from a kind and text only, so nothing from the parent (id, children,
/// colour, icon) leaks into the new block.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlock {
    pub kind: BlockKind,
    pub runs: Vec<TextRun>,
}

impl NewBlock {
    /// Same-kind block carrying a single plain run.
    pub fn text_block(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            runs: vec![TextRun::plain(text)],
        }
    }

    pub fn to_json(&self) -> Value {
        let block_type = self.kind.as_str();
        let rich_text: Vec<Value> = self.runs.iter().map(TextRun::to_json).collect();
        let mut body = json!({ "rich_text": rich_text });
        if self.kind == BlockKind::ToDo {
            body["checked"] = Value::Bool(false);
        }
        let mut block = json!({ "object": "block", "type": block_type });
        block[block_type] = body;
        block
    }
}
