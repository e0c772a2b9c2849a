//! Maps a node kind to the way its translation is stored.

use crate::store::BlockKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// Page title; translation and original share the title text.
    Title,
    /// Translation appended to the node's own runs (headings).
    Inline,
    /// Translation kept in one synthesized child block.
    Container,
    /// Nothing translatable.
    Skip,
}

pub fn classify(kind: &BlockKind) -> Handling {
    match kind {
        BlockKind::ChildPage => Handling::Title,
        BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => Handling::Inline,
        BlockKind::Paragraph
        | BlockKind::BulletedListItem
        | BlockKind::NumberedListItem
        | BlockKind::Toggle
        | BlockKind::ToDo
        | BlockKind::Quote
        | BlockKind::Callout => Handling::Container,
        BlockKind::Unsupported(_) => Handling::Skip,
    }
}
