//! Decoration sync
//!
//! Pure function of (active file, bookmark list) to the line highlights the
//! editor should render. Bookmarks do not track document edits, so lines
//! shifted after creation stay where they were bookmarked until the user
//! corrects them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::record::Bookmark;

/// A single line to highlight, with optional hover note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineHighlight {
    /// Zero-based line number, passed through unmodified
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LineHighlight {
    /// Markdown shown when hovering the highlighted line.
    pub fn hover_markdown(&self) -> String {
        match &self.note {
            Some(note) => format!("**Bookmark Note**:\n\n{note}"),
            None => "**Bookmark**".to_string(),
        }
    }
}

/// Highlights for exactly the bookmarks whose path equals `active`.
pub fn decorations_for_file(active: &Path, bookmarks: &[Bookmark]) -> Vec<LineHighlight> {
    bookmarks
        .iter()
        .filter(|b| b.file_path == active)
        .map(|b| LineHighlight {
            line: b.line,
            note: if b.note.is_empty() {
                None
            } else {
                Some(b.note.clone())
            },
        })
        .collect()
}
