//! Bookmark record and canvas layout types
//!
//! These structs define the persisted and wire formats. Field names are
//! camelCase on the wire to stay compatible with the extension client and
//! with bookmark files written by earlier versions.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A user-created annotation anchored to a specific file and line.
///
/// `line` is zero-based. `line_text` is a snapshot taken at creation time
/// and is not re-synced when the underlying document changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Opaque unique id, unique across the whole process
    pub id: String,
    /// Absolute path of the bookmarked file
    pub file_path: PathBuf,
    /// Zero-based line number
    pub line: u32,
    /// Trimmed text of the line at creation time
    pub line_text: String,
    /// Free-text note, possibly empty
    pub note: String,
    /// ISO-8601 creation timestamp
    pub created: String,
}

impl Bookmark {
    /// Create a new bookmark with a fresh id and creation timestamp.
    pub fn new(
        file_path: impl Into<PathBuf>,
        line: u32,
        line_text: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_path: file_path.into(),
            line,
            line_text: line_text.into(),
            note: note.into(),
            created: Utc::now().to_rfc3339(),
        }
    }
}

/// Export/import envelope wrapped around a bookmark list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: String,
    pub export_date: String,
    pub bookmarks: Vec<Bookmark>,
}

impl ExportFile {
    /// Current export format version.
    pub const VERSION: &'static str = "1.0";

    /// Wrap a bookmark list with the current version and timestamp.
    pub fn new(bookmarks: Vec<Bookmark>) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            export_date: Utc::now().to_rfc3339(),
            bookmarks,
        }
    }
}

/// Canvas position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// Payload carried by a canvas node: one file and its bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNodeData {
    pub file_path: PathBuf,
    pub bookmarks: Vec<Bookmark>,
}

/// A positioned visual grouping of bookmarks by file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: NodePosition,
    pub data: CanvasNodeData,
}

/// A user-drawn connection between two canvas nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The user-arranged canvas graph, persisted as an opaque blob.
///
/// Nodes may reference bookmarks that no longer exist; stale references are
/// tolerated, not repaired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasLayout {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}
