//! Grouping and canvas placement
//!
//! Pure functions from a flat bookmark list to the two presentation shapes
//! the clients consume: a file/line grouped tree and a default grid of
//! canvas nodes. Both are deterministic for identical input.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::record::{Bookmark, CanvasNode, CanvasNodeData, NodePosition};

/// Canvas grid: number of columns.
const GRID_COLUMNS: usize = 3;
/// Canvas grid: horizontal spacing between nodes.
const GRID_X_SPACING: f64 = 300.0;
/// Canvas grid: vertical spacing between rows.
const GRID_Y_SPACING: f64 = 200.0;
/// Canvas grid: top-left origin.
const GRID_ORIGIN: f64 = 100.0;

/// One file's bookmarks, sorted by line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGroup {
    pub file_path: PathBuf,
    pub bookmarks: Vec<Bookmark>,
}

/// Group bookmarks by file for the tree view.
///
/// Groups are ordered by lexicographic file path; bookmarks within a group
/// by ascending line, stably, so equal lines keep their input order. Files
/// with no bookmarks in the input produce no group.
pub fn group_by_file(bookmarks: &[Bookmark]) -> Vec<FileGroup> {
    let mut sorted: Vec<Bookmark> = bookmarks.to_vec();
    // Group keys compare as strings, not path components.
    sorted.sort_by(|a, b| {
        a.file_path
            .as_os_str()
            .cmp(b.file_path.as_os_str())
            .then(a.line.cmp(&b.line))
    });

    let mut groups: Vec<FileGroup> = Vec::new();
    for bookmark in sorted {
        match groups.last_mut() {
            Some(group) if group.file_path == bookmark.file_path => {
                group.bookmarks.push(bookmark);
            }
            _ => groups.push(FileGroup {
                file_path: bookmark.file_path.clone(),
                bookmarks: vec![bookmark],
            }),
        }
    }
    groups
}

/// Build the default canvas node set: one node per distinct file, placed on
/// a fixed grid in the order files are first encountered in the input.
///
/// This placement is only a default; a previously saved layout overrides it
/// wholesale.
pub fn default_canvas_nodes(bookmarks: &[Bookmark]) -> Vec<CanvasNode> {
    let mut files: Vec<PathBuf> = Vec::new();
    for bookmark in bookmarks {
        if !files.contains(&bookmark.file_path) {
            files.push(bookmark.file_path.clone());
        }
    }

    files
        .into_iter()
        .enumerate()
        .map(|(index, file_path)| {
            let file_bookmarks: Vec<Bookmark> = bookmarks
                .iter()
                .filter(|b| b.file_path == file_path)
                .cloned()
                .collect();

            CanvasNode {
                id: format!("file-{index}"),
                node_type: "bookmarkNode".to_string(),
                position: NodePosition {
                    x: GRID_ORIGIN + (index % GRID_COLUMNS) as f64 * GRID_X_SPACING,
                    y: GRID_ORIGIN + (index / GRID_COLUMNS) as f64 * GRID_Y_SPACING,
                },
                data: CanvasNodeData {
                    file_path,
                    bookmarks: file_bookmarks,
                },
            }
        })
        .collect()
}
