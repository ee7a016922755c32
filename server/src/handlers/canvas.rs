//! Canvas view message handlers.
//!
//! The canvas webview speaks a small request set: fetch the node/edge
//! graph, edit a note from a card, open a file, and persist the layout the
//! user arranged. Note edits go through the same store path as the
//! edit-note command so persistence and tree refresh stay consistent.

use bookmarker_store::{default_canvas_nodes, CanvasEdge, CanvasLayout, CanvasNode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{ShowDocumentParams, Url};

use crate::backend::BookmarkBackend;
use crate::error::LspError;
use crate::handlers::bookmarks::{EditNoteParams, MutationResponse};

// ==========================================
// Canvas Data Request
// ==========================================

/// The node/edge set rendered by the canvas.
///
/// `command` is always `bookmarksData`; the webview dispatches on it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksDataResponse {
    pub command: String,
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

impl BookmarksDataResponse {
    fn new(nodes: Vec<CanvasNode>, edges: Vec<CanvasEdge>) -> Self {
        Self {
            command: "bookmarksData".to_string(),
            nodes,
            edges,
        }
    }
}

// ==========================================
// Canvas Update / Open / Save Requests
// ==========================================

/// Parameters for editing a note from a canvas card.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasUpdateBookmarkParams {
    pub bookmark_id: String,
    pub new_note: String,
}

/// Parameters for opening a file from a canvas node.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasOpenFileParams {
    pub file_path: PathBuf,
}

/// Parameters for persisting the user-arranged layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSaveLayoutParams {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

impl BookmarkBackend {
    /// Answer `getBookmarks` from the canvas: the saved layout wholesale
    /// when one exists, otherwise a default grid with no edges.
    pub async fn handle_canvas_get_bookmarks(&self) -> Result<BookmarksDataResponse> {
        if let Some(layout) = self.layout().await {
            if let Some(saved) = layout.load() {
                return Ok(BookmarksDataResponse::new(saved.nodes, saved.edges));
            }
        }

        let store = self.store().await?;
        let nodes = default_canvas_nodes(&store.all_bookmarks());
        Ok(BookmarksDataResponse::new(nodes, Vec::new()))
    }

    pub async fn handle_canvas_update_bookmark(
        &self,
        params: CanvasUpdateBookmarkParams,
    ) -> Result<MutationResponse> {
        // Same path as the edit-note command.
        self.handle_edit_note(EditNoteParams {
            bookmark_id: params.bookmark_id,
            new_note: params.new_note,
        })
        .await
    }

    pub async fn handle_canvas_open_file(
        &self,
        params: CanvasOpenFileParams,
    ) -> Result<MutationResponse> {
        let uri = Url::from_file_path(&params.file_path).map_err(|_| {
            LspError::InvalidUri(params.file_path.to_string_lossy().into_owned())
        })?;

        let shown = self
            .client
            .show_document(ShowDocumentParams {
                uri,
                external: None,
                take_focus: Some(true),
                selection: None,
            })
            .await
            .unwrap_or(false);

        Ok(MutationResponse { success: shown })
    }

    pub async fn handle_canvas_save_layout(
        &self,
        params: CanvasSaveLayoutParams,
    ) -> Result<MutationResponse> {
        let layout_store = match self.layout().await {
            Some(layout) => layout,
            None => return Err(LspError::StoreNotInitialized.into()),
        };

        let layout = CanvasLayout {
            nodes: params.nodes,
            edges: params.edges,
        };

        match layout_store.save(layout) {
            Ok(()) => Ok(MutationResponse { success: true }),
            Err(e) => {
                self.report_save_failure(&e).await;
                Ok(MutationResponse { success: false })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmarks_data_response_has_command() {
        let response = BookmarksDataResponse::new(Vec::new(), Vec::new());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"command\":\"bookmarksData\""));
        assert!(json.contains("\"nodes\":[]"));
        assert!(json.contains("\"edges\":[]"));
    }

    #[test]
    fn test_canvas_update_params_camel_case() {
        let json = r#"{"bookmarkId": "b1", "newNote": "from canvas"}"#;
        let params: CanvasUpdateBookmarkParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.bookmark_id, "b1");
        assert_eq!(params.new_note, "from canvas");
    }

    #[test]
    fn test_save_layout_params_round_trip() {
        let json = r#"{
            "nodes": [{
                "id": "file-0",
                "type": "bookmarkNode",
                "position": {"x": 250.5, "y": 90.0},
                "data": {"filePath": "/ws/a.rs", "bookmarks": []}
            }],
            "edges": [{"id": "e1", "source": "file-0", "target": "file-1", "label": "calls"}]
        }"#;

        let params: CanvasSaveLayoutParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.nodes.len(), 1);
        assert_eq!(params.nodes[0].position.x, 250.5);
        assert_eq!(params.edges[0].label.as_deref(), Some("calls"));
    }

    #[test]
    fn test_open_file_params() {
        let json = r#"{"filePath": "/ws/src/lib.rs"}"#;
        let params: CanvasOpenFileParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.file_path, PathBuf::from("/ws/src/lib.rs"));
    }
}
