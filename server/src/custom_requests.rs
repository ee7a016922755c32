//! Custom request dispatch for the Bookmarker surface.
//!
//! Each method maps one user gesture (or one canvas message) onto a typed
//! handler. `executeCommand` arrives here too, with `bookmarker.X`
//! rewritten to `bookmarker/X`.

use crate::backend::BookmarkBackend;
use crate::handlers::*;
use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};

impl BookmarkBackend {
    pub async fn handle_custom_request(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            "bookmarker/addBookmark" => {
                let params: AddBookmarkParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_add_bookmark(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/editNote" => {
                let params: EditNoteParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_edit_note(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/removeBookmark" => {
                let params: RemoveBookmarkParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_remove_bookmark(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/searchBookmarks" => {
                let params: SearchBookmarksParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_search_bookmarks(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/getBookmarkTree" => {
                // Params are fully optional for this one.
                let params: BookmarkTreeParams = match params {
                    Value::Null => BookmarkTreeParams::default(),
                    other => serde_json::from_value(other)
                        .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?,
                };
                let response = self.handle_get_bookmark_tree(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/getDecorations" => {
                let params: GetDecorationsParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_get_decorations(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/exportBookmarks" => {
                let params: ExportBookmarksParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_export_bookmarks(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/importBookmarks" => {
                let params: ImportBookmarksParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_import_bookmarks(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/recoverFromBackup" => {
                let params: RecoverFromBackupParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_recover_from_backup(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            // Canvas view protocol
            "bookmarker/canvasGetBookmarks" => {
                let response = self.handle_canvas_get_bookmarks().await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/canvasUpdateBookmark" => {
                let params: CanvasUpdateBookmarkParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_canvas_update_bookmark(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/canvasOpenFile" => {
                let params: CanvasOpenFileParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_canvas_open_file(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            "bookmarker/canvasSaveLayout" => {
                let params: CanvasSaveLayoutParams = serde_json::from_value(params)
                    .map_err(|e| Error::invalid_params(format!("Invalid params: {e}")))?;
                let response = self.handle_canvas_save_layout(params).await?;
                serde_json::to_value(response).map_err(|_| Error::internal_error())
            }

            _ => Err(Error::method_not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tower_lsp::lsp_types::InitializedParams;
    use tower_lsp::{LanguageServer, LspService};

    async fn backend_with_workspace() -> (TempDir, BookmarkBackend) {
        let dir = TempDir::new().unwrap();
        let (service, _socket) = LspService::new(BookmarkBackend::new);
        let backend = BookmarkBackend::new(service.inner().client.clone());

        // Folders arrive through initialize, storage is built in
        // initialized, same as a real session.
        let params = tower_lsp::lsp_types::InitializeParams {
            workspace_folders: Some(vec![tower_lsp::lsp_types::WorkspaceFolder {
                uri: tower_lsp::lsp_types::Url::from_file_path(dir.path()).unwrap(),
                name: "test".to_string(),
            }]),
            ..Default::default()
        };
        backend.initialize(params).await.unwrap();
        backend.initialized(InitializedParams {}).await;
        (dir, backend)
    }

    #[tokio::test]
    async fn test_unknown_method_is_rejected() {
        let (_dir, backend) = backend_with_workspace().await;
        let err = backend
            .handle_custom_request("bookmarker/nope", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.code, tower_lsp::jsonrpc::ErrorCode::MethodNotFound);
    }

    #[tokio::test]
    async fn test_add_then_tree_round_trip() {
        let (dir, backend) = backend_with_workspace().await;
        let file = dir.path().join("src/main.rs");

        let response = backend
            .handle_custom_request(
                "bookmarker/addBookmark",
                json!({
                    "filePath": file,
                    "line": 7,
                    "lineText": "  let x = 1;  ",
                    "note": " check "
                }),
            )
            .await
            .unwrap();
        assert_eq!(response["added"], json!(true));
        // Both the line text and the note were trimmed.
        assert_eq!(response["bookmark"]["lineText"], json!("let x = 1;"));
        assert_eq!(response["bookmark"]["note"], json!("check"));

        let tree = backend
            .handle_custom_request("bookmarker/getBookmarkTree", Value::Null)
            .await
            .unwrap();
        assert_eq!(tree["total"], json!(1));
        assert_eq!(tree["groups"][0]["bookmarks"][0]["line"], json!(7));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_through_dispatch() {
        let (dir, backend) = backend_with_workspace().await;
        let file = dir.path().join("a.rs");

        let added = backend
            .handle_custom_request(
                "bookmarker/addBookmark",
                json!({"filePath": file, "line": 0, "lineText": "x", "note": ""}),
            )
            .await
            .unwrap();
        let id = added["bookmark"]["id"].as_str().unwrap().to_string();

        let first = backend
            .handle_custom_request("bookmarker/removeBookmark", json!({"bookmarkId": id}))
            .await
            .unwrap();
        assert_eq!(first["success"], json!(true));

        let second = backend
            .handle_custom_request("bookmarker/removeBookmark", json!({"bookmarkId": id}))
            .await
            .unwrap();
        assert_eq!(second["success"], json!(false));
    }

    #[tokio::test]
    async fn test_canvas_update_goes_through_store() {
        let (dir, backend) = backend_with_workspace().await;
        let file = dir.path().join("a.rs");

        let added = backend
            .handle_custom_request(
                "bookmarker/addBookmark",
                json!({"filePath": file, "line": 3, "lineText": "y", "note": "old"}),
            )
            .await
            .unwrap();
        let id = added["bookmark"]["id"].as_str().unwrap().to_string();

        let updated = backend
            .handle_custom_request(
                "bookmarker/canvasUpdateBookmark",
                json!({"bookmarkId": id, "newNote": "from canvas"}),
            )
            .await
            .unwrap();
        assert_eq!(updated["success"], json!(true));

        let tree = backend
            .handle_custom_request("bookmarker/getBookmarkTree", Value::Null)
            .await
            .unwrap();
        assert_eq!(
            tree["groups"][0]["bookmarks"][0]["note"],
            json!("from canvas")
        );
    }

    #[tokio::test]
    async fn test_canvas_get_bookmarks_default_grid_then_saved_layout() {
        let (dir, backend) = backend_with_workspace().await;
        let file = dir.path().join("a.rs");

        backend
            .handle_custom_request(
                "bookmarker/addBookmark",
                json!({"filePath": file, "line": 1, "lineText": "x", "note": ""}),
            )
            .await
            .unwrap();

        let data = backend
            .handle_custom_request("bookmarker/canvasGetBookmarks", Value::Null)
            .await
            .unwrap();
        assert_eq!(data["command"], json!("bookmarksData"));
        assert_eq!(data["nodes"][0]["id"], json!("file-0"));
        assert_eq!(data["nodes"][0]["position"]["x"], json!(100.0));
        assert_eq!(data["edges"], json!([]));

        // A saved layout overrides the grid wholesale.
        let saved = backend
            .handle_custom_request(
                "bookmarker/canvasSaveLayout",
                json!({
                    "nodes": [{
                        "id": "file-0",
                        "type": "bookmarkNode",
                        "position": {"x": 42.0, "y": 7.0},
                        "data": {"filePath": file, "bookmarks": []}
                    }],
                    "edges": [{"id": "e1", "source": "file-0", "target": "file-0"}]
                }),
            )
            .await
            .unwrap();
        assert_eq!(saved["success"], json!(true));

        let data = backend
            .handle_custom_request("bookmarker/canvasGetBookmarks", Value::Null)
            .await
            .unwrap();
        assert_eq!(data["nodes"][0]["position"]["x"], json!(42.0));
        assert_eq!(data["edges"][0]["id"], json!("e1"));
    }

    #[tokio::test]
    async fn test_search_filters_by_text() {
        let (dir, backend) = backend_with_workspace().await;
        for (name, text, note) in [
            ("a.rs", "let total = 0;", ""),
            ("b.rs", "fn run()", "totals"),
            ("c.rs", "struct S;", "other"),
        ] {
            backend
                .handle_custom_request(
                    "bookmarker/addBookmark",
                    json!({
                        "filePath": dir.path().join(name),
                        "line": 0,
                        "lineText": text,
                        "note": note
                    }),
                )
                .await
                .unwrap();
        }

        let result = backend
            .handle_custom_request("bookmarker/searchBookmarks", json!({"query": "total"}))
            .await
            .unwrap();
        assert_eq!(result["total"], json!(2));
    }

    #[tokio::test]
    async fn test_export_import_through_dispatch() {
        let (dir, backend) = backend_with_workspace().await;
        let file = dir.path().join("a.rs");

        backend
            .handle_custom_request(
                "bookmarker/addBookmark",
                json!({"filePath": file, "line": 2, "lineText": "x", "note": "n"}),
            )
            .await
            .unwrap();

        let target = dir.path().join("out.json");
        let exported = backend
            .handle_custom_request(
                "bookmarker/exportBookmarks",
                json!({"targetPath": target}),
            )
            .await
            .unwrap();
        assert_eq!(exported["count"], json!(1));

        let imported = backend
            .handle_custom_request(
                "bookmarker/importBookmarks",
                json!({"sourcePath": target, "workspaceRoot": dir.path()}),
            )
            .await
            .unwrap();
        assert_eq!(imported["count"], json!(1));

        let tree = backend
            .handle_custom_request("bookmarker/getBookmarkTree", Value::Null)
            .await
            .unwrap();
        assert_eq!(tree["total"], json!(2));
    }

    #[tokio::test]
    async fn test_import_invalid_format_is_invalid_params() {
        let (dir, backend) = backend_with_workspace().await;
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"version": "1.0"}"#).unwrap();

        let err = backend
            .handle_custom_request("bookmarker/importBookmarks", json!({"sourcePath": bad}))
            .await
            .unwrap_err();
        assert_eq!(err.code, tower_lsp::jsonrpc::ErrorCode::InvalidParams);
    }

    #[tokio::test]
    async fn test_recover_without_backup() {
        let (dir, backend) = backend_with_workspace().await;
        let response = backend
            .handle_custom_request(
                "bookmarker/recoverFromBackup",
                json!({"workspaceRoot": dir.path()}),
            )
            .await
            .unwrap();
        assert_eq!(response["recovered"], json!(false));
    }
}
