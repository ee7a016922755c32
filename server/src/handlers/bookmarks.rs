//! Bookmark command handlers: add/edit/remove/search, tree data,
//! decorations, and the export/import/recovery operations.

use bookmarker_store::{decorations_for_file, group_by_file, Bookmark, FileGroup};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{MessageType, Url};

use crate::backend::BookmarkBackend;
use crate::error::LspError;

// ==========================================
// Add Bookmark Request
// ==========================================

/// Parameters for creating a bookmark at a source line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookmarkParams {
    /// Absolute path of the file being bookmarked
    pub file_path: PathBuf,
    /// Zero-based line number
    pub line: u32,
    /// Text of the line, snapshotted at creation time
    pub line_text: String,
    /// Note text; trimmed before storing
    #[serde(default)]
    pub note: String,
}

/// Response after creating a bookmark.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookmarkResponse {
    /// False when the file lies under no workspace root
    pub added: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<Bookmark>,
}

// ==========================================
// Edit Note / Remove Requests
// ==========================================

/// Parameters for replacing a bookmark's note.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditNoteParams {
    pub bookmark_id: String,
    pub new_note: String,
}

/// Parameters for removing a bookmark.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBookmarkParams {
    pub bookmark_id: String,
}

/// Generic success response; `success: false` means the id was unknown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub success: bool,
}

// ==========================================
// Tree / Search Requests
// ==========================================

/// Parameters for the grouped tree view data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkTreeParams {
    /// When given, only the owning workspace's bookmarks are grouped
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

/// Parameters for searching bookmarks by text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBookmarksParams {
    pub query: String,
}

/// Grouped-and-sorted tree data for the side panel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkTreeResponse {
    pub groups: Vec<FileGroup>,
    /// Total bookmarks across all groups
    pub total: usize,
}

impl BookmarkTreeResponse {
    fn from_bookmarks(bookmarks: &[Bookmark]) -> Self {
        Self {
            total: bookmarks.len(),
            groups: group_by_file(bookmarks),
        }
    }
}

// ==========================================
// Decorations Request
// ==========================================

/// Parameters for line decorations of an open document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDecorationsParams {
    /// Document URI (file scheme)
    pub uri: String,
}

/// One decorated line with its hover text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationView {
    /// Zero-based line number
    pub line: u32,
    pub hover_message: String,
}

/// Response carrying every decorated line of the file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDecorationsResponse {
    pub decorations: Vec<DecorationView>,
}

// ==========================================
// Export / Import / Recover Requests
// ==========================================

/// Parameters for exporting bookmarks to a user-chosen file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBookmarksParams {
    /// Destination path, already chosen by the host's save dialog
    pub target_path: PathBuf,
    /// Export one workspace only; all workspaces when absent
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

/// Parameters for importing bookmarks from a user-chosen file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBookmarksParams {
    /// Source path, already chosen by the host's open dialog
    pub source_path: PathBuf,
    /// Import into this workspace; route by record path when absent
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

/// Response for export/import, carrying the affected record count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub count: usize,
}

/// Parameters for restoring a workspace from its backup file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverFromBackupParams {
    pub workspace_root: PathBuf,
}

/// Response for backup recovery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverFromBackupResponse {
    /// False when no backup file existed
    pub recovered: bool,
}

impl BookmarkBackend {
    pub async fn handle_add_bookmark(
        &self,
        params: AddBookmarkParams,
    ) -> Result<AddBookmarkResponse> {
        let store = self.store().await?;
        let bookmark = Bookmark::new(
            params.file_path.clone(),
            params.line,
            params.line_text.trim(),
            params.note.trim(),
        );

        let added = match store.add(bookmark.clone()) {
            Ok(added) => added,
            Err(e) => {
                // The record is in memory; only the save failed.
                self.report_save_failure(&e).await;
                true
            }
        };

        if added {
            self.notify_changed(Some(&params.file_path)).await;
        }

        Ok(AddBookmarkResponse {
            added,
            bookmark: added.then_some(bookmark),
        })
    }

    pub async fn handle_edit_note(&self, params: EditNoteParams) -> Result<MutationResponse> {
        let store = self.store().await?;
        let updated = match store.edit_note(&params.bookmark_id, params.new_note.trim()) {
            Ok(updated) => updated,
            Err(e) => {
                self.report_save_failure(&e).await;
                store.find(&params.bookmark_id)
            }
        };

        if let Some(bookmark) = &updated {
            self.notify_changed(Some(&bookmark.file_path)).await;
        }

        Ok(MutationResponse {
            success: updated.is_some(),
        })
    }

    pub async fn handle_remove_bookmark(
        &self,
        params: RemoveBookmarkParams,
    ) -> Result<MutationResponse> {
        let store = self.store().await?;
        let file_path = store.find(&params.bookmark_id).map(|b| b.file_path);

        let removed = match store.remove(&params.bookmark_id) {
            Ok(removed) => removed,
            Err(e) => {
                self.report_save_failure(&e).await;
                true
            }
        };

        if removed {
            self.notify_changed(file_path.as_deref()).await;
        }

        Ok(MutationResponse { success: removed })
    }

    pub async fn handle_get_bookmark_tree(
        &self,
        params: BookmarkTreeParams,
    ) -> Result<BookmarkTreeResponse> {
        let store = self.store().await?;
        let bookmarks = match params.file_path {
            Some(path) => store.bookmarks_for_file(&path),
            None => store.all_bookmarks(),
        };
        Ok(BookmarkTreeResponse::from_bookmarks(&bookmarks))
    }

    pub async fn handle_search_bookmarks(
        &self,
        params: SearchBookmarksParams,
    ) -> Result<BookmarkTreeResponse> {
        let store = self.store().await?;
        let matches = store.search(&params.query);
        Ok(BookmarkTreeResponse::from_bookmarks(&matches))
    }

    pub async fn handle_get_decorations(
        &self,
        params: GetDecorationsParams,
    ) -> Result<GetDecorationsResponse> {
        let store = self.store().await?;
        let path = Url::parse(&params.uri)
            .map_err(|_| LspError::InvalidUri(params.uri.clone()))?
            .to_file_path()
            .map_err(|_| LspError::InvalidUri(params.uri.clone()))?;

        let decorations = decorations_for_file(&path, &store.all_bookmarks())
            .into_iter()
            .map(|h| DecorationView {
                line: h.line,
                hover_message: h.hover_markdown(),
            })
            .collect();

        Ok(GetDecorationsResponse { decorations })
    }

    pub async fn handle_export_bookmarks(
        &self,
        params: ExportBookmarksParams,
    ) -> Result<TransferResponse> {
        let store = self.store().await?;
        match store.export_to(&params.target_path, params.workspace_root.as_deref()) {
            Ok(count) => {
                self.client
                    .show_message(MessageType::INFO, "Bookmarks exported successfully")
                    .await;
                Ok(TransferResponse { count })
            }
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                self.client
                    .show_message(MessageType::ERROR, "Failed to export bookmarks")
                    .await;
                Err(LspError::from(e).into())
            }
        }
    }

    pub async fn handle_import_bookmarks(
        &self,
        params: ImportBookmarksParams,
    ) -> Result<TransferResponse> {
        let store = self.store().await?;
        match store.import_from(&params.source_path, params.workspace_root.as_deref()) {
            Ok(count) => {
                self.client
                    .show_message(MessageType::INFO, "Bookmarks imported successfully")
                    .await;
                self.notify_changed(None).await;
                Ok(TransferResponse { count })
            }
            Err(e) => {
                tracing::error!("Import failed: {}", e);
                self.client
                    .show_message(MessageType::ERROR, "Failed to import bookmarks")
                    .await;
                Err(LspError::from(e).into())
            }
        }
    }

    pub async fn handle_recover_from_backup(
        &self,
        params: RecoverFromBackupParams,
    ) -> Result<RecoverFromBackupResponse> {
        let store = self.store().await?;
        let recovered = store.recover_from_backup(&params.workspace_root);

        if recovered {
            self.client
                .show_message(MessageType::INFO, "Bookmarks recovered successfully")
                .await;
            self.notify_changed(None).await;
        } else {
            self.client
                .show_message(MessageType::WARNING, "No backup found to recover")
                .await;
        }

        Ok(RecoverFromBackupResponse { recovered })
    }
}
