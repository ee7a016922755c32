//! LSP Backend Implementation
//!
//! Owns the workspace store and the layout store, and exposes the bookmark
//! command surface through `executeCommand`. Mutations push two custom
//! notifications back to the extension: `bookmarker/didChangeBookmarks`
//! (tree refresh) and `bookmarker/publishDecorations` (line highlights for
//! one file).

use bookmarker_store::{decorations_for_file, LayoutStore, StoreError, WorkspaceStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::error::LspError;
use crate::handlers::DecorationView;

/// Notification telling the extension to refresh its tree view.
pub enum BookmarksChanged {}

impl Notification for BookmarksChanged {
    type Params = ();
    const METHOD: &'static str = "bookmarker/didChangeBookmarks";
}

/// Payload of a decoration push for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDecorationsParams {
    pub uri: String,
    pub decorations: Vec<DecorationView>,
}

/// Notification carrying the decorated lines of one file.
pub enum PublishDecorations {}

impl Notification for PublishDecorations {
    type Params = PublishDecorationsParams;
    const METHOD: &'static str = "bookmarker/publishDecorations";
}

/// Bookmarker language server backend.
pub struct BookmarkBackend {
    /// LSP client for sending notifications.
    pub client: Client,

    /// Bookmark store; `None` until `initialized` runs with a workspace.
    store: RwLock<Option<Arc<WorkspaceStore>>>,

    /// Canvas layout store, rooted at the first workspace folder.
    layout: RwLock<Option<Arc<LayoutStore>>>,

    /// Workspace folders reported by the client.
    workspace_folders: RwLock<Vec<PathBuf>>,

    /// Root from `--workspace`, used only when the client reports no
    /// workspace folders.
    fallback_root: Option<PathBuf>,
}

impl BookmarkBackend {
    /// Create a new backend with no fallback root.
    pub fn new(client: Client) -> Self {
        Self::with_fallback_root(client, None)
    }

    /// Create a new backend. When the client's `initialize` carries no
    /// workspace folders, `fallback_root` stands in as the single root.
    pub fn with_fallback_root(client: Client, fallback_root: Option<PathBuf>) -> Self {
        Self {
            client,
            store: RwLock::new(None),
            layout: RwLock::new(None),
            workspace_folders: RwLock::new(Vec::new()),
            fallback_root,
        }
    }

    /// The workspace store, or `StoreNotInitialized` before `initialized`
    /// (or when no workspace was open).
    pub async fn store(&self) -> Result<Arc<WorkspaceStore>> {
        self.store
            .read()
            .await
            .clone()
            .ok_or_else(|| LspError::StoreNotInitialized.into())
    }

    /// The layout store, if storage was initialized.
    pub async fn layout(&self) -> Option<Arc<LayoutStore>> {
        self.layout.read().await.clone()
    }

    /// Tell the user a save failed. The in-memory state already carries the
    /// change; only the disk write was lost.
    pub async fn report_save_failure(&self, e: &StoreError) {
        tracing::error!("Save failed: {}", e);
        self.client
            .show_message(MessageType::ERROR, "Failed to save bookmarks")
            .await;
    }

    /// Push refresh notifications after a mutation: always the tree, and
    /// the decorations of `file` when one is affected. The mutation has
    /// already been applied and persisted by the time this runs.
    pub async fn notify_changed(&self, file: Option<&Path>) {
        self.client.send_notification::<BookmarksChanged>(()).await;

        if let Some(file) = file {
            self.publish_decorations(file).await;
        }
    }

    /// Send the current decoration set for one file.
    async fn publish_decorations(&self, file: &Path) {
        let store = match self.store().await {
            Ok(store) => store,
            Err(_) => return,
        };

        let uri = match Url::from_file_path(file) {
            Ok(uri) => uri,
            Err(_) => {
                tracing::warn!("Not a decoratable path: {}", file.display());
                return;
            }
        };

        let decorations = decorations_for_file(file, &store.all_bookmarks())
            .into_iter()
            .map(|h| DecorationView {
                line: h.line,
                hover_message: h.hover_markdown(),
            })
            .collect();

        self.client
            .send_notification::<PublishDecorations>(PublishDecorationsParams {
                uri: uri.to_string(),
                decorations,
            })
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for BookmarkBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("Initializing Bookmarker LSP server");

        {
            let mut workspace_folders = self.workspace_folders.write().await;
            if let Some(folders) = params.workspace_folders {
                for folder in folders {
                    if let Ok(path) = folder.uri.to_file_path() {
                        tracing::info!("Workspace folder: {}", path.display());
                        workspace_folders.push(path);
                    }
                }
            }

            if workspace_folders.is_empty() {
                if let Some(root) = &self.fallback_root {
                    tracing::info!("No workspace folders from client, using {}", root.display());
                    workspace_folders.push(root.clone());
                }
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        ..Default::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        "bookmarker.addBookmark".to_string(),
                        "bookmarker.editNote".to_string(),
                        "bookmarker.removeBookmark".to_string(),
                        "bookmarker.searchBookmarks".to_string(),
                        "bookmarker.getBookmarkTree".to_string(),
                        "bookmarker.getDecorations".to_string(),
                        "bookmarker.exportBookmarks".to_string(),
                        "bookmarker.importBookmarks".to_string(),
                        "bookmarker.recoverFromBackup".to_string(),
                        // Canvas view protocol
                        "bookmarker.canvasGetBookmarks".to_string(),
                        "bookmarker.canvasUpdateBookmark".to_string(),
                        "bookmarker.canvasOpenFile".to_string(),
                        "bookmarker.canvasSaveLayout".to_string(),
                    ],
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let folders = self.workspace_folders.read().await.clone();

        let store = match WorkspaceStore::new(folders) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Storage initialization failed: {}", e);
                self.client
                    .show_message(
                        MessageType::ERROR,
                        "Failed to initialize bookmark storage. Please open a workspace.",
                    )
                    .await;
                return;
            }
        };

        store.start_auto_backup();

        // Layout blob lives under the first workspace root.
        let layout = store
            .roots()
            .first()
            .map(|root| Arc::new(LayoutStore::new(root)));

        let loaded = store.all_bookmarks().len();
        let root_count = store.roots().len();

        *self.store.write().await = Some(store);
        *self.layout.write().await = layout;

        self.client
            .log_message(
                MessageType::INFO,
                format!("Loaded {loaded} bookmarks across {root_count} workspace folder(s)"),
            )
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down Bookmarker LSP server");
        if let Some(store) = self.store.read().await.as_ref() {
            store.dispose();
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let path = match uri.to_file_path() {
            Ok(p) => p,
            Err(_) => {
                tracing::debug!("Ignoring non-file document: {}", uri);
                return;
            }
        };

        self.publish_decorations(&path).await;
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        tracing::debug!("Executing command: {}", params.command);

        // Commands map one-to-one onto the custom request methods.
        let method = match params.command.strip_prefix("bookmarker.") {
            Some(suffix) => format!("bookmarker/{suffix}"),
            None => return Err(tower_lsp::jsonrpc::Error::method_not_found()),
        };

        let args = params
            .arguments
            .into_iter()
            .next()
            .unwrap_or(serde_json::Value::Null);

        self.handle_custom_request(&method, args).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::LspService;

    fn test_backend() -> BookmarkBackend {
        let (service, _socket) = LspService::new(BookmarkBackend::new);
        let client = service.inner().client.clone();
        BookmarkBackend::new(client)
    }

    #[tokio::test]
    async fn test_store_not_initialized_before_workspace() {
        let backend = test_backend();
        let err = backend.store().await.unwrap_err();
        assert!(err.message.contains("not initialized"));
    }

    #[tokio::test]
    async fn test_initialized_with_workspace_builds_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = test_backend();
        backend
            .workspace_folders
            .write()
            .await
            .push(dir.path().to_path_buf());

        backend.initialized(InitializedParams {}).await;

        let store = backend.store().await.unwrap();
        assert_eq!(store.roots().len(), 1);
        assert!(backend.layout().await.is_some());

        backend.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_fallback_root_used_when_client_sends_no_folders() {
        let dir = tempfile::TempDir::new().unwrap();
        let (service, _socket) = LspService::new(BookmarkBackend::new);
        let client = service.inner().client.clone();
        let backend =
            BookmarkBackend::with_fallback_root(client, Some(dir.path().to_path_buf()));

        backend
            .initialize(InitializeParams::default())
            .await
            .unwrap();
        backend.initialized(InitializedParams {}).await;

        let store = backend.store().await.unwrap();
        assert_eq!(store.roots().len(), 1);
        assert_eq!(store.roots()[0], dir.path());

        backend.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_client_folders_take_precedence_over_fallback() {
        let client_dir = tempfile::TempDir::new().unwrap();
        let fallback_dir = tempfile::TempDir::new().unwrap();
        let (service, _socket) = LspService::new(BookmarkBackend::new);
        let client = service.inner().client.clone();
        let backend =
            BookmarkBackend::with_fallback_root(client, Some(fallback_dir.path().to_path_buf()));

        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: Url::from_directory_path(client_dir.path()).unwrap(),
                name: "ws".to_string(),
            }]),
            ..Default::default()
        };
        backend.initialize(params).await.unwrap();
        backend.initialized(InitializedParams {}).await;

        let store = backend.store().await.unwrap();
        assert_eq!(store.roots().len(), 1);
        assert_eq!(store.roots()[0], client_dir.path());

        backend.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialized_without_workspace_leaves_store_unset() {
        let backend = test_backend();
        backend.initialized(InitializedParams {}).await;
        assert!(backend.store().await.is_err());
        assert!(backend.layout().await.is_none());
    }

    #[test]
    fn test_notification_method_names() {
        assert_eq!(BookmarksChanged::METHOD, "bookmarker/didChangeBookmarks");
        assert_eq!(PublishDecorations::METHOD, "bookmarker/publishDecorations");
    }

    #[test]
    fn test_publish_decorations_params_serialize() {
        let params = PublishDecorationsParams {
            uri: "file:///ws/a.rs".to_string(),
            decorations: vec![DecorationView {
                line: 2,
                hover_message: "**Bookmark**".to_string(),
            }],
        };

        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"uri\":\"file:///ws/a.rs\""));
        assert!(json.contains("\"line\":2"));
    }
}
