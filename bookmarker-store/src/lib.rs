//! Bookmarker Storage Layer
//!
//! Workspace-scoped persistence for code bookmarks, plus the pure
//! presentation logic built on top of it:
//!
//! - **Per-workspace storage** - one `bookmarks.json` per workspace root,
//!   with periodic backups and import/export/recovery
//! - **Grouping** - deterministic file/line grouping for tree views and a
//!   default grid layout for the canvas
//! - **Decorations** - line highlights for the active editor
//!
//! ## Example
//!
//! ```ignore
//! use bookmarker_store::{Bookmark, WorkspaceStore};
//!
//! let store = WorkspaceStore::new(vec!["/ws".into()])?;
//! store.add(Bookmark::new("/ws/src/main.rs", 41, "let x = 1;", "check this"));
//! let all = store.all_bookmarks();
//! ```

pub mod decoration;
pub mod error;
pub mod grouping;
pub mod layout;
pub mod record;
pub mod store;

// Re-exports for convenience
pub use decoration::{decorations_for_file, LineHighlight};
pub use error::{Result, StoreError};
pub use grouping::{default_canvas_nodes, group_by_file, FileGroup};
pub use layout::LayoutStore;
pub use record::{Bookmark, CanvasEdge, CanvasLayout, CanvasNode, ExportFile, NodePosition};
pub use store::WorkspaceStore;
