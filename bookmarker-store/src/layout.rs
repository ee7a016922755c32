//! Canvas layout persistence
//!
//! The user-arranged canvas graph is stored as a single opaque blob at
//! `<root>/.vscode/bookmarks.canvas.json`, separate from the bookmark
//! files. It carries no referential integrity against current bookmarks;
//! stale node references are tolerated.

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::record::CanvasLayout;

/// File name of the layout blob under `.vscode`.
const LAYOUT_FILE: &str = "bookmarks.canvas.json";

/// Loads and saves the canvas layout for one workspace root.
pub struct LayoutStore {
    path: PathBuf,
    cached: RwLock<Option<CanvasLayout>>,
}

impl LayoutStore {
    /// Create a layout store rooted at the given workspace root and read
    /// any previously saved layout. A missing or corrupt file yields no
    /// layout.
    pub fn new(root: &Path) -> Self {
        let path = root.join(".vscode").join(LAYOUT_FILE);
        let cached = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(layout) => Some(layout),
                Err(e) => {
                    tracing::warn!("Unreadable canvas layout {}: {}", path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path,
            cached: RwLock::new(cached),
        }
    }

    /// The saved layout, if any.
    pub fn load(&self) -> Option<CanvasLayout> {
        self.cached.read().clone()
    }

    /// Persist a layout wholesale, replacing any previous one.
    pub fn save(&self, layout: CanvasLayout) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&layout)?)?;
        *self.cached.write() = Some(layout);
        Ok(())
    }
}
