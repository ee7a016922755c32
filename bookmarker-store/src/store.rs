//! Workspace-scoped bookmark store
//!
//! Single source of truth for bookmark persistence across one or more
//! workspace roots. Each root keeps a pretty-printed JSON array at
//! `<root>/.vscode/bookmarks.json`, with a periodic unconditional backup at
//! the sibling `bookmarks.backup.json`.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::{Result, StoreError};
use crate::record::{Bookmark, ExportFile};

/// Hidden directory under each workspace root.
const HIDDEN_DIR: &str = ".vscode";
/// Primary bookmark file name.
const BOOKMARKS_FILE: &str = "bookmarks.json";
/// Backup file name, rewritten on every backup tick.
const BACKUP_FILE: &str = "bookmarks.backup.json";
/// Interval between automatic backups.
const BACKUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Per-workspace bookmark store.
///
/// All mutations go through this type so that the in-memory lists and the
/// persisted files stay consistent. Mutations persist the touched workspace
/// before returning; a failed save leaves the in-memory state applied and
/// surfaces the error to the caller for notification.
#[derive(Debug)]
pub struct WorkspaceStore {
    /// Workspace roots, longest first so prefix resolution is deterministic
    /// when roots are nested.
    roots: Vec<PathBuf>,
    /// Root path -> ordered bookmark list.
    bookmarks: DashMap<PathBuf, Vec<Bookmark>>,
    /// Handle of the auto-backup task, taken exactly once on disposal.
    backup_task: Mutex<Option<JoinHandle<()>>>,
}

impl WorkspaceStore {
    /// Create a store for the given workspace roots and load each root's
    /// persisted bookmarks.
    ///
    /// Missing files initialize to an empty list; unreadable or corrupt
    /// files are logged and also initialize to empty. Constructing with no
    /// roots is the one hard failure: the store cannot operate without at
    /// least one workspace.
    pub fn new(mut roots: Vec<PathBuf>) -> Result<Self> {
        if roots.is_empty() {
            return Err(StoreError::NoWorkspace);
        }

        // Longest-prefix-wins: nested roots must be checked before their
        // ancestors when resolving a file path.
        roots.sort_by_key(|r| std::cmp::Reverse(r.components().count()));

        let bookmarks = DashMap::new();
        for root in &roots {
            bookmarks.insert(root.clone(), load_bookmarks(root));
        }

        Ok(Self {
            roots,
            bookmarks,
            backup_task: Mutex::new(None),
        })
    }

    /// The workspace roots this store operates on, longest path first.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve the workspace root owning `path`, if any.
    ///
    /// Roots are matched component-wise and longest-first, so a file under
    /// a nested root resolves to the nested root rather than its ancestor.
    pub fn resolve_root(&self, path: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .find(|root| path.starts_with(root))
            .map(PathBuf::as_path)
    }

    /// All bookmarks across every workspace. Cross-workspace order is
    /// unspecified; within a workspace, insertion order is preserved.
    pub fn all_bookmarks(&self) -> Vec<Bookmark> {
        self.roots
            .iter()
            .filter_map(|root| self.bookmarks.get(root))
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Bookmarks of the workspace owning `file_path`, or an empty list when
    /// no root matches.
    pub fn bookmarks_for_file(&self, file_path: &Path) -> Vec<Bookmark> {
        match self.resolve_root(file_path) {
            Some(root) => self
                .bookmarks
                .get(root)
                .map(|entry| entry.value().clone())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Bookmarks whose line text or note contains `query` (substring,
    /// case-sensitive), across all workspaces.
    pub fn search(&self, query: &str) -> Vec<Bookmark> {
        self.all_bookmarks()
            .into_iter()
            .filter(|b| b.line_text.contains(query) || b.note.contains(query))
            .collect()
    }

    /// Find a bookmark by id across all workspaces.
    pub fn find(&self, id: &str) -> Option<Bookmark> {
        self.all_bookmarks().into_iter().find(|b| b.id == id)
    }

    /// Append a bookmark to its owning workspace and persist.
    ///
    /// Returns `Ok(false)` without touching anything when the bookmark's
    /// path lies under no known root.
    pub fn add(&self, bookmark: Bookmark) -> Result<bool> {
        let root = match self.resolve_root(&bookmark.file_path) {
            Some(root) => root.to_path_buf(),
            None => {
                tracing::warn!(
                    "Bookmark path {} matches no workspace root, dropping",
                    bookmark.file_path.display()
                );
                return Ok(false);
            }
        };

        self.bookmarks.entry(root.clone()).or_default().push(bookmark);
        self.save_workspace(&root)?;
        Ok(true)
    }

    /// Replace the stored bookmark with the same id within the owning
    /// workspace. Unknown id or unresolvable path is a no-op.
    pub fn update(&self, bookmark: Bookmark) -> Result<bool> {
        let root = match self.resolve_root(&bookmark.file_path) {
            Some(root) => root.to_path_buf(),
            None => return Ok(false),
        };

        let replaced = match self.bookmarks.get_mut(&root) {
            Some(mut entry) => {
                match entry.value_mut().iter_mut().find(|b| b.id == bookmark.id) {
                    Some(slot) => {
                        *slot = bookmark;
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };

        if replaced {
            self.save_workspace(&root)?;
        }
        Ok(replaced)
    }

    /// Replace the note of the bookmark with the given id, wherever it is
    /// stored. Returns the updated bookmark, or `None` for an unknown id.
    ///
    /// Both the edit-note command and the canvas note editor go through
    /// here so persistence and refresh stay consistent.
    pub fn edit_note(&self, id: &str, new_note: &str) -> Result<Option<Bookmark>> {
        for root in &self.roots {
            let updated = match self.bookmarks.get_mut(root) {
                Some(mut entry) => match entry.value_mut().iter_mut().find(|b| b.id == id) {
                    Some(slot) => {
                        slot.note = new_note.to_string();
                        Some(slot.clone())
                    }
                    None => None,
                },
                None => None,
            };

            if let Some(bookmark) = updated {
                self.save_workspace(root)?;
                return Ok(Some(bookmark));
            }
        }
        Ok(None)
    }

    /// Remove the first bookmark with the given id, scanning every
    /// workspace, and persist only the workspace it was removed from.
    /// Calling this twice with the same id is safe; the second call no-ops.
    pub fn remove(&self, id: &str) -> Result<bool> {
        for root in &self.roots {
            let removed = match self.bookmarks.get_mut(root) {
                Some(mut entry) => {
                    let list = entry.value_mut();
                    match list.iter().position(|b| b.id == id) {
                        Some(index) => {
                            list.remove(index);
                            true
                        }
                        None => false,
                    }
                }
                None => false,
            };

            if removed {
                self.save_workspace(root)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `root` is one of this store's workspace roots.
    fn is_known_root(&self, root: &Path) -> bool {
        self.roots.iter().any(|r| r == root)
    }

    /// Serialize one workspace's list (or all lists concatenated) into an
    /// export envelope at `target`. Returns the number of exported records.
    ///
    /// An unknown root is a no-op: nothing is written and the count is zero.
    pub fn export_to(&self, target: &Path, root: Option<&Path>) -> Result<usize> {
        let bookmarks = match root {
            Some(root) => {
                if !self.is_known_root(root) {
                    tracing::warn!(
                        "Export requested for unknown root {}, nothing written",
                        root.display()
                    );
                    return Ok(0);
                }
                self.bookmarks
                    .get(root)
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default()
            }
            None => self.all_bookmarks(),
        };

        let count = bookmarks.len();
        let export = ExportFile::new(bookmarks);
        fs::write(target, serde_json::to_string_pretty(&export)?)?;
        tracing::info!("Exported {} bookmarks to {}", count, target.display());
        Ok(count)
    }

    /// Import bookmarks from a JSON file.
    ///
    /// The file must carry a `bookmarks` array (`InvalidFormat` otherwise).
    /// With a known target root, every record is appended to that root
    /// as-is, without de-duplication by id; an unknown target root imports
    /// nothing. Without a target, each record is routed by its own file
    /// path and records matching no root are silently dropped. Returns the
    /// number of records actually imported.
    pub fn import_from(&self, source: &Path, root: Option<&Path>) -> Result<usize> {
        let data: serde_json::Value = serde_json::from_str(&fs::read_to_string(source)?)?;
        let records = match data.get("bookmarks") {
            Some(serde_json::Value::Array(_)) => {
                serde_json::from_value::<Vec<Bookmark>>(data["bookmarks"].clone())?
            }
            _ => return Err(StoreError::InvalidFormat),
        };

        let imported = match root {
            Some(root) => {
                if !self.is_known_root(root) {
                    tracing::warn!(
                        "Import target {} is not a workspace root, skipping",
                        root.display()
                    );
                    return Ok(0);
                }
                let root = root.to_path_buf();
                let count = records.len();
                self.bookmarks.entry(root.clone()).or_default().extend(records);
                self.save_workspace(&root)?;
                count
            }
            None => {
                let mut count = 0;
                let mut touched: Vec<PathBuf> = Vec::new();
                for record in records {
                    match self.resolve_root(&record.file_path) {
                        Some(root) => {
                            let root = root.to_path_buf();
                            self.bookmarks.entry(root.clone()).or_default().push(record);
                            if !touched.contains(&root) {
                                touched.push(root);
                            }
                            count += 1;
                        }
                        None => {
                            tracing::debug!(
                                "Imported bookmark at {} matches no root, dropped",
                                record.file_path.display()
                            );
                        }
                    }
                }
                for root in touched {
                    self.save_workspace(&root)?;
                }
                count
            }
        };

        tracing::info!("Imported {} bookmarks from {}", imported, source.display());
        Ok(imported)
    }

    /// Replace a workspace's list wholesale from its backup file.
    ///
    /// Returns `false` when the root is not a workspace root, no backup
    /// exists, or it cannot be read; the primary list stays unchanged in
    /// all of those cases.
    pub fn recover_from_backup(&self, root: &Path) -> bool {
        if !self.is_known_root(root) {
            tracing::warn!("Recovery requested for unknown root {}", root.display());
            return false;
        }

        let backup_path = root.join(HIDDEN_DIR).join(BACKUP_FILE);
        let recovered: Vec<Bookmark> = match fs::read_to_string(&backup_path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(list) => list,
                Err(e) => {
                    tracing::error!("Unreadable backup {}: {}", backup_path.display(), e);
                    return false;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                tracing::error!("Error reading backup {}: {}", backup_path.display(), e);
                return false;
            }
        };

        self.bookmarks.insert(root.to_path_buf(), recovered);
        if let Err(e) = self.save_workspace(root) {
            tracing::error!("Error persisting recovered bookmarks: {}", e);
        }
        true
    }

    /// Snapshot every workspace's list to its backup file, unconditionally.
    /// Per-root failures are logged and never propagate.
    pub fn backup_all(&self) {
        for root in &self.roots {
            let list = self
                .bookmarks
                .get(root)
                .map(|entry| entry.value().clone())
                .unwrap_or_default();

            if let Err(e) = write_pretty(&root.join(HIDDEN_DIR).join(BACKUP_FILE), &list) {
                tracing::error!("Error creating backup for {}: {}", root.display(), e);
            }
        }
    }

    /// Start the periodic backup task. Idempotent: a second call while the
    /// task is running does nothing.
    ///
    /// The task holds a weak reference, so dropping the store also ends it.
    pub fn start_auto_backup(self: &Arc<Self>) {
        let mut guard = self.backup_task.lock();
        if guard.is_some() {
            return;
        }

        let store = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(BACKUP_INTERVAL);
            // The first tick fires immediately; skip it to keep a pure
            // fixed-interval cadence.
            interval.tick().await;
            loop {
                interval.tick().await;
                match store.upgrade() {
                    Some(store) => store.backup_all(),
                    None => break,
                }
            }
        });

        *guard = Some(handle);
    }

    /// Stop the periodic backup task. Safe to call multiple times; only the
    /// first call does anything.
    pub fn dispose(&self) {
        if let Some(handle) = self.backup_task.lock().take() {
            handle.abort();
            tracing::debug!("Auto-backup task stopped");
        }
    }

    /// Persist one workspace's list to its primary file.
    fn save_workspace(&self, root: &Path) -> Result<()> {
        let list = self
            .bookmarks
            .get(root)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        write_pretty(&root.join(HIDDEN_DIR).join(BOOKMARKS_FILE), &list).map_err(|e| {
            tracing::error!("Error saving bookmarks for {}: {}", root.display(), e);
            e
        })
    }
}

impl Drop for WorkspaceStore {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Read a root's primary bookmark file, degrading to an empty list on any
/// failure.
fn load_bookmarks(root: &Path) -> Vec<Bookmark> {
    let path = root.join(HIDDEN_DIR).join(BOOKMARKS_FILE);
    match fs::read_to_string(&path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Error parsing bookmarks in {}: {}", path.display(), e);
                Vec::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            tracing::warn!("Error loading bookmarks from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Pretty-print `value` to `path`, creating the parent directory on demand.
fn write_pretty<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
