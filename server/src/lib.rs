//! Bookmarker LSP Server Library
//!
//! This crate implements the host-side backend of the Bookmarker
//! extension: workspace-scoped bookmark storage behind an LSP server, with
//! a custom request surface for the tree view, editor decorations and the
//! canvas webview.

pub mod backend;
pub mod custom_requests;
pub mod error;
pub mod handlers;

pub use backend::BookmarkBackend;
pub use error::LspError;
