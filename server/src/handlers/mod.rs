//! Request handlers for the Bookmarker command surface and canvas view.

pub mod bookmarks;
pub mod canvas;

pub use bookmarks::*;
pub use canvas::*;
