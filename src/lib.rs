//! Browser-side enhancements for the Go proverbs site.
//!
//! The server renders every page; this crate layers interactivity on top:
//! debounced search, copy and share buttons, keyboard shortcuts, reveal
//! animations, theme persistence, smooth anchor scrolling and page
//! diagnostics. Feature logic is written against [`env::PageContext`] so it
//! runs natively under test; the `hydrate` feature binds it to `web-sys` and
//! exports the WASM entry point.

pub mod app;
pub mod config;
pub mod env;
pub mod error;
pub mod features;
pub mod util;

#[cfg(feature = "hydrate")]
pub mod entry;
