//! Independent page features.
//!
//! ARCHITECTURE
//! ============
//! Each feature owns one concern and installs its own listeners from a
//! [`PageContext`](crate::env::PageContext). Features share no state except
//! the copier, which the share fallback reuses.

pub mod anchors;
pub mod copy;
pub mod diagnostics;
pub mod reveal;
pub mod search;
pub mod share;
pub mod shortcuts;
pub mod theme;
