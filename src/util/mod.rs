//! Utility helpers shared across feature modules.

pub mod timing;
