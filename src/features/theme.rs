//! Light/dark theme resolution and persistence.
//!
//! Reads the stored preference from storage and applies a `data-theme`
//! attribute to the `<html>` element. Precedence at startup: stored
//! preference, then the OS dark-mode query, then no attribute (light).
//! While nothing is stored, OS preference changes are tracked live.
//!
//! TRADE-OFFS
//! ==========
//! Only an explicit toggle writes storage. OS-driven updates touch the
//! attribute alone, so a later OS flip is still followed.

#[cfg(test)]
#[path = "theme_test.rs"]
mod theme_test;

use crate::env::{Document, Element, PageContext, Storage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Read the explicit preference. Unrecognized values count as unset.
pub fn stored_preference(storage: &dyn Storage, key: &str) -> Option<Theme> {
    let raw = storage.get(key)?;
    let theme = Theme::parse(&raw);
    if theme.is_none() {
        leptos::logging::warn!("ignoring unrecognized stored theme {raw:?}");
    }
    theme
}

/// Startup resolution; `None` leaves the document unthemed (light).
pub fn resolve_theme(stored: Option<Theme>, prefers_dark: bool) -> Option<Theme> {
    stored.or(prefers_dark.then_some(Theme::Dark))
}

fn apply<D: Document>(ctx: &PageContext<D>, theme: Theme) {
    if let Some(root) = ctx.document.root() {
        root.set_attribute(&ctx.config.theme_attribute, theme.as_str());
    }
}

/// Theme currently shown: the root attribute, defaulting to light.
pub fn current_theme<D: Document>(ctx: &PageContext<D>) -> Theme {
    ctx.document
        .root()
        .and_then(|root| root.attribute(&ctx.config.theme_attribute))
        .and_then(|raw| Theme::parse(&raw))
        .unwrap_or(Theme::Light)
}

pub fn initialize_theme<D: Document>(ctx: &PageContext<D>) {
    let key = &ctx.config.theme_storage_key;
    if let Some(theme) = resolve_theme(stored_preference(&*ctx.storage, key), ctx.color_scheme.prefers_dark()) {
        apply(ctx, theme);
    }

    let listener_ctx = ctx.clone();
    ctx.color_scheme.on_change(Box::new(move |dark| {
        if stored_preference(&*listener_ctx.storage, &listener_ctx.config.theme_storage_key).is_none() {
            apply(&listener_ctx, Theme::from_dark(dark));
        }
    }));
}

/// Flip the theme, persist it as the explicit preference, and apply it.
pub fn toggle_theme<D: Document>(ctx: &PageContext<D>) -> Theme {
    let next = current_theme(ctx).toggled();
    apply(ctx, next);
    if let Err(e) = ctx.storage.set(&ctx.config.theme_storage_key, next.as_str()) {
        leptos::logging::warn!("{}: theme preference not saved: {e}", e.code());
    }
    next
}
