//! Site configuration: selectors, attribute names, paths and delays.
//!
//! SYSTEM CONTEXT
//! ==============
//! The templating layer owns the markup; this struct is the attribute and
//! selector contract with it. Defaults match the shipped templates, and a page
//! may override any subset through a JSON `site-config` script element.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::Deserialize;

use crate::error::PageError;

/// Id of the optional `<script type="application/json">` override element.
pub const CONFIG_ELEMENT_ID: &str = "site-config";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteConfig {
    pub search_input: String,
    pub search_form: String,
    pub search_clear: String,
    pub search_path: String,
    pub search_debounce_ms: u32,
    pub search_min_query_len: usize,

    pub copy_attribute: String,
    pub share_attribute: String,
    pub copy_success_class: String,
    pub copy_success_label: String,
    pub copy_feedback_ms: u32,

    pub reveal_selectors: Vec<String>,
    pub reveal_class: String,
    pub reveal_threshold: f64,
    pub reveal_root_margin: String,

    pub theme_storage_key: String,
    pub theme_attribute: String,

    pub home_path: String,
    pub random_path: String,
    pub proverb_path_prefix: String,

    pub mobile_user_agents: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search_input: ".search-input".to_owned(),
            search_form: ".search-form".to_owned(),
            search_clear: ".search-clear".to_owned(),
            search_path: "/search".to_owned(),
            search_debounce_ms: 300,
            search_min_query_len: 2,

            copy_attribute: "data-copy".to_owned(),
            share_attribute: "data-share".to_owned(),
            copy_success_class: "copy-success".to_owned(),
            copy_success_label: "Copied!".to_owned(),
            copy_feedback_ms: 2000,

            reveal_selectors: [".card", ".proverb-card", ".category-card", ".stat-card"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            reveal_class: "fade-in".to_owned(),
            reveal_threshold: 0.1,
            reveal_root_margin: "0px 0px -50px 0px".to_owned(),

            theme_storage_key: "theme".to_owned(),
            theme_attribute: "data-theme".to_owned(),

            home_path: "/".to_owned(),
            random_path: "/random".to_owned(),
            proverb_path_prefix: "/proverbs/".to_owned(),

            mobile_user_agents: ["Android", "iPhone", "iPad", "iPod", "BlackBerry", "IEMobile", "Opera Mini"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl SiteConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(raw: &str) -> Result<Self, PageError> {
        serde_json::from_str(raw).map_err(PageError::InvalidConfig)
    }

    /// Like [`SiteConfig::from_json`], but a missing or malformed override
    /// logs a warning and yields the defaults.
    pub fn from_json_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        match Self::from_json(raw) {
            Ok(config) => config,
            Err(e) => {
                leptos::logging::warn!("{}: {e}; using default site config", e.code());
                Self::default()
            }
        }
    }

    /// Attribute selector for copy buttons, e.g. `[data-copy]`.
    pub fn copy_selector(&self) -> String {
        format!("[{}]", self.copy_attribute)
    }

    /// Attribute selector for share buttons, e.g. `[data-share]`.
    pub fn share_selector(&self) -> String {
        format!("[{}]", self.share_attribute)
    }

    /// Comma-joined selector list for reveal targets.
    pub fn reveal_selector(&self) -> String {
        self.reveal_selectors.join(", ")
    }

    /// Absolute link to a single proverb.
    pub fn proverb_url(&self, origin: &str, id: &str) -> String {
        format!("{}{}{id}", origin.trim_end_matches('/'), self.proverb_path_prefix)
    }
}
