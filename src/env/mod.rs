//! Injectable page context: DOM access and browser capabilities.
//!
//! SYSTEM CONTEXT
//! ==============
//! Feature code never touches `web_sys` directly. It receives a
//! [`PageContext`] whose capabilities are trait objects, so each feature can
//! run against the real browser (`browser`, behind `hydrate`) or against the
//! in-memory page used by unit tests (`fake`).
//!
//! Absent capabilities are represented by null implementations
//! ([`NoClipboard`], [`NoShare`], [`NoStorage`], [`NoColorScheme`]) rather
//! than scattered feature checks.

#[cfg(feature = "hydrate")]
pub mod browser;
#[cfg(test)]
pub(crate) mod fake;

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Deserialize;

use crate::config::{CONFIG_ELEMENT_ID, SiteConfig};
use crate::error::PageError;

// =============================================================================
// DOM
// =============================================================================

/// A handle to a live DOM element. Handles are cheap to clone and compare by
/// node identity.
pub trait Element: Clone + PartialEq + 'static {
    /// Upper-case tag name, e.g. `INPUT`.
    fn tag_name(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn text_content(&self) -> String;
    fn set_text_content(&self, text: &str);
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    fn has_class(&self, class: &str) -> bool;
    /// `true` only when `contentEditable` is exactly `"true"`.
    fn is_content_editable(&self) -> bool;
    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, selector: &str) -> Option<Self>;
    /// Whether any descendant matches `selector`.
    fn has_descendant(&self, selector: &str) -> bool;
    /// Form control value; empty for elements without one.
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn focus(&self);
    fn blur(&self);
    /// Select the text of an input or text area.
    fn select(&self);
    /// Smoothly scroll this element to the top of the viewport.
    fn scroll_into_view(&self);
}

/// Events the page layer subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyDown,
    Input,
    Submit,
    /// Window-level uncaught error.
    Error,
    /// Window-level `load`.
    Load,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::KeyDown => "keydown",
            Self::Input => "input",
            Self::Submit => "submit",
            Self::Error => "error",
            Self::Load => "load",
        }
    }
}

/// A raw key press reduced to what the shortcut router needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn plain(key: &str) -> Self {
        Self { key: key.to_owned(), ..Self::default() }
    }

    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Event data handed to listeners.
#[derive(Clone, Debug)]
pub struct DomEvent<E> {
    pub kind: EventKind,
    pub target: Option<E>,
    pub key: Option<KeyPress>,
    /// Error message for [`EventKind::Error`].
    pub message: Option<String>,
}

impl<E> DomEvent<E> {
    pub fn new(kind: EventKind, target: Option<E>) -> Self {
        Self { kind, target, key: None, message: None }
    }
}

/// Listener verdict: whether the browser's default action should run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Handled {
    #[default]
    Continue,
    PreventDefault,
}

pub type Listener<E> = Rc<dyn Fn(&DomEvent<E>) -> Handled>;

/// Visibility-observer configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: String,
}

#[derive(Clone, Debug)]
pub struct Intersection<E> {
    pub target: E,
    pub is_intersecting: bool,
}

pub trait VisibilityObserver<E> {
    fn observe(&self, element: &E);
    fn unobserve(&self, element: &E);
}

pub type IntersectionCallback<E> = Rc<dyn Fn(&[Intersection<E>], &dyn VisibilityObserver<E>)>;

pub trait Document: 'static {
    type Element: Element;

    fn query(&self, selector: &str) -> Option<Self::Element>;
    fn query_all(&self, selector: &str) -> Vec<Self::Element>;
    fn active_element(&self) -> Option<Self::Element>;
    /// The `<html>` element.
    fn root(&self) -> Option<Self::Element>;
    fn create_element(&self, tag: &str) -> Option<Self::Element>;
    fn append_to_body(&self, element: &Self::Element) -> Result<(), PageError>;
    fn remove(&self, element: &Self::Element);
    /// Issue the synchronous legacy copy command for the current selection.
    fn exec_copy(&self) -> Result<(), PageError>;
    /// Subscribe to `kind` on `target`, or on the document (window for
    /// `Error`/`Load`) when `target` is `None`. Listeners live for the page.
    fn listen(&self, target: Option<&Self::Element>, kind: EventKind, listener: Listener<Self::Element>);
    /// Create a visibility observer; `None` when the platform has none.
    fn observe_visibility(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback<Self::Element>,
    ) -> Option<Rc<dyn VisibilityObserver<Self::Element>>>;
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Asynchronous, secure-context clipboard.
pub trait Clipboard {
    fn is_available(&self) -> bool;
    fn write_text(&self, text: &str) -> LocalBoxFuture<'_, Result<(), PageError>>;
}

/// Payload for the native share sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SharePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
}

impl SharePayload {
    pub fn from_json(raw: &str) -> Result<Self, PageError> {
        serde_json::from_str(raw).map_err(PageError::InvalidSharePayload)
    }

    /// Text copied when the share sheet is unavailable.
    pub fn fallback_text(&self) -> String {
        format!("{} - {}", self.title, self.url)
    }
}

/// Native share sheet.
pub trait Share {
    fn can_share(&self) -> bool;
    fn share(&self, payload: &SharePayload) -> LocalBoxFuture<'_, Result<(), PageError>>;
}

/// Client-side key-value storage.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PageError>;
}

/// OS-level `prefers-color-scheme: dark` media query.
pub trait ColorScheme {
    fn prefers_dark(&self) -> bool;
    /// Invoke `callback` with the new preference on every change.
    fn on_change(&self, callback: Box<dyn Fn(bool)>);
}

/// Location, user agent and top-level navigation.
pub trait Navigation {
    fn user_agent(&self) -> String;
    fn pathname(&self) -> String;
    fn origin(&self) -> String;
    /// Full-page navigation to `path`.
    fn assign(&self, path: &str);
    /// `loadEventEnd - loadEventStart` of the navigation entry, in ms.
    fn load_time_ms(&self) -> Option<f64>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u32);

/// Timers and local task spawning on the page's event loop.
pub trait Scheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId;
    fn clear_timeout(&self, id: TimerId);
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

// =============================================================================
// NULL CAPABILITIES
// =============================================================================

pub struct NoClipboard;

impl Clipboard for NoClipboard {
    fn is_available(&self) -> bool {
        false
    }

    fn write_text(&self, _text: &str) -> LocalBoxFuture<'_, Result<(), PageError>> {
        Box::pin(futures::future::ready(Err(PageError::Unavailable("navigator.clipboard"))))
    }
}

pub struct NoShare;

impl Share for NoShare {
    fn can_share(&self) -> bool {
        false
    }

    fn share(&self, _payload: &SharePayload) -> LocalBoxFuture<'_, Result<(), PageError>> {
        Box::pin(futures::future::ready(Err(PageError::Unavailable("navigator.share"))))
    }
}

pub struct NoStorage;

impl Storage for NoStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), PageError> {
        Err(PageError::Unavailable("localStorage"))
    }
}

pub struct NoColorScheme;

impl ColorScheme for NoColorScheme {
    fn prefers_dark(&self) -> bool {
        false
    }

    fn on_change(&self, _callback: Box<dyn Fn(bool)>) {}
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Everything a feature initializer may touch.
pub struct PageContext<D: Document> {
    pub document: Rc<D>,
    pub clipboard: Rc<dyn Clipboard>,
    pub share: Rc<dyn Share>,
    pub storage: Rc<dyn Storage>,
    pub color_scheme: Rc<dyn ColorScheme>,
    pub navigation: Rc<dyn Navigation>,
    pub scheduler: Rc<dyn Scheduler>,
    pub config: Rc<SiteConfig>,
}

impl<D: Document> Clone for PageContext<D> {
    fn clone(&self) -> Self {
        Self {
            document: Rc::clone(&self.document),
            clipboard: Rc::clone(&self.clipboard),
            share: Rc::clone(&self.share),
            storage: Rc::clone(&self.storage),
            color_scheme: Rc::clone(&self.color_scheme),
            navigation: Rc::clone(&self.navigation),
            scheduler: Rc::clone(&self.scheduler),
            config: Rc::clone(&self.config),
        }
    }
}

impl<D: Document> PageContext<D> {
    /// Context with every optional capability absent.
    pub fn new(document: Rc<D>, navigation: Rc<dyn Navigation>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            document,
            clipboard: Rc::new(NoClipboard),
            share: Rc::new(NoShare),
            storage: Rc::new(NoStorage),
            color_scheme: Rc::new(NoColorScheme),
            navigation,
            scheduler,
            config: Rc::new(SiteConfig::default()),
        }
    }

    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Rc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    #[must_use]
    pub fn with_share(mut self, share: Rc<dyn Share>) -> Self {
        self.share = share;
        self
    }

    #[must_use]
    pub fn with_storage(mut self, storage: Rc<dyn Storage>) -> Self {
        self.storage = storage;
        self
    }

    #[must_use]
    pub fn with_color_scheme(mut self, color_scheme: Rc<dyn ColorScheme>) -> Self {
        self.color_scheme = color_scheme;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SiteConfig) -> Self {
        self.config = Rc::new(config);
        self
    }

    /// Load the site configuration from the `site-config` element. The
    /// element only exists once the document has been parsed, so this runs at
    /// startup rather than when the context is built.
    #[must_use]
    pub fn with_document_config(self) -> Self {
        let raw = self
            .document
            .query(&format!("#{CONFIG_ELEMENT_ID}"))
            .map(|element| element.text_content());
        self.with_config(SiteConfig::from_json_or_default(raw.as_deref()))
    }

    /// The search input, if the page has one.
    pub fn search_input(&self) -> Option<D::Element> {
        self.document.query(&self.config.search_input)
    }
}
