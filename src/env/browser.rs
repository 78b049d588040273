//! `web-sys` implementation of the page context.
//!
//! Capability detection happens once, when the context is built: missing
//! APIs get the null implementations from the parent module. Listener and
//! observer closures live for the rest of the page and are leaked on purpose.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    ErrorEvent, HtmlDocument, HtmlElement, HtmlInputElement, HtmlTextAreaElement, IntersectionObserverEntry,
    KeyboardEvent, MediaQueryList, PerformanceNavigationTiming, Window,
};

use super::*;
use crate::util::timing::TimerSlots;

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

fn js_error(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{value:?}"))
}

fn has_property(target: &JsValue, name: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

fn js_object(fields: &[(&str, JsValue)]) -> Object {
    let object = Object::new();
    for (name, value) in fields {
        let _ = Reflect::set(&object, &JsValue::from_str(name), value);
    }
    object
}

// =============================================================================
// DOM
// =============================================================================

#[derive(Clone, Debug)]
pub struct BrowserElement(web_sys::Element);

impl PartialEq for BrowserElement {
    fn eq(&self, other: &Self) -> bool {
        AsRef::<JsValue>::as_ref(&self.0) == AsRef::<JsValue>::as_ref(&other.0)
    }
}

impl BrowserElement {
    fn html(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }
}

impl Element for BrowserElement {
    fn tag_name(&self) -> String {
        self.0.tag_name().to_ascii_uppercase()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let _ = self.0.set_attribute(name, value);
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn add_class(&self, class: &str) {
        let _ = self.0.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.0.class_list().remove_1(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn is_content_editable(&self) -> bool {
        self.html().is_some_and(|el| el.content_editable() == "true")
    }

    fn closest(&self, selector: &str) -> Option<Self> {
        self.0.closest(selector).ok().flatten().map(Self)
    }

    fn has_descendant(&self, selector: &str) -> bool {
        self.0.query_selector(selector).ok().flatten().is_some()
    }

    fn value(&self) -> String {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn focus(&self) {
        if let Some(el) = self.html() {
            let _ = el.focus();
        }
    }

    fn blur(&self) {
        if let Some(el) = self.html() {
            let _ = el.blur();
        }
    }

    fn select(&self) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.select();
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.select();
        }
    }

    fn scroll_into_view(&self) {
        let options = js_object(&[("behavior", JsValue::from_str("smooth")), ("block", JsValue::from_str("start"))]);
        self.0.scroll_into_view_with_scroll_into_view_options(options.unchecked_ref());
    }
}

pub struct BrowserObserver(web_sys::IntersectionObserver);

impl VisibilityObserver<BrowserElement> for BrowserObserver {
    fn observe(&self, element: &BrowserElement) {
        self.0.observe(&element.0);
    }

    fn unobserve(&self, element: &BrowserElement) {
        self.0.unobserve(&element.0);
    }
}

pub struct BrowserDocument {
    window: Window,
    document: web_sys::Document,
}

fn to_dom_event(kind: EventKind, event: &web_sys::Event) -> DomEvent<BrowserElement> {
    let target = event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(BrowserElement);
    let mut out = DomEvent::new(kind, target);
    if let Some(key_event) = event.dyn_ref::<KeyboardEvent>() {
        out.key = Some(KeyPress {
            key: key_event.key(),
            ctrl: key_event.ctrl_key(),
            meta: key_event.meta_key(),
        });
    }
    if let Some(error_event) = event.dyn_ref::<ErrorEvent>() {
        out.message = Some(error_event.message());
    }
    out
}

impl Document for BrowserDocument {
    type Element = BrowserElement;

    fn query(&self, selector: &str) -> Option<BrowserElement> {
        self.document.query_selector(selector).ok().flatten().map(BrowserElement)
    }

    fn query_all(&self, selector: &str) -> Vec<BrowserElement> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(BrowserElement)
            .collect()
    }

    fn active_element(&self) -> Option<BrowserElement> {
        self.document.active_element().map(BrowserElement)
    }

    fn root(&self) -> Option<BrowserElement> {
        self.document.document_element().map(BrowserElement)
    }

    fn create_element(&self, tag: &str) -> Option<BrowserElement> {
        self.document.create_element(tag).ok().map(BrowserElement)
    }

    fn append_to_body(&self, element: &BrowserElement) -> Result<(), PageError> {
        let body = self.document.body().ok_or(PageError::Unavailable("document.body"))?;
        body.append_child(&element.0)
            .map(|_| ())
            .map_err(|e| PageError::Rejected(js_error(&e)))
    }

    fn remove(&self, element: &BrowserElement) {
        element.0.remove();
    }

    fn exec_copy(&self) -> Result<(), PageError> {
        let html = self
            .document
            .dyn_ref::<HtmlDocument>()
            .ok_or(PageError::Unavailable("document.execCommand"))?;
        match html.exec_command("copy") {
            Ok(true) => Ok(()),
            Ok(false) => Err(PageError::CommandFailed("copy command not enabled".to_owned())),
            Err(e) => Err(PageError::CommandFailed(js_error(&e))),
        }
    }

    fn listen(&self, target: Option<&BrowserElement>, kind: EventKind, listener: Listener<BrowserElement>) {
        let event_target: &web_sys::EventTarget = match (target, kind) {
            (Some(element), _) => element.0.as_ref(),
            (None, EventKind::Error | EventKind::Load) => self.window.as_ref(),
            (None, _) => self.document.as_ref(),
        };
        let cb = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if listener(&to_dom_event(kind, &event)) == Handled::PreventDefault {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        if let Err(e) = event_target.add_event_listener_with_callback(kind.as_str(), cb.as_ref().unchecked_ref()) {
            leptos::logging::warn!("failed to listen for {}: {}", kind.as_str(), js_error(&e));
            return;
        }
        cb.forget();
    }

    fn observe_visibility(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback<BrowserElement>,
    ) -> Option<Rc<dyn VisibilityObserver<BrowserElement>>> {
        if !has_property(&self.window, "IntersectionObserver") {
            return None;
        }
        let cb = Closure::wrap(Box::new(move |entries: Array, observer: web_sys::IntersectionObserver| {
            let entries: Vec<Intersection<BrowserElement>> = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| Intersection {
                    target: BrowserElement(entry.target()),
                    is_intersecting: entry.is_intersecting(),
                })
                .collect();
            callback(&entries, &BrowserObserver(observer));
        }) as Box<dyn FnMut(Array, web_sys::IntersectionObserver)>);

        let init = js_object(&[
            ("threshold", JsValue::from_f64(options.threshold)),
            ("rootMargin", JsValue::from_str(&options.root_margin)),
        ]);
        let observer = match web_sys::IntersectionObserver::new_with_options(cb.as_ref().unchecked_ref(), init.unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                leptos::logging::warn!("IntersectionObserver construction failed: {}", js_error(&e));
                return None;
            }
        };
        cb.forget();
        Some(Rc::new(BrowserObserver(observer)))
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

pub struct BrowserClipboard {
    navigator: web_sys::Navigator,
}

impl Clipboard for BrowserClipboard {
    fn is_available(&self) -> bool {
        true
    }

    fn write_text(&self, text: &str) -> LocalBoxFuture<'_, Result<(), PageError>> {
        let text = text.to_owned();
        Box::pin(async move {
            let clipboard = Reflect::get(&self.navigator, &JsValue::from_str("clipboard"))
                .ok()
                .and_then(|c| c.dyn_into::<web_sys::Clipboard>().ok())
                .ok_or(PageError::Unavailable("navigator.clipboard"))?;
            JsFuture::from(clipboard.write_text(&text))
                .await
                .map(|_| ())
                .map_err(|e| PageError::Rejected(js_error(&e)))
        })
    }
}

pub struct BrowserShare {
    navigator: web_sys::Navigator,
}

impl Share for BrowserShare {
    fn can_share(&self) -> bool {
        true
    }

    fn share(&self, payload: &SharePayload) -> LocalBoxFuture<'_, Result<(), PageError>> {
        let data = js_object(&[
            ("title", JsValue::from_str(&payload.title)),
            ("text", JsValue::from_str(&payload.text)),
            ("url", JsValue::from_str(&payload.url)),
        ]);
        Box::pin(async move {
            let share = Reflect::get(&self.navigator, &JsValue::from_str("share"))
                .ok()
                .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
                .ok_or(PageError::Unavailable("navigator.share"))?;
            let promise = share
                .call1(&self.navigator, &data)
                .map_err(|e| PageError::Rejected(js_error(&e)))?
                .dyn_into::<js_sys::Promise>()
                .map_err(|_| PageError::Rejected("navigator.share returned no promise".to_owned()))?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| PageError::Rejected(js_error(&e)))
        })
    }
}

pub struct BrowserStorage(web_sys::Storage);

impl Storage for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PageError> {
        self.0.set_item(key, value).map_err(|e| PageError::Rejected(js_error(&e)))
    }
}

pub struct BrowserColorScheme(MediaQueryList);

impl ColorScheme for BrowserColorScheme {
    fn prefers_dark(&self) -> bool {
        self.0.matches()
    }

    fn on_change(&self, callback: Box<dyn Fn(bool)>) {
        let query = self.0.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            callback(query.matches());
        }) as Box<dyn FnMut(web_sys::Event)>);
        if self
            .0
            .add_event_listener_with_callback("change", cb.as_ref().unchecked_ref())
            .is_ok()
        {
            cb.forget();
        }
    }
}

pub struct BrowserNavigation {
    window: Window,
}

impl Navigation for BrowserNavigation {
    fn user_agent(&self) -> String {
        self.window.navigator().user_agent().unwrap_or_default()
    }

    fn pathname(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn origin(&self) -> String {
        self.window.location().origin().unwrap_or_default()
    }

    fn assign(&self, path: &str) {
        if let Err(e) = self.window.location().set_href(path) {
            leptos::logging::warn!("navigation to {path} failed: {}", js_error(&e));
        }
    }

    fn load_time_ms(&self) -> Option<f64> {
        let performance = self.window.performance()?;
        let entry = performance
            .get_entries_by_type("navigation")
            .get(0)
            .dyn_into::<PerformanceNavigationTiming>()
            .ok()?;
        Some(entry.load_event_end() - entry.load_event_start())
    }
}

/// `setTimeout`-backed scheduler. Handle bookkeeping lives in
/// [`TimerSlots`]; dropping a pending `Timeout` cancels it.
#[derive(Default)]
pub struct BrowserScheduler {
    timers: Rc<TimerSlots<Timeout>>,
}

impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self.timers.next_id();
        let timers = Rc::clone(&self.timers);
        let timeout = Timeout::new(delay_ms, move || {
            timers.fired(id);
            callback();
        });
        self.timers.insert(id, timeout);
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        drop(self.timers.cancel(id));
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Build the context for the current window; `None` outside a browser page.
/// Site configuration is left at its defaults until
/// [`PageContext::with_document_config`] runs on the parsed document.
pub fn context() -> Option<PageContext<BrowserDocument>> {
    let window = web_sys::window()?;
    let document = window.document()?;
    let navigator = window.navigator();

    let clipboard: Rc<dyn Clipboard> = if window.is_secure_context() && has_property(&navigator, "clipboard") {
        Rc::new(BrowserClipboard { navigator: navigator.clone() })
    } else {
        Rc::new(NoClipboard)
    };
    let share: Rc<dyn Share> = if has_property(&navigator, "share") {
        Rc::new(BrowserShare { navigator })
    } else {
        Rc::new(NoShare)
    };
    let storage: Rc<dyn Storage> = match window.local_storage() {
        Ok(Some(storage)) => Rc::new(BrowserStorage(storage)),
        _ => Rc::new(NoStorage),
    };
    let color_scheme: Rc<dyn ColorScheme> = match window.match_media(DARK_QUERY) {
        Ok(Some(query)) => Rc::new(BrowserColorScheme(query)),
        _ => Rc::new(NoColorScheme),
    };

    Some(
        PageContext::new(
            Rc::new(BrowserDocument { window: window.clone(), document }),
            Rc::new(BrowserNavigation { window }),
            Rc::new(BrowserScheduler::default()),
        )
        .with_clipboard(clipboard)
        .with_share(share)
        .with_storage(storage)
        .with_color_scheme(color_scheme),
    )
}

/// Run `init` once the DOM is parsed.
pub fn on_dom_ready(init: impl FnOnce() + 'static) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.ready_state() != "loading" {
        init();
        return;
    }
    let cb = Closure::once_into_js(init);
    if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", cb.unchecked_ref()) {
        leptos::logging::warn!("failed to wait for DOMContentLoaded: {}", js_error(&e));
    }
}
