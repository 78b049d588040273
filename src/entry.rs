//! WASM entry point and the functions templates call from inline handlers.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::app::App;
use crate::env::VisibilityObserver;
use crate::env::browser::{self, BrowserDocument, BrowserElement};

struct Installed {
    app: App<BrowserDocument>,
    _reveal: Option<Rc<dyn VisibilityObserver<BrowserElement>>>,
}

thread_local! {
    static INSTALLED: RefCell<Option<Installed>> = const { RefCell::new(None) };
}

fn with_app(f: impl FnOnce(&App<BrowserDocument>)) {
    INSTALLED.with(|slot| match slot.borrow().as_ref() {
        Some(installed) => f(&installed.app),
        None => leptos::logging::warn!("page enhancements are not initialized yet"),
    });
}

/// Template ids arrive either as strings or as numbers.
fn id_string(id: &JsValue) -> Option<String> {
    id.as_string().or_else(|| id.as_f64().map(|n| n.to_string()))
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    browser::on_dom_ready(|| {
        let Some(ctx) = browser::context() else {
            leptos::logging::warn!("no window or document; page enhancements disabled");
            return;
        };
        let (app, reveal) = App::start(ctx);
        INSTALLED.with(|slot| *slot.borrow_mut() = Some(Installed { app, _reveal: reveal }));
    });
}

#[wasm_bindgen(js_name = copyProverbLink)]
pub fn copy_proverb_link(id: JsValue) {
    let Some(id) = id_string(&id) else {
        leptos::logging::warn!("copyProverbLink: proverb id must be a string or number");
        return;
    };
    with_app(|app| {
        app.spawn(move |app| async move {
            app.copy_proverb_link(&id).await;
        });
    });
}

#[wasm_bindgen(js_name = shareProverb)]
pub fn share_proverb(id: JsValue, title: String) {
    let Some(id) = id_string(&id) else {
        leptos::logging::warn!("shareProverb: proverb id must be a string or number");
        return;
    };
    with_app(|app| {
        app.spawn(move |app| async move {
            app.share_proverb(&id, &title).await;
        });
    });
}

#[wasm_bindgen(js_name = clearSearch)]
pub fn clear_search() {
    with_app(App::clear_search);
}

#[wasm_bindgen(js_name = toggleTheme)]
pub fn toggle_theme() {
    with_app(|app| {
        app.toggle_theme();
    });
}
