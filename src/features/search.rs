//! Search box conveniences.
//!
//! The search itself is a plain form submission handled by the server; this
//! module only manages focus, clearing, debounced input, and blank-query
//! submissions.

#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;

use std::rc::Rc;

use crate::env::{Document, DomEvent, Element, EventKind, Handled, PageContext};
use crate::util::timing::Debounce;

/// Trimmed query worth acting on, or `None` when it is too short.
pub fn handle_search_input(raw: &str, min_len: usize) -> Option<String> {
    let query = raw.trim();
    if query.chars().count() < min_len {
        return None;
    }
    leptos::logging::log!("Search query: {query}");
    Some(query.to_owned())
}

/// Block submissions whose query is blank and put the cursor back.
pub fn guard_submit<E: Element>(input: Option<&E>) -> Handled {
    let Some(input) = input else {
        return Handled::Continue;
    };
    if input.value().trim().is_empty() {
        input.focus();
        return Handled::PreventDefault;
    }
    Handled::Continue
}

pub fn clear_search<E: Element>(input: &E) {
    input.set_value("");
    input.focus();
}

pub fn initialize_search<D: Document>(ctx: &PageContext<D>) {
    let config = &ctx.config;
    let document = &ctx.document;
    let input = ctx.search_input();

    if let Some(input) = &input {
        if ctx.navigation.pathname() == config.search_path && input.value().is_empty() {
            input.focus();
        }

        let min_len = config.search_min_query_len;
        let debounced = Debounce::new(Rc::clone(&ctx.scheduler), config.search_debounce_ms, false, move |value: String| {
            handle_search_input(&value, min_len);
        });
        let source = input.clone();
        document.listen(
            Some(input),
            EventKind::Input,
            Rc::new(move |_: &DomEvent<D::Element>| {
                debounced.call(source.value());
                Handled::Continue
            }),
        );

        if let Some(clear) = document.query(&config.search_clear) {
            let target = input.clone();
            document.listen(
                Some(&clear),
                EventKind::Click,
                Rc::new(move |_: &DomEvent<D::Element>| {
                    clear_search(&target);
                    Handled::Continue
                }),
            );
        }
    }

    if let Some(form) = document.query(&config.search_form) {
        document.listen(
            Some(&form),
            EventKind::Submit,
            Rc::new(move |_: &DomEvent<D::Element>| guard_submit(input.as_ref())),
        );
    }
}
