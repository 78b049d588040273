//! Smooth scrolling for in-page `#fragment` links.

#[cfg(test)]
#[path = "anchors_test.rs"]
mod anchors_test;

use std::rc::Rc;

use crate::env::{Document, DomEvent, Element, EventKind, Handled, PageContext};

const ANCHOR_SELECTOR: &str = "a[href^=\"#\"]";

pub fn handle_anchor_click<D: Document>(document: &D, target: Option<&D::Element>) -> Handled {
    let Some(link) = target.and_then(|t| t.closest(ANCHOR_SELECTOR)) else {
        return Handled::Continue;
    };
    let href = link.attribute("href").unwrap_or_default();
    // A bare "#" is not a valid selector.
    if href.len() > 1 {
        if let Some(destination) = document.query(&href) {
            destination.scroll_into_view();
        }
    }
    Handled::PreventDefault
}

pub fn initialize_smooth_scroll<D: Document>(ctx: &PageContext<D>) {
    let document = Rc::clone(&ctx.document);
    ctx.document.listen(
        None,
        EventKind::Click,
        Rc::new(move |event: &DomEvent<D::Element>| handle_anchor_click(&*document, event.target.as_ref())),
    );
}
