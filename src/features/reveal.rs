//! One-shot scroll reveal for card elements.
//!
//! Cards get the reveal class the first time they enter the viewport and are
//! then unobserved. Without a visibility observer the cards keep their
//! default styling.

#[cfg(test)]
#[path = "reveal_test.rs"]
mod reveal_test;

use std::rc::Rc;

use crate::env::{Document, Element, Intersection, ObserverOptions, PageContext, VisibilityObserver};

pub fn initialize_animations<D: Document>(ctx: &PageContext<D>) -> Option<Rc<dyn VisibilityObserver<D::Element>>> {
    let config = &ctx.config;
    let options = ObserverOptions {
        threshold: config.reveal_threshold,
        root_margin: config.reveal_root_margin.clone(),
    };
    let class = config.reveal_class.clone();
    let callback = Rc::new(
        move |entries: &[Intersection<D::Element>], observer: &dyn VisibilityObserver<D::Element>| {
            for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                entry.target.add_class(&class);
                observer.unobserve(&entry.target);
            }
        },
    );

    let Some(observer) = ctx.document.observe_visibility(&options, callback) else {
        leptos::logging::log!("visibility observer unavailable; reveal animations disabled");
        return None;
    };
    for element in ctx.document.query_all(&config.reveal_selector()) {
        observer.observe(&element);
    }
    Some(observer)
}
