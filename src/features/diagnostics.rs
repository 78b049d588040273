//! Console diagnostics: uncaught page errors and page load time.

#[cfg(test)]
#[path = "diagnostics_test.rs"]
mod diagnostics_test;

use std::rc::Rc;

use crate::env::{Document, DomEvent, EventKind, Handled, Navigation, PageContext};

pub fn error_log_line(message: Option<&str>) -> String {
    format!("page error: {}", message.unwrap_or("unknown error"))
}

/// Load time line, when the navigation entry has one.
pub fn load_time_line(navigation: &dyn Navigation) -> Option<String> {
    navigation.load_time_ms().map(|ms| format!("Page load time: {ms} ms"))
}

pub fn initialize_diagnostics<D: Document>(ctx: &PageContext<D>) {
    ctx.document.listen(
        None,
        EventKind::Error,
        Rc::new(|event: &DomEvent<D::Element>| {
            leptos::logging::error!("{}", error_log_line(event.message.as_deref()));
            Handled::Continue
        }),
    );

    let navigation = Rc::clone(&ctx.navigation);
    let scheduler = Rc::clone(&ctx.scheduler);
    ctx.document.listen(
        None,
        EventKind::Load,
        Rc::new(move |_: &DomEvent<D::Element>| {
            // loadEventEnd is only filled in after the load handlers return.
            let navigation = Rc::clone(&navigation);
            scheduler.set_timeout(
                0,
                Box::new(move || {
                    if let Some(line) = load_time_line(&*navigation) {
                        leptos::logging::log!("{line}");
                    }
                }),
            );
            Handled::Continue
        }),
    );
}
