//! Clipboard copy with a legacy fallback and transient button feedback.
//!
//! DESIGN
//! ======
//! The async clipboard is tried first when it exists in a secure context. If
//! it is missing or rejects, the text goes through an off-screen `textarea`
//! and the synchronous copy command. Failures are logged and absorbed; the
//! only visible symptom is that the "Copied!" feedback does not appear.
//!
//! Feedback reverts after a fixed delay. A repeated success on the same
//! button cancels the pending revert and re-arms it, keeping the label that
//! was captured before the first swap.

#[cfg(test)]
#[path = "copy_test.rs"]
mod copy_test;

use std::cell::RefCell;
use std::rc::Rc;

use crate::env::{Document, DomEvent, Element, EventKind, Handled, PageContext, TimerId};
use crate::error::PageError;

const OFFSCREEN_STYLE: &str = "position:fixed;left:-999999px;top:-999999px";
const DEFAULT_TITLE: &str = "Copy";

/// Which path delivered the text, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    Clipboard,
    Legacy,
    Failed,
}

struct PendingRevert<E> {
    target: E,
    timer: TimerId,
    title: String,
    text: String,
}

/// Copies text and drives the success feedback for the page.
pub struct Copier<D: Document> {
    ctx: PageContext<D>,
    pending: Rc<RefCell<Vec<PendingRevert<D::Element>>>>,
}

impl<D: Document> Clone for Copier<D> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), pending: Rc::clone(&self.pending) }
    }
}

impl<D: Document> Copier<D> {
    pub fn new(ctx: PageContext<D>) -> Self {
        Self { ctx, pending: Rc::new(RefCell::new(Vec::new())) }
    }

    /// Place `text` on the clipboard and flash feedback on `target`.
    pub async fn copy_text_to_clipboard(&self, text: &str, target: Option<&D::Element>) -> CopyOutcome {
        if self.ctx.clipboard.is_available() {
            match self.ctx.clipboard.write_text(text).await {
                Ok(()) => {
                    self.show_success(target);
                    return CopyOutcome::Clipboard;
                }
                Err(e) => leptos::logging::error!("{}: failed to copy text: {e}", e.code()),
            }
        }
        self.fallback_copy(text, target)
    }

    fn fallback_copy(&self, text: &str, target: Option<&D::Element>) -> CopyOutcome {
        match legacy_copy(&*self.ctx.document, text) {
            Ok(()) => {
                self.show_success(target);
                CopyOutcome::Legacy
            }
            Err(e) => {
                leptos::logging::error!("{}: fallback copy failed: {e}", e.code());
                CopyOutcome::Failed
            }
        }
    }

    fn show_success(&self, target: Option<&D::Element>) {
        let Some(target) = target else {
            return;
        };
        let config = &self.ctx.config;

        // Keep the labels captured before the first swap when re-arming.
        let previous = {
            let mut pending = self.pending.borrow_mut();
            pending
                .iter()
                .position(|p| &p.target == target)
                .map(|index| pending.remove(index))
        };
        let (title, text) = match previous {
            Some(p) => {
                self.ctx.scheduler.clear_timeout(p.timer);
                (p.title, p.text)
            }
            None => (original_title(target), target.text_content()),
        };

        target.set_attribute("title", &config.copy_success_label);
        if swaps_label(target) {
            target.set_text_content(&config.copy_success_label);
        }
        target.add_class(&config.copy_success_class);

        let pending = Rc::clone(&self.pending);
        let element = target.clone();
        let class = config.copy_success_class.clone();
        let timer = self.ctx.scheduler.set_timeout(
            config.copy_feedback_ms,
            Box::new(move || {
                let restored = {
                    let mut pending = pending.borrow_mut();
                    pending
                        .iter()
                        .position(|p| p.target == element)
                        .map(|index| pending.remove(index))
                };
                let Some(restored) = restored else {
                    return;
                };
                element.set_attribute("title", &restored.title);
                if swaps_label(&element) {
                    element.set_text_content(&restored.text);
                }
                element.remove_class(&class);
            }),
        );
        self.pending.borrow_mut().push(PendingRevert { target: target.clone(), timer, title, text });
    }

    /// Copy the `data-copy` payload of any clicked copy button.
    pub fn install_click_handler(&self) {
        let copier = self.clone();
        let selector = self.ctx.config.copy_selector();
        let attribute = self.ctx.config.copy_attribute.clone();
        self.ctx.document.listen(
            None,
            EventKind::Click,
            Rc::new(move |event: &DomEvent<D::Element>| {
                let Some(button) = event.target.as_ref().and_then(|t| t.closest(&selector)) else {
                    return Handled::Continue;
                };
                let text = button.attribute(&attribute).unwrap_or_default();
                let copier_task = copier.clone();
                copier.ctx.scheduler.spawn(Box::pin(async move {
                    copier_task.copy_text_to_clipboard(&text, Some(&button)).await;
                }));
                Handled::Continue
            }),
        );
    }
}

/// Copy through an off-screen `textarea` and the legacy copy command. The
/// temporary element is removed whether or not the command succeeds.
pub fn legacy_copy<D: Document>(document: &D, text: &str) -> Result<(), PageError> {
    let area = document.create_element("textarea").ok_or(PageError::Unavailable("document.createElement"))?;
    area.set_value(text);
    area.set_attribute("style", OFFSCREEN_STYLE);
    document.append_to_body(&area)?;
    area.focus();
    area.select();
    let result = document.exec_copy();
    document.remove(&area);
    result
}

fn original_title<E: Element>(target: &E) -> String {
    target
        .attribute("title")
        .filter(|t| !t.is_empty())
        .or_else(|| target.attribute("aria-label").filter(|l| !l.is_empty()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned())
}

/// Icon buttons keep their markup; only text buttons get the label swap.
fn swaps_label<E: Element>(target: &E) -> bool {
    !target.text_content().is_empty() && !target.has_descendant("svg")
}
