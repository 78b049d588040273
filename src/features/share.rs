//! Native share sheet on mobile, clipboard copy everywhere else.

#[cfg(test)]
#[path = "share_test.rs"]
mod share_test;

use std::rc::Rc;

use crate::env::{Document, DomEvent, Element, EventKind, Handled, PageContext, SharePayload};
use crate::features::copy::{CopyOutcome, Copier};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    Native,
    Copied(CopyOutcome),
}

/// Case-insensitive match of the user agent against the mobile tokens.
pub fn is_mobile_user_agent(user_agent: &str, tokens: &[String]) -> bool {
    let user_agent = user_agent.to_ascii_lowercase();
    tokens.iter().any(|token| user_agent.contains(&token.to_ascii_lowercase()))
}

pub struct Sharer<D: Document> {
    ctx: PageContext<D>,
    copier: Copier<D>,
}

impl<D: Document> Clone for Sharer<D> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), copier: self.copier.clone() }
    }
}

impl<D: Document> Sharer<D> {
    pub fn new(ctx: PageContext<D>, copier: Copier<D>) -> Self {
        Self { ctx, copier }
    }

    fn uses_native_sheet(&self) -> bool {
        self.ctx.share.can_share()
            && is_mobile_user_agent(&self.ctx.navigation.user_agent(), &self.ctx.config.mobile_user_agents)
    }

    pub async fn share_content(&self, payload: &SharePayload) -> ShareOutcome {
        if self.uses_native_sheet() {
            match self.ctx.share.share(payload).await {
                Ok(()) => return ShareOutcome::Native,
                Err(e) => leptos::logging::log!("{}: error sharing: {e}", e.code()),
            }
        }
        self.fallback_share(payload).await
    }

    async fn fallback_share(&self, payload: &SharePayload) -> ShareOutcome {
        let target = self.ctx.document.active_element();
        let outcome = self.copier.copy_text_to_clipboard(&payload.fallback_text(), target.as_ref()).await;
        ShareOutcome::Copied(outcome)
    }

    /// Share the JSON `data-share` payload of any clicked share button.
    pub fn install_click_handler(&self) {
        let sharer = self.clone();
        let selector = self.ctx.config.share_selector();
        let attribute = self.ctx.config.share_attribute.clone();
        self.ctx.document.listen(
            None,
            EventKind::Click,
            Rc::new(move |event: &DomEvent<D::Element>| {
                let Some(button) = event.target.as_ref().and_then(|t| t.closest(&selector)) else {
                    return Handled::Continue;
                };
                let raw = button.attribute(&attribute).unwrap_or_default();
                let payload = match SharePayload::from_json(&raw) {
                    Ok(payload) => payload,
                    Err(e) => {
                        leptos::logging::warn!("{}: {e}", e.code());
                        return Handled::Continue;
                    }
                };
                let task = sharer.clone();
                sharer.ctx.scheduler.spawn(Box::pin(async move {
                    task.share_content(&payload).await;
                }));
                Handled::Continue
            }),
        );
    }
}
