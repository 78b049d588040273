//! Page application: runs every feature initializer once and exposes the
//! helpers templates call directly.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::rc::Rc;

use crate::env::{Document, PageContext, SharePayload, VisibilityObserver};
use crate::features::copy::{CopyOutcome, Copier};
use crate::features::share::{ShareOutcome, Sharer};
use crate::features::theme::Theme;
use crate::features::{anchors, diagnostics, reveal, search, shortcuts, theme};

pub struct App<D: Document> {
    ctx: PageContext<D>,
    copier: Copier<D>,
    sharer: Sharer<D>,
}

impl<D: Document> Clone for App<D> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), copier: self.copier.clone(), sharer: self.sharer.clone() }
    }
}

/// Share payload for a single proverb page.
pub fn proverb_share_payload(url: String, title: &str) -> SharePayload {
    SharePayload {
        title: format!("Go Proverb: {title}"),
        text: format!("Check out this Go proverb: \"{title}\""),
        url,
    }
}

impl<D: Document> App<D> {
    pub fn new(ctx: PageContext<D>) -> Self {
        let copier = Copier::new(ctx.clone());
        let sharer = Sharer::new(ctx.clone(), copier.clone());
        Self { ctx, copier, sharer }
    }

    /// Resolve the page's site configuration and install every feature. Call
    /// once the document has been parsed.
    pub fn start(ctx: PageContext<D>) -> (Self, Option<Rc<dyn VisibilityObserver<D::Element>>>) {
        let app = Self::new(ctx.with_document_config());
        let observer = app.initialize();
        (app, observer)
    }

    /// Install every feature. Initializers are independent; order is not
    /// significant. Returns the reveal observer, if one was created.
    pub fn initialize(&self) -> Option<Rc<dyn VisibilityObserver<D::Element>>> {
        search::initialize_search(&self.ctx);
        self.copier.install_click_handler();
        self.sharer.install_click_handler();
        shortcuts::initialize_keyboard_shortcuts(&self.ctx);
        let observer = reveal::initialize_animations(&self.ctx);
        anchors::initialize_smooth_scroll(&self.ctx);
        theme::initialize_theme(&self.ctx);
        diagnostics::initialize_diagnostics(&self.ctx);
        observer
    }

    pub fn proverb_url(&self, id: &str) -> String {
        self.ctx.config.proverb_url(&self.ctx.navigation.origin(), id)
    }

    /// Copy the absolute link of proverb `id`; feedback goes to the focused
    /// element.
    pub async fn copy_proverb_link(&self, id: &str) -> CopyOutcome {
        let url = self.proverb_url(id);
        let target = self.ctx.document.active_element();
        self.copier.copy_text_to_clipboard(&url, target.as_ref()).await
    }

    pub async fn share_proverb(&self, id: &str, title: &str) -> ShareOutcome {
        let payload = proverb_share_payload(self.proverb_url(id), title);
        self.sharer.share_content(&payload).await
    }

    pub fn clear_search(&self) {
        if let Some(input) = self.ctx.search_input() {
            search::clear_search(&input);
        }
    }

    pub fn toggle_theme(&self) -> Theme {
        theme::toggle_theme(&self.ctx)
    }

    /// Run `task` on the page's event loop.
    pub fn spawn<F>(&self, task: impl FnOnce(Self) -> F)
    where
        F: std::future::Future<Output = ()> + 'static,
    {
        self.ctx.scheduler.spawn(Box::pin(task(self.clone())));
    }
}
