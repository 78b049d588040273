//! Global keyboard shortcuts.
//!
//! | Key            | Action                            | Guard                                 |
//! |----------------|-----------------------------------|---------------------------------------|
//! | Ctrl/Cmd + `k` | focus and select the search input | none, default prevented               |
//! | `Escape`       | blur the search input             | search input focused, any modifiers   |
//! | `r`            | go to a random proverb            | not typing, no Ctrl/Cmd               |
//! | `h`            | go home                           | not typing, no Ctrl/Cmd               |

#[cfg(test)]
#[path = "shortcuts_test.rs"]
mod shortcuts_test;

use std::rc::Rc;

use crate::env::{Document, DomEvent, Element, EventKind, Handled, KeyPress, PageContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    FocusSearch,
    BlurSearch,
    RandomProverb,
    Home,
}

/// Map a key press to a shortcut. `typing` is true while a text-entry
/// element has focus.
pub fn route_key(press: &KeyPress, search_focused: bool, typing: bool) -> Option<Shortcut> {
    let command = press.has_command_modifier();
    match press.key.as_str() {
        "k" if command => Some(Shortcut::FocusSearch),
        "Escape" if search_focused => Some(Shortcut::BlurSearch),
        "r" if !command && !typing => Some(Shortcut::RandomProverb),
        "h" if !command && !typing => Some(Shortcut::Home),
        _ => None,
    }
}

/// Inputs, text areas and content-editable elements take typed keys.
pub fn is_text_entry<E: Element>(element: Option<&E>) -> bool {
    element.is_some_and(|el| {
        let tag = el.tag_name();
        tag == "INPUT" || tag == "TEXTAREA" || el.is_content_editable()
    })
}

pub fn handle_key_down<D: Document>(ctx: &PageContext<D>, press: &KeyPress) -> Handled {
    let active = ctx.document.active_element();
    let search = ctx.search_input();
    let search_focused = search.is_some() && active == search;
    let Some(shortcut) = route_key(press, search_focused, is_text_entry(active.as_ref())) else {
        return Handled::Continue;
    };

    match shortcut {
        Shortcut::FocusSearch => {
            if let Some(input) = search {
                input.focus();
                input.select();
            }
            return Handled::PreventDefault;
        }
        Shortcut::BlurSearch => {
            if let Some(input) = search {
                input.blur();
            }
        }
        Shortcut::RandomProverb => ctx.navigation.assign(&ctx.config.random_path),
        Shortcut::Home => ctx.navigation.assign(&ctx.config.home_path),
    }
    Handled::Continue
}

pub fn initialize_keyboard_shortcuts<D: Document>(ctx: &PageContext<D>) {
    let handler_ctx = ctx.clone();
    ctx.document.listen(
        None,
        EventKind::KeyDown,
        Rc::new(move |event: &DomEvent<D::Element>| match &event.key {
            Some(press) => handle_key_down(&handler_ctx, press),
            None => Handled::Continue,
        }),
    );
}
