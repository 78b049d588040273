//! In-memory page used by unit tests.
//!
//! The DOM double supports the selector subset the features use: tag, `#id`,
//! `.class`, `[attr]`, `[attr="v"]`, `[attr^="v"]`, compounds of those, and
//! comma-separated lists. Combinators are not supported.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;

use super::*;

pub(crate) const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";
pub(crate) const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
pub(crate) const ORIGIN: &str = "https://go-proverbs.dev";

// =============================================================================
// DOM
// =============================================================================

type FocusSlot = Rc<RefCell<Option<FakeElement>>>;

struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    value: String,
    selected: bool,
    scrolled: u32,
    parent: Option<Weak<RefCell<Node>>>,
    children: Vec<FakeElement>,
    focus: FocusSlot,
}

#[derive(Clone)]
pub(crate) struct FakeElement(Rc<RefCell<Node>>);

impl PartialEq for FakeElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        write!(f, "<{} class={:?}>", node.tag, node.classes)
    }
}

impl FakeElement {
    fn detached(tag: &str, focus: FocusSlot) -> Self {
        Self(Rc::new(RefCell::new(Node {
            tag: tag.to_ascii_uppercase(),
            attrs: Vec::new(),
            classes: Vec::new(),
            text: String::new(),
            value: String::new(),
            selected: false,
            scrolled: 0,
            parent: None,
            children: Vec::new(),
            focus,
        })))
    }

    pub(crate) fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub(crate) fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub(crate) fn with_text(self, text: &str) -> Self {
        self.set_text_content(text);
        self
    }

    pub(crate) fn with_value(self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub(crate) fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.as_ref().and_then(Weak::upgrade).map(Self)
    }

    pub(crate) fn children(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }

    pub(crate) fn is_selected(&self) -> bool {
        self.0.borrow().selected
    }

    pub(crate) fn scroll_count(&self) -> u32 {
        self.0.borrow().scrolled
    }

    pub(crate) fn has_focus(&self) -> bool {
        self.0.borrow().focus.borrow().as_ref() == Some(self)
    }

    fn append(&self, child: &Self) {
        child.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().children.push(child.clone());
    }

    fn is_inclusive_ancestor_of(&self, other: &Self) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if &node == self {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    fn descendants(&self, out: &mut Vec<Self>) {
        for child in self.children() {
            out.push(child.clone());
            child.descendants(out);
        }
    }

    fn matches(&self, selector: &str) -> bool {
        parse_selector_list(selector).iter().any(|compound| compound.matches(self))
    }
}

impl Element for FakeElement {
    fn tag_name(&self) -> String {
        self.0.borrow().tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let node = self.0.borrow();
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let mut node = self.0.borrow_mut();
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_owned).collect();
            return;
        }
        if let Some(slot) = node.attrs.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_owned();
        } else {
            node.attrs.push((name.to_owned(), value.to_owned()));
        }
    }

    fn text_content(&self) -> String {
        self.0.borrow().text.clone()
    }

    fn set_text_content(&self, text: &str) {
        self.0.borrow_mut().text = text.to_owned();
    }

    fn add_class(&self, class: &str) {
        let mut node = self.0.borrow_mut();
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_owned());
        }
    }

    fn remove_class(&self, class: &str) {
        self.0.borrow_mut().classes.retain(|c| c != class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == class)
    }

    fn is_content_editable(&self) -> bool {
        self.attribute("contenteditable").as_deref() == Some("true")
    }

    fn closest(&self, selector: &str) -> Option<Self> {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            if node.matches(selector) {
                return Some(node);
            }
            cursor = node.parent();
        }
        None
    }

    fn has_descendant(&self, selector: &str) -> bool {
        let mut all = Vec::new();
        self.descendants(&mut all);
        all.iter().any(|node| node.matches(selector))
    }

    fn value(&self) -> String {
        self.0.borrow().value.clone()
    }

    fn set_value(&self, value: &str) {
        self.0.borrow_mut().value = value.to_owned();
    }

    fn focus(&self) {
        let slot = Rc::clone(&self.0.borrow().focus);
        *slot.borrow_mut() = Some(self.clone());
    }

    fn blur(&self) {
        let slot = Rc::clone(&self.0.borrow().focus);
        let mut focused = slot.borrow_mut();
        if focused.as_ref() == Some(self) {
            *focused = None;
        }
    }

    fn select(&self) {
        self.0.borrow_mut().selected = true;
    }

    fn scroll_into_view(&self) {
        self.0.borrow_mut().scrolled += 1;
    }
}

// -----------------------------------------------------------------------------
// Selector subset
// -----------------------------------------------------------------------------

enum AttrTest {
    Present(String),
    Equals(String, String),
    Prefix(String, String),
}

#[derive(Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, element: &FakeElement) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag_name()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Present(name) => element.attribute(name).is_some(),
            AttrTest::Equals(name, want) => element.attribute(name).as_deref() == Some(want.as_str()),
            AttrTest::Prefix(name, prefix) => element.attribute(name).is_some_and(|v| v.starts_with(prefix.as_str())),
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn parse_attr(body: &str) -> AttrTest {
    let unquote = |v: &str| v.trim().trim_matches('"').trim_matches('\'').to_owned();
    if let Some((name, value)) = body.split_once("^=") {
        AttrTest::Prefix(name.trim().to_owned(), unquote(value))
    } else if let Some((name, value)) = body.split_once('=') {
        AttrTest::Equals(name.trim().to_owned(), unquote(value))
    } else {
        AttrTest::Present(body.trim().to_owned())
    }
}

fn parse_compound(selector: &str) -> Compound {
    let mut compound = Compound::default();
    let mut chars = selector.trim().chars().peekable();
    let tag = take_ident(&mut chars);
    if !tag.is_empty() {
        compound.tag = Some(tag);
    }
    while let Some(c) = chars.next() {
        match c {
            '.' => compound.classes.push(take_ident(&mut chars)),
            '#' => compound.id = Some(take_ident(&mut chars)),
            '[' => {
                let body: String = chars.by_ref().take_while(|&c| c != ']').collect();
                compound.attrs.push(parse_attr(&body));
            }
            _ => {}
        }
    }
    compound
}

fn parse_selector_list(selector: &str) -> Vec<Compound> {
    selector
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_compound)
        .collect()
}

// -----------------------------------------------------------------------------
// Document
// -----------------------------------------------------------------------------

pub(crate) struct FakeObserver {
    pub options: ObserverOptions,
    callback: IntersectionCallback<FakeElement>,
    observed: RefCell<Vec<FakeElement>>,
}

impl FakeObserver {
    pub(crate) fn observed(&self) -> Vec<FakeElement> {
        self.observed.borrow().clone()
    }

    /// Report `element` as intersecting (or not) to the observer callback.
    pub(crate) fn report(&self, element: &FakeElement, is_intersecting: bool) {
        let entries = [Intersection { target: element.clone(), is_intersecting }];
        (self.callback)(&entries[..], self as &dyn VisibilityObserver<FakeElement>);
    }
}

impl VisibilityObserver<FakeElement> for FakeObserver {
    fn observe(&self, element: &FakeElement) {
        self.observed.borrow_mut().push(element.clone());
    }

    fn unobserve(&self, element: &FakeElement) {
        self.observed.borrow_mut().retain(|e| e != element);
    }
}

type Registration = (Option<FakeElement>, EventKind, Listener<FakeElement>);

pub(crate) struct FakeDocument {
    root: FakeElement,
    body: FakeElement,
    focus: FocusSlot,
    listeners: RefCell<Vec<Registration>>,
    pub observer_supported: Cell<bool>,
    observer: RefCell<Option<Rc<FakeObserver>>>,
    pub exec_copy_fails: Cell<bool>,
    legacy_copies: RefCell<Vec<String>>,
    removed: Cell<u32>,
}

impl FakeDocument {
    pub(crate) fn new() -> Self {
        let focus: FocusSlot = Rc::new(RefCell::new(None));
        let root = FakeElement::detached("html", Rc::clone(&focus));
        let body = FakeElement::detached("body", Rc::clone(&focus));
        root.append(&body);
        Self {
            root,
            body,
            focus,
            listeners: RefCell::new(Vec::new()),
            observer_supported: Cell::new(true),
            observer: RefCell::new(None),
            exec_copy_fails: Cell::new(false),
            legacy_copies: RefCell::new(Vec::new()),
            removed: Cell::new(0),
        }
    }

    pub(crate) fn body(&self) -> FakeElement {
        self.body.clone()
    }

    /// Create `<tag>` as the last child of `parent`.
    pub(crate) fn append(&self, parent: &FakeElement, tag: &str) -> FakeElement {
        let element = FakeElement::detached(tag, Rc::clone(&self.focus));
        parent.append(&element);
        element
    }

    pub(crate) fn observer(&self) -> Option<Rc<FakeObserver>> {
        self.observer.borrow().clone()
    }

    /// Text captured by the legacy copy command.
    pub(crate) fn legacy_copies(&self) -> Vec<String> {
        self.legacy_copies.borrow().clone()
    }

    pub(crate) fn removed_count(&self) -> u32 {
        self.removed.get()
    }

    pub(crate) fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.borrow().iter().filter(|(_, k, _)| *k == kind).count()
    }

    /// Deliver `event` to document-level listeners and to listeners on the
    /// target or any of its ancestors.
    pub(crate) fn dispatch(&self, event: &DomEvent<FakeElement>) -> Handled {
        let listeners: Vec<Registration> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == event.kind)
            .cloned()
            .collect();
        let mut handled = Handled::Continue;
        for (on, _, listener) in listeners {
            let reaches = match (&on, &event.target) {
                (None, _) => true,
                (Some(on), Some(target)) => on.is_inclusive_ancestor_of(target),
                (Some(_), None) => false,
            };
            if reaches && listener(event) == Handled::PreventDefault {
                handled = Handled::PreventDefault;
            }
        }
        handled
    }
}

impl Document for FakeDocument {
    type Element = FakeElement;

    fn query(&self, selector: &str) -> Option<FakeElement> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<FakeElement> {
        let mut all = Vec::new();
        self.root.descendants(&mut all);
        all.into_iter().filter(|e| e.matches(selector)).collect()
    }

    fn active_element(&self) -> Option<FakeElement> {
        Some(self.focus.borrow().clone().unwrap_or_else(|| self.body.clone()))
    }

    fn root(&self) -> Option<FakeElement> {
        Some(self.root.clone())
    }

    fn create_element(&self, tag: &str) -> Option<FakeElement> {
        Some(FakeElement::detached(tag, Rc::clone(&self.focus)))
    }

    fn append_to_body(&self, element: &FakeElement) -> Result<(), PageError> {
        self.body.append(element);
        Ok(())
    }

    fn remove(&self, element: &FakeElement) {
        if let Some(parent) = element.parent() {
            parent.0.borrow_mut().children.retain(|c| c != element);
            element.0.borrow_mut().parent = None;
            self.removed.set(self.removed.get() + 1);
        }
        element.blur();
    }

    fn exec_copy(&self) -> Result<(), PageError> {
        if self.exec_copy_fails.get() {
            return Err(PageError::CommandFailed("copy command not enabled".to_owned()));
        }
        let focused = self.focus.borrow().clone();
        match focused {
            Some(element) if element.is_selected() => {
                self.legacy_copies.borrow_mut().push(element.value());
                Ok(())
            }
            _ => Err(PageError::CommandFailed("nothing selected".to_owned())),
        }
    }

    fn listen(&self, target: Option<&FakeElement>, kind: EventKind, listener: Listener<FakeElement>) {
        self.listeners.borrow_mut().push((target.cloned(), kind, listener));
    }

    fn observe_visibility(
        &self,
        options: &ObserverOptions,
        callback: IntersectionCallback<FakeElement>,
    ) -> Option<Rc<dyn VisibilityObserver<FakeElement>>> {
        if !self.observer_supported.get() {
            return None;
        }
        let observer = Rc::new(FakeObserver { options: options.clone(), callback, observed: RefCell::new(Vec::new()) });
        *self.observer.borrow_mut() = Some(Rc::clone(&observer));
        Some(observer)
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

#[derive(Default)]
pub(crate) struct FakeClipboard {
    pub available: Cell<bool>,
    pub rejects: Cell<bool>,
    writes: RefCell<Vec<String>>,
}

impl FakeClipboard {
    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }
}

impl Clipboard for FakeClipboard {
    fn is_available(&self) -> bool {
        self.available.get()
    }

    fn write_text(&self, text: &str) -> LocalBoxFuture<'_, Result<(), PageError>> {
        let result = if self.rejects.get() {
            Err(PageError::Rejected("write permission denied".to_owned()))
        } else {
            self.writes.borrow_mut().push(text.to_owned());
            Ok(())
        };
        Box::pin(futures::future::ready(result))
    }
}

#[derive(Default)]
pub(crate) struct FakeShare {
    pub available: Cell<bool>,
    pub rejects: Cell<bool>,
    shared: RefCell<Vec<SharePayload>>,
}

impl FakeShare {
    pub(crate) fn shared(&self) -> Vec<SharePayload> {
        self.shared.borrow().clone()
    }
}

impl Share for FakeShare {
    fn can_share(&self) -> bool {
        self.available.get()
    }

    fn share(&self, payload: &SharePayload) -> LocalBoxFuture<'_, Result<(), PageError>> {
        self.shared.borrow_mut().push(payload.clone());
        let result = if self.rejects.get() { Err(PageError::Rejected("AbortError: share canceled".to_owned())) } else { Ok(()) };
        Box::pin(futures::future::ready(result))
    }
}

#[derive(Default)]
pub(crate) struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PageError> {
        self.values.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeColorScheme {
    dark: Cell<bool>,
    listeners: RefCell<Vec<Box<dyn Fn(bool)>>>,
}

impl FakeColorScheme {
    /// Flip the OS preference and notify subscribers.
    pub(crate) fn set_dark(&self, dark: bool) {
        self.dark.set(dark);
        for listener in self.listeners.borrow().iter() {
            listener(dark);
        }
    }
}

impl ColorScheme for FakeColorScheme {
    fn prefers_dark(&self) -> bool {
        self.dark.get()
    }

    fn on_change(&self, callback: Box<dyn Fn(bool)>) {
        self.listeners.borrow_mut().push(callback);
    }
}

pub(crate) struct FakeNavigation {
    pub user_agent: RefCell<String>,
    pub pathname: RefCell<String>,
    pub load_time_ms: Cell<Option<f64>>,
    assigned: RefCell<Vec<String>>,
}

impl FakeNavigation {
    pub(crate) fn assigned(&self) -> Vec<String> {
        self.assigned.borrow().clone()
    }
}

impl Default for FakeNavigation {
    fn default() -> Self {
        Self {
            user_agent: RefCell::new(DESKTOP_UA.to_owned()),
            pathname: RefCell::new("/".to_owned()),
            load_time_ms: Cell::new(None),
            assigned: RefCell::new(Vec::new()),
        }
    }
}

impl Navigation for FakeNavigation {
    fn user_agent(&self) -> String {
        self.user_agent.borrow().clone()
    }

    fn pathname(&self) -> String {
        self.pathname.borrow().clone()
    }

    fn origin(&self) -> String {
        ORIGIN.to_owned()
    }

    fn assign(&self, path: &str) {
        self.assigned.borrow_mut().push(path.to_owned());
    }

    fn load_time_ms(&self) -> Option<f64> {
        self.load_time_ms.get()
    }
}

type PendingTimer = (TimerId, u64, Box<dyn FnOnce()>);

/// Scheduler driven by an explicit clock. Timers fire only from
/// [`ManualScheduler::advance`]; spawned tasks run from
/// [`ManualScheduler::run_tasks`].
#[derive(Default)]
pub(crate) struct ManualScheduler {
    now_ms: Cell<u64>,
    next_id: Cell<u32>,
    timers: RefCell<Vec<PendingTimer>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl ManualScheduler {
    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub(crate) fn run_tasks(&self) {
        loop {
            let batch: Vec<_> = self.tasks.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                break;
            }
            for task in batch {
                futures::executor::block_on(task);
            }
        }
    }

    /// Move the clock forward, firing due timers in deadline order.
    pub(crate) fn advance(&self, ms: u64) {
        self.run_tasks();
        let target = self.now_ms.get() + ms;
        loop {
            let next = {
                let timers = self.timers.borrow();
                timers
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, due, _))| *due <= target)
                    .min_by_key(|(_, (_, due, _))| *due)
                    .map(|(index, _)| index)
            };
            let Some(index) = next else {
                break;
            };
            let (_, due, callback) = self.timers.borrow_mut().remove(index);
            self.now_ms.set(due);
            callback();
            self.run_tasks();
        }
        self.now_ms.set(target);
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let due = self.now_ms.get() + u64::from(delay_ms);
        self.timers.borrow_mut().push((id, due, callback));
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|(pending, _, _)| *pending != id);
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}

// =============================================================================
// PAGE
// =============================================================================

/// A desktop page with an available clipboard, no share sheet, an empty
/// storage and a light OS preference.
pub(crate) struct FakePage {
    pub doc: Rc<FakeDocument>,
    pub clipboard: Rc<FakeClipboard>,
    pub share: Rc<FakeShare>,
    pub storage: Rc<MemoryStorage>,
    pub color_scheme: Rc<FakeColorScheme>,
    pub navigation: Rc<FakeNavigation>,
    pub scheduler: Rc<ManualScheduler>,
}

impl FakePage {
    pub(crate) fn new() -> Self {
        let clipboard = FakeClipboard::default();
        clipboard.available.set(true);
        Self {
            doc: Rc::new(FakeDocument::new()),
            clipboard: Rc::new(clipboard),
            share: Rc::new(FakeShare::default()),
            storage: Rc::new(MemoryStorage::default()),
            color_scheme: Rc::new(FakeColorScheme::default()),
            navigation: Rc::new(FakeNavigation::default()),
            scheduler: Rc::new(ManualScheduler::default()),
        }
    }

    pub(crate) fn context(&self) -> PageContext<FakeDocument> {
        PageContext::new(
            Rc::clone(&self.doc),
            Rc::clone(&self.navigation) as Rc<dyn Navigation>,
            Rc::clone(&self.scheduler) as Rc<dyn Scheduler>,
        )
        .with_clipboard(Rc::clone(&self.clipboard) as Rc<dyn Clipboard>)
        .with_share(Rc::clone(&self.share) as Rc<dyn Share>)
        .with_storage(Rc::clone(&self.storage) as Rc<dyn Storage>)
        .with_color_scheme(Rc::clone(&self.color_scheme) as Rc<dyn ColorScheme>)
    }

    /// Append `<tag>` to `<body>`.
    pub(crate) fn add(&self, tag: &str) -> FakeElement {
        self.doc.append(&self.doc.body(), tag)
    }

    pub(crate) fn click(&self, target: &FakeElement) -> Handled {
        let handled = self.doc.dispatch(&DomEvent::new(EventKind::Click, Some(target.clone())));
        self.scheduler.run_tasks();
        handled
    }

    pub(crate) fn submit(&self, form: &FakeElement) -> Handled {
        self.doc.dispatch(&DomEvent::new(EventKind::Submit, Some(form.clone())))
    }

    pub(crate) fn type_into(&self, input: &FakeElement, value: &str) {
        input.set_value(value);
        self.doc.dispatch(&DomEvent::new(EventKind::Input, Some(input.clone())));
    }

    pub(crate) fn key(&self, press: KeyPress) -> Handled {
        let mut event = DomEvent::new(EventKind::KeyDown, self.doc.active_element());
        event.key = Some(press);
        let handled = self.doc.dispatch(&event);
        self.scheduler.run_tasks();
        handled
    }
}
