pub mod memory;

use crate::error::Result;
use std::{fmt::Debug, rc::Rc};

pub use memory::{MemoryDocument, NodeId};

/// Callback attached to an element or to the document itself.
///
/// The document is handed to the listener explicitly, so a handler never has
/// to reach for ambient global state.
pub type Listener<D> = Rc<dyn Fn(&mut D, &mut Event)>;

/// Loading phase of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// Map a `document.readyState` string. Anything unknown counts as
    /// complete.
    #[must_use]
    pub fn parse(state: &str) -> Self {
        match state {
            "loading" => Self::Loading,
            "interactive" => Self::Interactive,
            _ => Self::Complete,
        }
    }
}

/// Events this crate listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Submit,
    Click,
    DomContentLoaded,
}

impl EventKind {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Click => "click",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// Whether the default action of this event can be prevented.
    #[inline]
    #[must_use]
    pub const fn is_cancelable(self) -> bool {
        matches!(self, Self::Submit | Self::Click)
    }
}

/// An event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    cancelable: bool,
    default_prevented: bool,
}

impl Event {
    #[must_use]
    pub const fn new(kind: EventKind) -> Self {
        Self {
            cancelable: kind.is_cancelable(),
            default_prevented: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Cancel the default action. Has no effect on non-cancelable events.
    pub const fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    #[inline]
    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handle to a registered listener; pass it to
/// [`Document::remove_event_listener`] to detach the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    #[inline]
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// A mutable document tree addressed by element identifiers.
///
/// Everything in [`crate::actions`] is written against this trait, which lets
/// the same code drive a browser page or an in-memory tree.
pub trait Document: Sized + 'static {
    type Element: Clone + Debug;

    fn ready_state(&self) -> ReadyState;

    /// Look up a connected element by its `id` attribute.
    fn get_element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Create a detached element.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to create the element.
    fn create_element(&mut self, tag: &str) -> Result<Self::Element>;

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached somewhere else.
    ///
    /// # Errors
    ///
    /// Returns an error if the insertion would create a cycle.
    fn append_child(&mut self, parent: &Self::Element, child: &Self::Element) -> Result<()>;

    /// Detach `child` from `parent`. Returns `false` if `child` is not a
    /// child of `parent`.
    fn remove_child(&mut self, parent: &Self::Element, child: &Self::Element) -> bool;

    fn parent_element(&self, element: &Self::Element) -> Option<Self::Element>;

    fn children(&self, element: &Self::Element) -> Vec<Self::Element>;

    fn text_content(&self, element: &Self::Element) -> String;

    /// Replace all content of `element` with a single run of text.
    fn set_text_content(&mut self, element: &Self::Element, text: &str);

    fn set_class_name(&mut self, element: &Self::Element, class_name: &str);

    fn add_class(&mut self, element: &Self::Element, class: &str);

    fn remove_class(&mut self, element: &Self::Element, class: &str);

    fn has_class(&self, element: &Self::Element, class: &str) -> bool;

    /// Current value of a form control; empty for anything else.
    fn value(&self, element: &Self::Element) -> String;

    fn set_value(&mut self, element: &Self::Element, value: &str);

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    fn set_attribute(&mut self, element: &Self::Element, name: &str, value: &str);

    fn add_event_listener(
        &mut self,
        target: &Self::Element,
        kind: EventKind,
        listener: Listener<Self>,
    ) -> ListenerId;

    /// Register a listener on the document itself (e.g. `DOMContentLoaded`).
    fn add_document_listener(&mut self, kind: EventKind, listener: Listener<Self>) -> ListenerId;

    /// Returns `false` if the listener was already removed.
    fn remove_event_listener(&mut self, id: ListenerId) -> bool;

    /// Remove every child of `element`.
    fn clear_children(&mut self, element: &Self::Element) {
        for child in self.children(element) {
            self.remove_child(element, &child);
        }
    }
}
