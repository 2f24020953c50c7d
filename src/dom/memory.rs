//! Arena-backed document tree.
//!
//! Nodes are never freed: removing a node only detaches it, and detached
//! nodes are invisible to [`Document::get_element_by_id`] just like in a
//! browser.

use super::{Document, Event, EventKind, Listener, ListenerId, ReadyState};
use crate::{
    actions::{
        DYNAMIC_CONTENT_ID, ERROR_MESSAGE_ID, HIDDEN_CLASS, SIMULATE_CLICK_ID, USER_FORM_ID,
        USER_INPUT_ID,
    },
    error::{Error, Result},
};
use std::{
    collections::BTreeMap,
    fmt::{self, Write},
};
use tracing::trace;

/// Index of a node inside a [`MemoryDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
struct Node {
    tag: String,
    text: String,
    classes: Vec<String>,
    value: Option<String>,
    attributes: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Document,
    Node(NodeId),
}

struct Registered {
    target: Target,
    kind: EventKind,
    listener: Listener<MemoryDocument>,
}

pub struct MemoryDocument {
    nodes: Vec<Node>,
    root: NodeId,
    ready_state: ReadyState,
    // keyed by registration order
    listeners: BTreeMap<ListenerId, Registered>,
    next_listener: u64,
}

impl MemoryDocument {
    /// Empty document with a `body` root, already past loading.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                tag: "body".into(),
                ..Node::default()
            }],
            root: NodeId(0),
            ready_state: ReadyState::Complete,
            listeners: BTreeMap::new(),
            next_listener: 0,
        }
    }

    /// Empty document that is still loading.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            ready_state: ReadyState::Loading,
            ..Self::new()
        }
    }

    /// Standard page: the form with its input, the click button, the content
    /// container and a hidden error label.
    #[must_use]
    pub fn page() -> Self {
        let mut doc = Self::new();
        doc.populate_page();
        doc
    }

    /// Same as [`MemoryDocument::page`], but still loading.
    #[must_use]
    pub fn loading_page() -> Self {
        let mut doc = Self::loading();
        doc.populate_page();
        doc
    }

    fn populate_page(&mut self) {
        let root = self.root;
        let form = self.insert_element(root, "form", Some(USER_FORM_ID));
        self.insert_element(form, "input", Some(USER_INPUT_ID));
        let button = self.insert_element(root, "button", Some(SIMULATE_CLICK_ID));
        self.node_mut(button).text = "Simulate Click".into();
        self.insert_element(root, "div", Some(DYNAMIC_CONTENT_ID));
        let error_message = self.insert_element(root, "div", Some(ERROR_MESSAGE_ID));
        self.node_mut(error_message).classes.push(HIDDEN_CLASS.into());
    }

    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Create an element and append it to `parent` in one step.
    pub fn insert_element(&mut self, parent: NodeId, tag: &str, id: Option<&str>) -> NodeId {
        let node = self.alloc(tag);
        if let Some(id) = id {
            self.node_mut(node).attributes.insert("id".into(), id.into());
        }
        self.attach(parent, node);
        node
    }

    /// Whether `node` is reachable from the root.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == self.root)
    }

    #[must_use]
    pub fn class_name(&self, node: NodeId) -> String {
        self.node(node).classes.join(" ")
    }

    /// Number of listeners registered on `target` for `kind`.
    #[must_use]
    pub fn listener_count(&self, target: NodeId, kind: EventKind) -> usize {
        self.listeners
            .values()
            .filter(|r| r.target == Target::Node(target) && r.kind == kind)
            .count()
    }

    /// Fire `kind` at `target`, running its listeners in registration order.
    pub fn dispatch(&mut self, target: NodeId, kind: EventKind) -> Event {
        self.fire(Target::Node(target), kind)
    }

    /// Leave the loading phase and fire `DOMContentLoaded`. Only the first
    /// call has any effect.
    pub fn finish_loading(&mut self) {
        if self.ready_state != ReadyState::Loading {
            return;
        }
        self.ready_state = ReadyState::Interactive;
        self.fire(Target::Document, EventKind::DomContentLoaded);
    }

    /// Render a subtree as HTML-like markup.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let data = self.node(node);
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.attributes {
            let _ = write!(out, " {name}=\"{}\"", escape(value));
        }
        if !data.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&data.classes.join(" ")));
        }
        if let Some(value) = &data.value {
            let _ = write!(out, " value=\"{}\"", escape(value));
        }
        out.push('>');
        out.push_str(&escape(&data.text));
        for &child in &data.children {
            self.write_html(child, out);
        }
        let _ = write!(out, "</{}>", data.tag);
    }

    fn fire(&mut self, target: Target, kind: EventKind) -> Event {
        let mut event = Event::new(kind);
        let listeners = self
            .listeners
            .iter()
            .filter(|(_, r)| r.target == target && r.kind == kind)
            .map(|(&id, r)| (id, r.listener.clone()))
            .collect::<Vec<_>>();
        trace!(event = kind.as_str(), listeners = listeners.len(), "dispatching");
        for (id, listener) in listeners {
            // removed by an earlier listener during this dispatch
            if !self.listeners.contains_key(&id) {
                continue;
            }
            listener(&mut *self, &mut event);
        }
        event
    }

    fn register(&mut self, target: Target, kind: EventKind, listener: Listener<Self>) -> ListenerId {
        let id = ListenerId::new(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            id,
            Registered {
                target,
                kind,
                listener,
            },
        );
        id
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        let tag = tag.to_ascii_lowercase();
        // form controls carry a value, everything else reads as empty
        let value = (tag == "input").then(String::new);
        self.nodes.push(Node {
            tag,
            value,
            ..Node::default()
        });
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != child);
        }
    }

    fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), |&n| self.node(n).parent)
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.node(n).children.iter().rev());
        }
        out
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("nodes", &self.nodes.len())
            .field("ready_state", &self.ready_state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Document for MemoryDocument {
    type Element = NodeId;

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.node(n).attributes.get("id").is_some_and(|v| v == id))
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        Ok(self.alloc(tag))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<()> {
        if self.ancestors(*parent).any(|n| n == *child) {
            return Err(Error::other("cannot insert a node into its own subtree"));
        }
        self.attach(*parent, *child);
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> bool {
        if self.node(*child).parent != Some(*parent) {
            return false;
        }
        self.detach(*child);
        true
    }

    fn parent_element(&self, element: &NodeId) -> Option<NodeId> {
        self.node(*element).parent
    }

    fn children(&self, element: &NodeId) -> Vec<NodeId> {
        self.node(*element).children.clone()
    }

    fn text_content(&self, element: &NodeId) -> String {
        self.descendants(*element)
            .into_iter()
            .map(|n| self.node(n).text.as_str())
            .collect()
    }

    fn set_text_content(&mut self, element: &NodeId, text: &str) {
        self.clear_children(element);
        self.node_mut(*element).text = text.into();
    }

    fn set_class_name(&mut self, element: &NodeId, class_name: &str) {
        self.node_mut(*element).classes = class_name
            .split_whitespace()
            .map(ToString::to_string)
            .collect();
    }

    fn add_class(&mut self, element: &NodeId, class: &str) {
        let classes = &mut self.node_mut(*element).classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.into());
        }
    }

    fn remove_class(&mut self, element: &NodeId, class: &str) {
        self.node_mut(*element).classes.retain(|c| c != class);
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        self.node(*element).classes.iter().any(|c| c == class)
    }

    fn value(&self, element: &NodeId) -> String {
        self.node(*element).value.clone().unwrap_or_default()
    }

    fn set_value(&mut self, element: &NodeId, value: &str) {
        let node = self.node_mut(*element);
        if node.value.is_some() {
            node.value = Some(value.into());
        }
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.node(*element).attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) {
        self.node_mut(*element)
            .attributes
            .insert(name.into(), value.into());
    }

    fn add_event_listener(
        &mut self,
        target: &NodeId,
        kind: EventKind,
        listener: Listener<Self>,
    ) -> ListenerId {
        self.register(Target::Node(*target), kind, listener)
    }

    fn add_document_listener(&mut self, kind: EventKind, listener: Listener<Self>) -> ListenerId {
        self.register(Target::Document, kind, listener)
    }

    fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn page_has_standard_elements() {
        let doc = MemoryDocument::page();
        for id in [
            USER_FORM_ID,
            USER_INPUT_ID,
            SIMULATE_CLICK_ID,
            DYNAMIC_CONTENT_ID,
            ERROR_MESSAGE_ID,
        ] {
            assert!(doc.get_element_by_id(id).is_some(), "missing {id}");
        }
        let error = doc.get_element_by_id(ERROR_MESSAGE_ID).expect("error label");
        assert!(doc.has_class(&error, HIDDEN_CLASS));
    }

    #[test]
    fn detached_nodes_are_not_found() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let node = doc.insert_element(root, "div", Some("gone"));
        assert!(doc.remove_child(&root, &node));
        assert!(doc.get_element_by_id("gone").is_none());
        assert!(!doc.is_connected(node));
    }

    #[test]
    fn append_moves_node_between_parents() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let a = doc.insert_element(root, "div", Some("a"));
        let b = doc.insert_element(root, "div", Some("b"));
        let child = doc.insert_element(a, "span", None);

        doc.append_child(&b, &child).expect("append");
        assert!(doc.children(&a).is_empty());
        assert_eq!(doc.children(&b), vec![child]);
        assert_eq!(doc.parent_element(&child), Some(b));
    }

    #[test]
    fn append_rejects_cycles() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let outer = doc.insert_element(root, "div", None);
        let inner = doc.insert_element(outer, "div", None);
        assert!(doc.append_child(&inner, &outer).is_err());
    }

    #[test]
    fn text_content_replaces_children() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let parent = doc.insert_element(root, "div", None);
        let child = doc.insert_element(parent, "span", None);
        doc.set_text_content(&child, "inner");
        assert_eq!(doc.text_content(&parent), "inner");

        doc.set_text_content(&parent, "outer");
        assert!(doc.children(&parent).is_empty());
        assert_eq!(doc.text_content(&parent), "outer");
    }

    #[test]
    fn dispatch_runs_listeners_in_order() {
        let mut doc = MemoryDocument::page();
        let button = doc.get_element_by_id(SIMULATE_CLICK_ID).expect("button");
        let calls = Rc::new(Cell::new(0));

        let first = calls.clone();
        doc.add_event_listener(
            &button,
            EventKind::Click,
            Rc::new(move |_: &mut MemoryDocument, _: &mut Event| first.set(first.get() * 10 + 1)),
        );
        let second = calls.clone();
        let id = doc.add_event_listener(
            &button,
            EventKind::Click,
            Rc::new(move |_: &mut MemoryDocument, event: &mut Event| {
                second.set(second.get() * 10 + 2);
                event.prevent_default();
            }),
        );

        let event = doc.dispatch(button, EventKind::Click);
        assert_eq!(calls.get(), 12);
        assert!(event.default_prevented());

        assert!(doc.remove_event_listener(id));
        assert!(!doc.remove_event_listener(id));
        doc.dispatch(button, EventKind::Click);
        assert_eq!(calls.get(), 121);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let mut doc = MemoryDocument::page();
        let button = doc.get_element_by_id(SIMULATE_CLICK_ID).expect("button");
        let later = Rc::new(Cell::new(None));
        let hits = Rc::new(Cell::new(0));

        let to_remove = later.clone();
        doc.add_event_listener(
            &button,
            EventKind::Click,
            Rc::new(move |doc: &mut MemoryDocument, _: &mut Event| {
                if let Some(id) = to_remove.get() {
                    doc.remove_event_listener(id);
                }
            }),
        );
        let counter = hits.clone();
        let id = doc.add_event_listener(
            &button,
            EventKind::Click,
            Rc::new(move |_: &mut MemoryDocument, _: &mut Event| counter.set(counter.get() + 1)),
        );
        later.set(Some(id));

        doc.dispatch(button, EventKind::Click);
        assert_eq!(hits.get(), 0);
        assert_eq!(doc.listener_count(button, EventKind::Click), 1);
    }

    #[test]
    fn finish_loading_fires_once() {
        let mut doc = MemoryDocument::loading();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        doc.add_document_listener(
            EventKind::DomContentLoaded,
            Rc::new(move |_: &mut MemoryDocument, _: &mut Event| counter.set(counter.get() + 1)),
        );

        assert_eq!(doc.ready_state(), ReadyState::Loading);
        doc.finish_loading();
        doc.finish_loading();
        assert_eq!(fired.get(), 1);
        assert_eq!(doc.ready_state(), ReadyState::Interactive);
    }

    #[test]
    fn outer_html_escapes_text() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let div = doc.insert_element(root, "div", Some("x"));
        doc.set_text_content(&div, "a < b");
        doc.set_class_name(&div, "one two");
        assert_eq!(
            doc.outer_html(div),
            r#"<div id="x" class="one two">a &lt; b</div>"#
        );
    }
}
