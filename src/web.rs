//! [`Document`] over the live browser DOM.
//!
//! Listener closures stay alive in a registry on the document wrapper until
//! they are removed with [`Document::remove_event_listener`].

use crate::{
    app::{App, bootstrap},
    dom::{Document, Event, EventKind, Listener, ListenerId, ReadyState},
    error::{Error, Result},
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::{self, Write},
    rc::Rc,
};
use tracing::{Level, error, field::Field, warn};
use tracing_subscriber::{Layer, layer::Context, layer::SubscriberExt, util::SubscriberInitExt};
use wasm_bindgen::{JsCast, JsValue, prelude::*};
use web_sys::{Element, EventTarget, HtmlInputElement, HtmlTextAreaElement};

struct Registered {
    target: EventTarget,
    kind: EventKind,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

#[derive(Clone)]
pub struct WebDocument {
    inner: web_sys::Document,
    listeners: Rc<RefCell<HashMap<ListenerId, Registered>>>,
    next_listener: Rc<Cell<u64>>,
}

impl WebDocument {
    #[must_use]
    pub fn new(inner: web_sys::Document) -> Self {
        Self {
            inner,
            listeners: Rc::default(),
            next_listener: Rc::default(),
        }
    }

    /// The document of the current window, if there is one.
    #[must_use]
    pub fn global() -> Option<Self> {
        let inner = web_sys::window()?.document()?;
        Some(Self::new(inner))
    }

    fn register(&self, target: EventTarget, kind: EventKind, listener: Listener<Self>) -> ListenerId {
        let id = ListenerId::new(self.next_listener.get());
        self.next_listener.set(self.next_listener.get() + 1);

        let mut doc = self.clone();
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |native: web_sys::Event| {
            let mut event = Event::new(kind);
            listener(&mut doc, &mut event);
            if event.default_prevented() {
                native.prevent_default();
            }
        });

        if let Err(err) =
            target.add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
        {
            warn!(error = ?err, event = kind.as_str(), "failed to attach listener");
        }

        self.listeners.borrow_mut().insert(
            id,
            Registered {
                target,
                kind,
                closure,
            },
        );
        id
    }
}

impl fmt::Debug for WebDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDocument")
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Document for WebDocument {
    type Element = Element;

    fn ready_state(&self) -> ReadyState {
        ReadyState::parse(&self.inner.ready_state())
    }

    fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.inner.get_element_by_id(id)
    }

    fn create_element(&mut self, tag: &str) -> Result<Element> {
        self.inner.create_element(tag).map_err(js_error)
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map(drop).map_err(js_error)
    }

    fn remove_child(&mut self, parent: &Element, child: &Element) -> bool {
        parent.remove_child(child).is_ok()
    }

    fn parent_element(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn children(&self, element: &Element) -> Vec<Element> {
        let children = element.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .collect()
    }

    fn text_content(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn set_text_content(&mut self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn set_class_name(&mut self, element: &Element, class_name: &str) {
        element.set_class_name(class_name);
    }

    fn add_class(&mut self, element: &Element, class: &str) {
        if let Err(err) = element.class_list().add_1(class) {
            warn!(error = ?err, class, "failed to add class");
        }
    }

    fn remove_class(&mut self, element: &Element, class: &str) {
        if let Err(err) = element.class_list().remove_1(class) {
            warn!(error = ?err, class, "failed to remove class");
        }
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn value(&self, element: &Element) -> String {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn set_value(&mut self, element: &Element, value: &str) {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&mut self, element: &Element, name: &str, value: &str) {
        if let Err(err) = element.set_attribute(name, value) {
            warn!(error = ?err, name, "failed to set attribute");
        }
    }

    fn add_event_listener(
        &mut self,
        target: &Element,
        kind: EventKind,
        listener: Listener<Self>,
    ) -> ListenerId {
        let target: &EventTarget = target.as_ref();
        self.register(target.clone(), kind, listener)
    }

    fn add_document_listener(&mut self, kind: EventKind, listener: Listener<Self>) -> ListenerId {
        let target: &EventTarget = self.inner.as_ref();
        self.register(target.clone(), kind, listener)
    }

    fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let Some(registered) = self.listeners.borrow_mut().remove(&id) else {
            return false;
        };
        if let Err(err) = registered.target.remove_event_listener_with_callback(
            registered.kind.as_str(),
            registered.closure.as_ref().unchecked_ref(),
        ) {
            warn!(error = ?err, "failed to detach listener");
        }
        true
    }
}

fn js_error(value: JsValue) -> Error {
    Error::other(format!("{value:?}"))
}

/// Forwards tracing events to the browser console.
struct ConsoleLayer;

#[derive(Default)]
struct ConsoleVisitor(String);

impl tracing::field::Visit for ConsoleVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        } else {
            let _ = write!(self.0, " {}={value:?}", field.name());
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = ConsoleVisitor::default();
        event.record(&mut visitor);
        let line = JsValue::from_str(&visitor.0);
        let level = *event.metadata().level();
        if level == Level::ERROR {
            web_sys::console::error_1(&line);
        } else if level == Level::WARN {
            web_sys::console::warn_1(&line);
        } else {
            web_sys::console::log_1(&line);
        }
    }
}

/// Browser entry point: install the console logger and initialize the page.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = tracing_subscriber::registry()
        .with(ConsoleLayer.with_filter(tracing_subscriber::filter::LevelFilter::INFO))
        .try_init();

    match WebDocument::global() {
        Some(mut doc) => {
            let app = Rc::new(RefCell::new(App::new()));
            bootstrap(&mut doc, &app);
        }
        None => error!("no browser document available"),
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    fn page() -> (WebDocument, Element) {
        let mut doc = WebDocument::global().expect("browser document");
        let host = doc.inner.document_element().expect("document element");
        let button = doc.create_element("button").expect("button");
        doc.append_child(&host, &button).expect("append");
        (doc, button)
    }

    fn click(target: &Element) {
        let event = web_sys::Event::new("click").expect("click event");
        target.dispatch_event(&event).expect("dispatch");
    }

    #[wasm_bindgen_test]
    fn ready_state_is_past_loading() {
        let (doc, _) = page();
        assert_ne!(doc.ready_state(), ReadyState::Loading);
    }

    #[wasm_bindgen_test]
    fn removed_listener_stops_firing() {
        let (mut doc, button) = page();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = doc.add_event_listener(
            &button,
            EventKind::Click,
            Rc::new(move |_: &mut WebDocument, _: &mut Event| counter.set(counter.get() + 1)),
        );

        click(&button);
        assert_eq!(hits.get(), 1);

        assert!(doc.remove_event_listener(id));
        assert!(!doc.remove_event_listener(id));
        click(&button);
        assert_eq!(hits.get(), 1);

        let host = doc.parent_element(&button).expect("parent");
        assert!(doc.remove_child(&host, &button));
    }

    #[wasm_bindgen_test]
    fn reads_textarea_value() {
        let (mut doc, button) = page();
        let area = doc.create_element("textarea").expect("textarea");
        doc.set_value(&area, "  typed ");
        assert_eq!(doc.value(&area), "  typed ");
        assert_eq!(doc.value(&button), "");
    }
}
