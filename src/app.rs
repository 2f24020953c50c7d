use crate::{
    actions::{Registration, initialize_app},
    dom::{Document, Event, EventKind, ListenerId, ReadyState},
    error::{Error, Result},
};
use std::{cell::RefCell, rc::Rc};
use tracing::{debug, info};

/// Idempotent owner of the app's listeners.
///
/// Unlike calling [`initialize_app`] directly, initializing an `App` twice
/// does not attach a second set of listeners.
#[derive(Debug, Default)]
pub struct App {
    registration: Option<Registration>,
}

impl App {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { registration: None }
    }

    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.registration.is_some()
    }

    /// Attach the form and button listeners unless already attached.
    pub fn initialize<D: Document>(&mut self, doc: &mut D) -> Registration {
        if let Some(registration) = self.registration {
            debug!("app already initialized");
            return registration;
        }
        *self.registration.insert(initialize_app(doc))
    }

    /// Like [`App::initialize`], but refuses a second initialization.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyInitialized` if listeners are already attached.
    pub fn try_initialize<D: Document>(&mut self, doc: &mut D) -> Result<Registration> {
        if self.is_initialized() {
            return Err(Error::AlreadyInitialized);
        }
        Ok(self.initialize(doc))
    }

    /// Detach everything this app attached. Returns the number of listeners
    /// removed.
    pub fn teardown<D: Document>(&mut self, doc: &mut D) -> usize {
        let removed = self.registration.take().map_or(0, |r| r.remove(doc));
        info!(removed, "app torn down");
        removed
    }
}

/// Outcome of [`bootstrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The document was ready, listeners are attached.
    Immediate(Registration),
    /// Initialization waits for `DOMContentLoaded`.
    Deferred(ListenerId),
}

/// Initialize `app` now if the document is past loading, otherwise once
/// `DOMContentLoaded` fires.
///
/// Either way the listeners end up owned by `app`, so a later
/// [`App::initialize`] is a no-op and [`App::teardown`] detaches them.
pub fn bootstrap<D: Document>(doc: &mut D, app: &Rc<RefCell<App>>) -> Bootstrap {
    if doc.ready_state() != ReadyState::Loading {
        return Bootstrap::Immediate(app.borrow_mut().initialize(doc));
    }
    debug!("document still loading, deferring initialization");
    let app = Rc::clone(app);
    let id = doc.add_document_listener(
        EventKind::DomContentLoaded,
        Rc::new(move |doc: &mut D, _: &mut Event| {
            app.borrow_mut().initialize(doc);
        }),
    );
    Bootstrap::Deferred(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actions::{DYNAMIC_CONTENT_ID, SIMULATE_CLICK_ID, USER_FORM_ID},
        dom::{MemoryDocument, NodeId},
    };

    fn click(doc: &mut MemoryDocument) {
        let button = doc.get_element_by_id(SIMULATE_CLICK_ID).expect("button");
        doc.dispatch(button, EventKind::Click);
    }

    fn content(doc: &MemoryDocument) -> Vec<NodeId> {
        let container = doc.get_element_by_id(DYNAMIC_CONTENT_ID).expect("content");
        doc.children(&container)
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut doc = MemoryDocument::page();
        let mut app = App::new();
        let first = app.initialize(&mut doc);
        let second = app.initialize(&mut doc);
        assert_eq!(first, second);

        let form = doc.get_element_by_id(USER_FORM_ID).expect("form");
        assert_eq!(doc.listener_count(form, EventKind::Submit), 1);

        click(&mut doc);
        assert_eq!(content(&doc).len(), 1);
    }

    #[test]
    fn try_initialize_rejects_second_call() {
        let mut doc = MemoryDocument::page();
        let mut app = App::new();
        assert!(app.try_initialize(&mut doc).is_ok());
        assert!(matches!(
            app.try_initialize(&mut doc),
            Err(Error::AlreadyInitialized)
        ));
    }

    #[test]
    fn teardown_detaches_listeners() {
        let mut doc = MemoryDocument::page();
        let mut app = App::new();
        app.initialize(&mut doc);
        assert_eq!(app.teardown(&mut doc), 2);
        assert!(!app.is_initialized());

        click(&mut doc);
        assert!(content(&doc).is_empty());
        assert_eq!(app.teardown(&mut doc), 0);
    }

    fn shared_app() -> Rc<RefCell<App>> {
        Rc::new(RefCell::new(App::new()))
    }

    #[test]
    fn bootstrap_ready_document_runs_immediately() {
        let mut doc = MemoryDocument::page();
        let app = shared_app();
        assert!(matches!(
            bootstrap(&mut doc, &app),
            Bootstrap::Immediate(_)
        ));
        assert!(app.borrow().is_initialized());
        click(&mut doc);
        assert_eq!(content(&doc).len(), 1);
    }

    #[test]
    fn bootstrap_loading_document_waits_for_content_loaded() {
        let mut doc = MemoryDocument::loading_page();
        let app = shared_app();
        assert!(matches!(bootstrap(&mut doc, &app), Bootstrap::Deferred(_)));

        click(&mut doc);
        assert!(content(&doc).is_empty());
        assert!(!app.borrow().is_initialized());

        doc.finish_loading();
        doc.finish_loading();
        click(&mut doc);
        assert_eq!(content(&doc).len(), 1);
    }

    #[test]
    fn bootstrapped_listeners_stay_with_the_app() {
        let mut doc = MemoryDocument::loading_page();
        let app = shared_app();
        bootstrap(&mut doc, &app);
        doc.finish_loading();

        app.borrow_mut().initialize(&mut doc);
        let button = doc.get_element_by_id(SIMULATE_CLICK_ID).expect("button");
        assert_eq!(doc.listener_count(button, EventKind::Click), 1);

        assert_eq!(app.borrow_mut().teardown(&mut doc), 2);
        click(&mut doc);
        assert!(content(&doc).is_empty());
    }
}
