//! Click and submit handlers that create, replace or remove nodes.
//!
//! Every function looks its elements up again on each call and holds no
//! reference past its own return.

use crate::{
    dom::{Document, Event, EventKind, ListenerId},
    error::{Error, Result},
    validate::validate_non_empty,
};
use std::rc::Rc;
use tracing::{debug, error, info, warn};

pub const USER_INPUT_ID: &str = "user-input";
pub const ERROR_MESSAGE_ID: &str = "error-message";
pub const USER_FORM_ID: &str = "user-form";
pub const SIMULATE_CLICK_ID: &str = "simulate-click";
pub const DYNAMIC_CONTENT_ID: &str = "dynamic-content";

pub const ADDED_ELEMENT_CLASS: &str = "added-element";
pub const CLICK_RESULT_CLASS: &str = "click-result";
pub const SUBMITTED_CONTENT_CLASS: &str = "submitted-content";
pub const BUTTON_CLICK_CLASS: &str = "button-click";
pub const HIDDEN_CLASS: &str = "hidden";

pub const EMPTY_INPUT_MESSAGE: &str = "Input cannot be empty";
pub const BUTTON_CLICK_TEXT: &str = "Button was clicked!";

/// Set on a form once its submit-prevention listener is attached.
const SUBMIT_GUARD_ATTR: &str = "data-submit-guard";

/// Listeners attached by [`initialize_app`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registration {
    pub form: Option<ListenerId>,
    pub button: Option<ListenerId>,
}

impl Registration {
    /// Detach every listener in this registration. Returns how many were
    /// still attached.
    pub fn remove<D: Document>(self, doc: &mut D) -> usize {
        [self.form, self.button]
            .into_iter()
            .flatten()
            .filter(|&id| doc.remove_event_listener(id))
            .count()
    }
}

/// Append a new `added-element` node holding `text` to the container.
///
/// # Errors
///
/// Returns `Error::MissingElement` if no element has `container_id`.
pub fn add_element_to_dom<D: Document>(
    doc: &mut D,
    container_id: &str,
    text: &str,
) -> Result<D::Element> {
    let container = find(doc, container_id, "container not found")?;
    let element = create_marked(doc, text, ADDED_ELEMENT_CLASS)?;
    doc.append_child(&container, &element)?;
    debug!(container_id, "element added");
    Ok(element)
}

/// Detach the element from its parent. Returns `false` if the element does
/// not exist or has no parent.
pub fn remove_element_from_dom<D: Document>(doc: &mut D, element_id: &str) -> bool {
    let Some(element) = doc.get_element_by_id(element_id) else {
        return false;
    };
    let Some(parent) = doc.parent_element(&element) else {
        return false;
    };
    let removed = doc.remove_child(&parent, &element);
    debug!(element_id, removed, "remove requested");
    removed
}

/// Replace everything inside the container with a single `click-result`
/// node holding `message`.
///
/// # Errors
///
/// Returns `Error::MissingElement` if no element has `container_id`.
pub fn simulate_click<D: Document>(
    doc: &mut D,
    container_id: &str,
    message: &str,
) -> Result<D::Element> {
    let container = find(doc, container_id, "container not found")?;
    doc.clear_children(&container);
    let element = create_marked(doc, message, CLICK_RESULT_CLASS)?;
    doc.append_child(&container, &element)?;
    Ok(element)
}

/// Validate `user-input` and append its trimmed value to the container.
///
/// Also makes sure the form's native submission is prevented. The guard
/// listener is attached once per form no matter how often this runs.
///
/// # Errors
///
/// - `Error::MissingElements` if the form, the input, the container or the
///   error label is missing.
/// - `Error::EmptyInput` if the trimmed input is empty; the error label is
///   shown in that case.
pub fn handle_form_submit<D: Document>(
    doc: &mut D,
    form_id: &str,
    content_container_id: &str,
) -> Result<String> {
    let mut missing = Vec::new();
    let form = require(doc, form_id, &mut missing);
    let input = require(doc, USER_INPUT_ID, &mut missing);
    let container = require(doc, content_container_id, &mut missing);
    let error_message = require(doc, ERROR_MESSAGE_ID, &mut missing);

    let (Some(form), Some(input), Some(container), Some(error_message)) =
        (form, input, container, error_message)
    else {
        error!(?missing, "Required elements not found");
        return Err(Error::MissingElements(missing));
    };

    guard_submit(doc, &form);
    submit_into(doc, &input, &container, &error_message)
}

/// Submit handler for the real form: prevents the native submission, then
/// moves `user-input` into `dynamic-content`.
///
/// # Errors
///
/// Same as [`handle_form_submit`].
pub fn handle_real_form_submit<D: Document>(
    doc: &mut D,
    event: Option<&mut Event>,
) -> Result<String> {
    if let Some(event) = event {
        event.prevent_default();
    }

    let mut missing = Vec::new();
    let input = require(doc, USER_INPUT_ID, &mut missing);
    let container = require(doc, DYNAMIC_CONTENT_ID, &mut missing);
    let error_message = require(doc, ERROR_MESSAGE_ID, &mut missing);

    let (Some(input), Some(container), Some(error_message)) = (input, container, error_message)
    else {
        error!(?missing, "Required elements not found");
        return Err(Error::MissingElements(missing));
    };

    submit_into(doc, &input, &container, &error_message)
}

/// Append a `button-click` marker to `dynamic-content`.
///
/// # Errors
///
/// Returns `Error::MissingElement` if `dynamic-content` is missing.
pub fn handle_button_click<D: Document>(doc: &mut D) -> Result<D::Element> {
    let container = find(
        doc,
        DYNAMIC_CONTENT_ID,
        "Dynamic content element not found",
    )?;
    let element = create_marked(doc, BUTTON_CLICK_TEXT, BUTTON_CLICK_CLASS)?;
    doc.append_child(&container, &element)?;
    info!("button click recorded");
    Ok(element)
}

/// Wire [`handle_real_form_submit`] to `user-form`.
///
/// Each call attaches another listener; keep the returned id to detach it.
pub fn initialize_form<D: Document>(doc: &mut D) -> Option<ListenerId> {
    let form = doc.get_element_by_id(USER_FORM_ID)?;
    let id = doc.add_event_listener(
        &form,
        EventKind::Submit,
        Rc::new(|doc: &mut D, event: &mut Event| {
            if let Err(err) = handle_real_form_submit(doc, Some(event)) {
                debug!(%err, "submission rejected");
            }
        }),
    );
    Some(id)
}

/// Wire [`handle_button_click`] to the `simulate-click` button.
///
/// Each call attaches another listener; keep the returned id to detach it.
pub fn initialize_button<D: Document>(doc: &mut D) -> Option<ListenerId> {
    let button = doc.get_element_by_id(SIMULATE_CLICK_ID)?;
    let id = doc.add_event_listener(
        &button,
        EventKind::Click,
        Rc::new(|doc: &mut D, _: &mut Event| {
            if let Err(err) = handle_button_click(doc) {
                debug!(%err, "click ignored");
            }
        }),
    );
    Some(id)
}

pub fn initialize_app<D: Document>(doc: &mut D) -> Registration {
    let registration = Registration {
        form: initialize_form(doc),
        button: initialize_button(doc),
    };
    info!(
        form = registration.form.is_some(),
        button = registration.button.is_some(),
        "app initialized"
    );
    registration
}

fn find<D: Document>(doc: &D, id: &str, message: &'static str) -> Result<D::Element> {
    doc.get_element_by_id(id).ok_or_else(|| {
        error!(id, "{message}");
        Error::missing(id)
    })
}

fn require<D: Document>(doc: &D, id: &str, missing: &mut Vec<String>) -> Option<D::Element> {
    let found = doc.get_element_by_id(id);
    if found.is_none() {
        missing.push(id.to_owned());
    }
    found
}

fn create_marked<D: Document>(doc: &mut D, text: &str, class: &str) -> Result<D::Element> {
    let element = doc.create_element("div")?;
    doc.set_text_content(&element, text);
    doc.set_class_name(&element, class);
    Ok(element)
}

fn guard_submit<D: Document>(doc: &mut D, form: &D::Element) {
    if doc.attribute(form, SUBMIT_GUARD_ATTR).is_some() {
        return;
    }
    doc.add_event_listener(
        form,
        EventKind::Submit,
        Rc::new(|_: &mut D, event: &mut Event| event.prevent_default()),
    );
    doc.set_attribute(form, SUBMIT_GUARD_ATTR, "");
}

fn submit_into<D: Document>(
    doc: &mut D,
    input: &D::Element,
    container: &D::Element,
    error_message: &D::Element,
) -> Result<String> {
    let raw = doc.value(input);
    let value = match validate_non_empty(&raw) {
        Ok(value) => value.to_owned(),
        Err(err) => {
            doc.set_text_content(error_message, EMPTY_INPUT_MESSAGE);
            doc.remove_class(error_message, HIDDEN_CLASS);
            warn!("empty submission rejected");
            return Err(err);
        }
    };

    doc.set_text_content(error_message, "");
    doc.add_class(error_message, HIDDEN_CLASS);

    let element = create_marked(doc, &value, SUBMITTED_CONTENT_CLASS)?;
    doc.append_child(container, &element)?;
    doc.set_value(input, "");
    info!(len = value.len(), "content submitted");
    Ok(value)
}
