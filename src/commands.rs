use crate::{
    actions::{
        ERROR_MESSAGE_ID, HIDDEN_CLASS, SIMULATE_CLICK_ID, USER_FORM_ID, USER_INPUT_ID,
        add_element_to_dom, remove_element_from_dom, simulate_click,
    },
    dom::{Document, EventKind, MemoryDocument},
    error::{Error, Result},
};
use std::str::FromStr;

const DESCRIPTIONS: &str = "\
help                          display this text
add <container> <text>        append an element to a container
remove <id>                   detach an element
simulate <container> <text>   replace a container's content
type <text>                   set the value of the input field
submit                        submit the form
click                         click the button
show                          print the page
quit                          exit";

/// A line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Add { container: String, text: String },
    Remove { id: String },
    Simulate { container: String, message: String },
    Type { text: String },
    Submit,
    Click,
    Show,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let words = shlex::split(line).ok_or_else(|| Error::other("unbalanced quotes"))?;
        let Some((name, args)) = words.split_first() else {
            return Err(Error::other("empty command"));
        };

        let cmd = match (name.to_ascii_lowercase().as_str(), args) {
            ("help" | "h" | "?", []) => Self::Help,
            ("add", [container, text @ ..]) => Self::Add {
                container: container.clone(),
                text: text.join(" "),
            },
            ("remove" | "rm", [id]) => Self::Remove { id: id.clone() },
            ("simulate", [container, message @ ..]) => Self::Simulate {
                container: container.clone(),
                message: message.join(" "),
            },
            ("type", text) => Self::Type {
                text: text.join(" "),
            },
            ("submit", []) => Self::Submit,
            ("click", []) => Self::Click,
            ("show", []) => Self::Show,
            ("quit" | "exit", []) => Self::Quit,
            (other, _) => return Err(Error::other(format!("unknown command: {other}"))),
        };
        Ok(cmd)
    }
}

/// Run a command against the page and describe what happened.
pub fn answer(doc: &mut MemoryDocument, cmd: Command) -> String {
    match cmd {
        Command::Help => DESCRIPTIONS.into(),
        Command::Add { container, text } => match add_element_to_dom(doc, &container, &text) {
            Ok(_) => format!("added to #{container}"),
            Err(err) => format!("error: {err}"),
        },
        Command::Remove { id } => {
            if remove_element_from_dom(doc, &id) {
                format!("removed #{id}")
            } else {
                format!("#{id} not removed")
            }
        }
        Command::Simulate { container, message } => {
            match simulate_click(doc, &container, &message) {
                Ok(_) => format!("replaced content of #{container}"),
                Err(err) => format!("error: {err}"),
            }
        }
        Command::Type { text } => match doc.get_element_by_id(USER_INPUT_ID) {
            Some(input) => {
                doc.set_value(&input, &text);
                format!("typed {text:?}")
            }
            None => format!("error: {}", Error::missing(USER_INPUT_ID)),
        },
        Command::Submit => fire(doc, USER_FORM_ID, EventKind::Submit),
        Command::Click => fire(doc, SIMULATE_CLICK_ID, EventKind::Click),
        Command::Show => doc.outer_html(doc.root()),
        Command::Quit => "bye".into(),
    }
}

fn fire(doc: &mut MemoryDocument, target_id: &str, kind: EventKind) -> String {
    let Some(target) = doc.get_element_by_id(target_id) else {
        return format!("error: {}", Error::missing(target_id));
    };
    doc.dispatch(target, kind);

    match doc.get_element_by_id(ERROR_MESSAGE_ID) {
        Some(label) if !doc.has_class(&label, HIDDEN_CLASS) => {
            format!("{}: {}", kind.as_str(), doc.text_content(&label))
        }
        _ => format!("{}: ok", kind.as_str()),
    }
}
