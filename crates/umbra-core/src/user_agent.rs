//! Simulated user interaction.
//!
//! These helpers reproduce what a browser does when a person types, clicks or
//! presses a key: the native state change, the event sequence, the default
//! action, and a microtask checkpoint at the end of the task.

use crate::document::Document;
use crate::error::DomResult;
use crate::event::{Event, EventType};
use crate::logging::targets;
use crate::tree::{NodeId, NodeTree};

/// What activating an element does once its `click` event was not canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Submit,
    Reset,
    None,
}

fn activation(tree: &NodeTree, node: NodeId) -> Activation {
    match tree.tag_name(node) {
        Some("button") => match tree
            .attribute(node, "type")
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("reset") => Activation::Reset,
            Some("button") => Activation::None,
            _ => Activation::Submit,
        },
        Some("input") => match tree.input_type(node) {
            Some("submit" | "image") => Activation::Submit,
            Some("reset") => Activation::Reset,
            _ => Activation::None,
        },
        _ => Activation::None,
    }
}

impl Document {
    /// Replace the value of a native control as typed input.
    ///
    /// Fires `input` then `change` at the control.
    pub fn user_type(&self, node: NodeId, text: &str) -> DomResult<()> {
        self.set_control_value(node, text)?;
        tracing::debug!(target: targets::EVENT, ?node, %text, "user typed");
        self.fire(node, EventType::Input);
        self.fire(node, EventType::Change);
        self.run_microtasks();
        Ok(())
    }

    /// Click `node`.
    ///
    /// Checkboxes toggle and radios check before `click` fires; canceling the
    /// click restores them, otherwise `input` and `change` follow. Submit and
    /// reset buttons act on their form owner. Disabled controls ignore clicks.
    pub fn user_click(&self, node: NodeId) -> DomResult<()> {
        let (disabled, input_type, group) = self.with_tree(|t| {
            let input_type = t.input_type(node);
            let group = match input_type {
                Some("radio") => t.native_radio_group(node),
                Some("checkbox") => vec![node],
                _ => Vec::new(),
            };
            let disabled = t.is_native_control(node) && t.is_disabled(node);
            (disabled, input_type, group)
        });
        if disabled {
            return Ok(());
        }

        let saved: Vec<(NodeId, bool)> = group
            .iter()
            .map(|n| (*n, self.control_checked(*n).unwrap_or(false)))
            .collect();
        let was_checked = self.control_checked(node).unwrap_or(false);
        match input_type {
            Some("checkbox") => self.set_control_checked(node, !was_checked)?,
            Some("radio") => self.set_control_checked(node, true)?,
            _ => {}
        }

        tracing::debug!(target: targets::EVENT, ?node, "user clicked");
        let not_canceled = self.fire(node, EventType::Click);

        if !saved.is_empty() {
            if !not_canceled {
                for (radio, checked) in saved {
                    self.with_tree_mut(|t| t.set_control_checked(radio, checked))?;
                }
            } else if input_type == Some("checkbox") || !was_checked {
                self.fire(node, EventType::Input);
                self.fire(node, EventType::Change);
            }
        } else if not_canceled {
            let (action, form) = self.with_tree(|t| (activation(t, node), t.form_owner(node)));
            match (action, form) {
                (Activation::Submit, Some(form)) => {
                    self.request_submit(form, Some(node));
                }
                (Activation::Reset, Some(form)) => {
                    self.reset_form(form);
                }
                _ => {}
            }
        }

        self.run_microtasks();
        Ok(())
    }

    /// Press `key` while `node` has focus.
    ///
    /// Enter in a native single-line input clicks the form's default button,
    /// the first native submit button it owns. Forms whose submitter is a
    /// custom element handle Enter through their own `keydown` listeners.
    pub fn user_key(&self, node: NodeId, key: &str) -> DomResult<()> {
        let event = Event::key_down(node, key);
        let not_canceled = self.dispatch_event(&event);

        if not_canceled && key == "Enter" {
            let form = self.with_tree(|t| {
                let single_line = matches!(
                    t.input_type(node),
                    Some(
                        "text" | "password" | "email" | "tel" | "url" | "search" | "number"
                            | "date" | "time" | "datetime-local" | "month" | "week"
                    )
                );
                if single_line { t.form_owner(node) } else { None }
            });
            if let Some(form) = form {
                let default_button = self
                    .form_elements(form)
                    .into_iter()
                    .find(|n| self.with_tree(|t| activation(t, *n) == Activation::Submit));
                if let Some(button) = default_button {
                    tracing::debug!(target: targets::EVENT, ?form, ?button, "implicit submission");
                    return self.user_click(button);
                }
            }
        }

        self.run_microtasks();
        Ok(())
    }

    /// Press a pointer button over `node`.
    pub fn user_mouse_down(&self, node: NodeId) {
        self.fire(node, EventType::MouseDown);
        self.run_microtasks();
    }

    /// Release a pointer button over `node`.
    pub fn user_mouse_up(&self, node: NodeId) {
        self.fire(node, EventType::MouseUp);
        self.run_microtasks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn event_log(doc: &Document, node: NodeId) -> Arc<Mutex<Vec<EventType>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for event_type in [EventType::Click, EventType::Input, EventType::Change] {
            let log = log.clone();
            doc.add_event_listener(node, event_type, move |event| log.lock().push(event.event_type()));
        }
        log
    }

    #[test]
    fn test_user_type_fires_input_then_change() {
        let doc = Document::new();
        let input = doc.create_element("input");
        doc.append_child(doc.root(), input).unwrap();
        let log = event_log(&doc, input);

        doc.user_type(input, "hello").unwrap();
        assert_eq!(doc.control_value(input).as_deref(), Some("hello"));
        assert_eq!(*log.lock(), vec![EventType::Input, EventType::Change]);
    }

    #[test]
    fn test_checkbox_click_sequence() {
        let doc = Document::new();
        let checkbox = doc.create_element("input");
        doc.set_attribute(checkbox, "type", "checkbox").unwrap();
        doc.append_child(doc.root(), checkbox).unwrap();
        let log = event_log(&doc, checkbox);

        let checked_during_click = Arc::new(Mutex::new(None));
        let observed = checked_during_click.clone();
        let weak = doc.downgrade();
        doc.add_event_listener(checkbox, EventType::Click, move |event| {
            if let Some(doc) = weak.upgrade() {
                *observed.lock() = doc.control_checked(event.target());
            }
        });

        doc.user_click(checkbox).unwrap();
        assert_eq!(doc.control_checked(checkbox), Some(true));
        assert_eq!(*checked_during_click.lock(), Some(true));
        assert_eq!(
            *log.lock(),
            vec![EventType::Click, EventType::Input, EventType::Change]
        );
    }

    #[test]
    fn test_canceled_click_restores_checkbox() {
        let doc = Document::new();
        let checkbox = doc.create_element("input");
        doc.set_attribute(checkbox, "type", "checkbox").unwrap();
        doc.append_child(doc.root(), checkbox).unwrap();
        doc.add_event_listener(checkbox, EventType::Click, |event| event.prevent_default());
        let log = event_log(&doc, checkbox);

        doc.user_click(checkbox).unwrap();
        assert_eq!(doc.control_checked(checkbox), Some(false));
        assert_eq!(*log.lock(), vec![EventType::Click]);
    }

    #[test]
    fn test_clicking_checked_radio_fires_no_change() {
        let doc = Document::new();
        let radio = doc.create_element("input");
        doc.set_attribute(radio, "type", "radio").unwrap();
        doc.set_attribute(radio, "checked", "").unwrap();
        doc.append_child(doc.root(), radio).unwrap();
        let log = event_log(&doc, radio);

        doc.user_click(radio).unwrap();
        assert_eq!(*log.lock(), vec![EventType::Click]);
    }

    #[test]
    fn test_submit_and_reset_buttons() {
        let doc = Document::new();
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        let submit = doc.create_element("button");
        let reset = doc.create_element("input");
        doc.set_attribute(input, "name", "q").unwrap();
        doc.set_attribute(reset, "type", "reset").unwrap();
        doc.append_child(doc.root(), form).unwrap();
        for node in [input, submit, reset] {
            doc.append_child(form, node).unwrap();
        }

        doc.user_type(input, "rust").unwrap();
        doc.user_click(submit).unwrap();
        let submissions = doc.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].values("q"), vec!["rust"]);
        assert_eq!(submissions[0].submitter, Some(submit));

        doc.user_click(reset).unwrap();
        assert_eq!(doc.control_value(input).as_deref(), Some(""));
    }

    #[test]
    fn test_enter_clicks_default_button() {
        let doc = Document::new();
        let form = doc.create_element("form");
        let input = doc.create_element("input");
        let plain = doc.create_element("button");
        let submit = doc.create_element("input");
        doc.set_attribute(plain, "type", "button").unwrap();
        doc.set_attribute(submit, "type", "submit").unwrap();
        doc.append_child(doc.root(), form).unwrap();
        for node in [input, plain, submit] {
            doc.append_child(form, node).unwrap();
        }

        doc.user_key(input, "a").unwrap();
        assert!(doc.submissions().is_empty());
        doc.user_key(input, "Enter").unwrap();
        let submissions = doc.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].submitter, Some(submit));
    }

    #[test]
    fn test_disabled_control_ignores_click() {
        let doc = Document::new();
        let checkbox = doc.create_element("input");
        doc.set_attribute(checkbox, "type", "checkbox").unwrap();
        doc.set_attribute(checkbox, "disabled", "").unwrap();
        doc.append_child(doc.root(), checkbox).unwrap();
        doc.user_click(checkbox).unwrap();
        assert_eq!(doc.control_checked(checkbox), Some(false));
    }
}
