//! Form reset and submission.
//!
//! Reset returns every listed control of a form to its default state; custom
//! elements are asked to do so through
//! [`CustomElement::form_reset_callback`](crate::CustomElement::form_reset_callback).
//!
//! Submission validates the listed controls (unless `novalidate` is set),
//! fires `submit`, and builds the entry list from native control values and
//! the form values custom elements set on their internals. The platform
//! never navigates; each accepted submission is recorded on the document and
//! announced through [`Document::submitted`].

use serde::Serialize;

use crate::document::Document;
use crate::event::EventType;
use crate::form_data::{FormEntry, FormValue};
use crate::internals::ReportedValidity;
use crate::logging::targets;
use crate::signal::Signal;
use crate::tree::NodeId;

/// An accepted form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSubmission {
    /// The submitted form.
    #[serde(skip)]
    pub form: NodeId,
    /// The submitter, if submission was triggered by a button.
    #[serde(skip)]
    pub submitter: Option<NodeId>,
    /// The entry list in tree order.
    pub entries: Vec<FormEntry>,
}

impl FormSubmission {
    /// Text values of every entry named `name`.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.name == name)
            .filter_map(|entry| entry.value.as_text())
            .collect()
    }

    /// The first entry named `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }
}

/// Input types that never contribute an entry on their own.
const BUTTON_INPUT_TYPES: [&str; 4] = ["button", "submit", "reset", "image"];

impl Document {
    /// Listed elements (native controls and form-associated custom elements)
    /// owned by `form`, in tree order.
    pub fn form_elements(&self, form: NodeId) -> Vec<NodeId> {
        let candidates = self.with_tree(|t| {
            let scope = t.tree_root(form);
            t.descendants(scope, false)
        });
        let associated: Vec<NodeId> = candidates
            .into_iter()
            .filter(|n| self.is_form_associated(*n))
            .collect();
        self.with_tree(|t| t.associated_elements(form, |n| associated.contains(&n)))
    }

    /// Reset `form`.
    ///
    /// Returns `false` when a listener canceled the `reset` event.
    pub fn reset_form(&self, form: NodeId) -> bool {
        if !self.with_tree(|t| t.is_element(form, "form")) {
            return false;
        }
        if !self.fire(form, EventType::Reset) {
            tracing::debug!(target: targets::FORM, ?form, "reset canceled");
            return false;
        }
        tracing::debug!(target: targets::FORM, ?form, "resetting form");
        for element in self.form_elements(form) {
            if let Some(custom) = self.custom_element(element) {
                custom.form_reset_callback();
            } else {
                let _ = self.with_tree_mut(|t| t.reset_control(element));
            }
        }
        true
    }

    /// Submit `form` as if `submitter` (or nothing) activated it.
    ///
    /// Returns `true` when the submission was accepted.
    #[tracing::instrument(skip(self), target = "umbra_core::form", level = "debug")]
    pub fn request_submit(&self, form: NodeId, submitter: Option<NodeId>) -> bool {
        if !self.with_tree(|t| t.is_element(form, "form")) {
            return false;
        }
        let no_validate = self.has_attribute(form, "novalidate")
            || submitter.is_some_and(|s| self.has_attribute(s, "formnovalidate"));

        if !no_validate && !self.interactively_validate(form) {
            tracing::debug!(target: targets::FORM, ?form, "submission blocked by invalid controls");
            return false;
        }
        if !self.fire(form, EventType::Submit) {
            tracing::debug!(target: targets::FORM, ?form, "submit canceled");
            return false;
        }

        let submission = FormSubmission {
            form,
            submitter,
            entries: self.form_entries(form, submitter),
        };
        tracing::info!(target: targets::FORM, ?form, entries = submission.entries.len(), "form submitted");
        self.inner.submissions.lock().push(submission.clone());
        self.inner.submitted.emit(submission);
        true
    }

    /// Fire `invalid` at every invalid candidate and report the first one
    /// whose event was not canceled. Returns `true` when all are valid.
    fn interactively_validate(&self, form: NodeId) -> bool {
        let mut first_report: Option<ReportedValidity> = None;
        let mut valid = true;
        for element in self.form_elements(form) {
            let message = if let Some(internals) = self.internals(element)
                && self.is_form_associated(element)
            {
                if !internals.will_validate() || internals.validity().valid() {
                    continue;
                }
                internals.validation_message()
            } else {
                match self.with_tree(|t| t.native_validity(element)) {
                    Some((flags, message)) if !flags.valid() => message,
                    _ => continue,
                }
            };
            valid = false;
            if self.fire(element, EventType::Invalid) && first_report.is_none() {
                first_report = Some(ReportedValidity {
                    node: element,
                    message,
                });
            }
        }
        if let Some(report) = first_report {
            self.inner.reported.lock().push(report);
        }
        valid
    }

    /// Build the entry list of `form`.
    pub fn form_entries(&self, form: NodeId, submitter: Option<NodeId>) -> Vec<FormEntry> {
        let mut entries = Vec::new();
        for element in self.form_elements(form) {
            if self.is_disabled(element) {
                continue;
            }
            if self.is_form_associated(element) {
                let Some(value) = self.internals(element).and_then(|i| i.form_value()) else {
                    continue;
                };
                match value {
                    FormValue::Entries(list) => entries.extend(list),
                    other => {
                        if let Some(name) = self.get_attribute(element, "name").filter(|n| !n.is_empty()) {
                            entries.push(FormEntry::new(name, other));
                        }
                    }
                }
                continue;
            }

            let entry = self.with_tree(|t| {
                let name = t.attribute(element, "name").filter(|n| !n.is_empty())?;
                let is_submitter = submitter == Some(element);
                match t.tag_name(element)? {
                    "button" => {
                        let kind = t.attribute(element, "type").unwrap_or("submit");
                        if !is_submitter || !kind.eq_ignore_ascii_case("submit") {
                            return None;
                        }
                    }
                    "input" => {
                        let kind = t.input_type(element)?;
                        if BUTTON_INPUT_TYPES.contains(&kind) && !(is_submitter && kind == "submit") {
                            return None;
                        }
                        if t.is_checkable(element) && t.control_checked(element) != Some(true) {
                            return None;
                        }
                        if kind == "file" {
                            return None;
                        }
                    }
                    _ => {}
                }
                Some(FormEntry::new(name, t.control_value(element)?))
            });
            entries.extend(entry);
        }
        entries
    }

    /// Every accepted submission so far, oldest first.
    pub fn submissions(&self) -> Vec<FormSubmission> {
        self.inner.submissions.lock().clone()
    }

    /// Emitted after each accepted submission.
    pub fn submitted(&self) -> &Signal<FormSubmission> {
        &self.inner.submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::CustomElement;
    use crate::internals::Internals;
    use crate::validity::{ValidityFlag, ValidityFlags};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Field {
        resets: Mutex<u32>,
    }

    impl CustomElement for Field {
        fn is_form_associated(&self) -> bool {
            true
        }
        fn form_reset_callback(&self) {
            *self.resets.lock() += 1;
        }
    }

    struct Fixture {
        doc: Document,
        form: NodeId,
        host: NodeId,
        field: Arc<Field>,
        internals: Arc<Internals>,
    }

    fn fixture() -> Fixture {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.append_child(doc.root(), form).unwrap();

        let text = doc.create_element("input");
        doc.set_attribute(text, "name", "first").unwrap();
        doc.set_attribute(text, "value", "Ada").unwrap();
        doc.append_child(form, text).unwrap();

        let host = doc.create_element("x-field");
        doc.set_attribute(host, "name", "last").unwrap();
        doc.append_child(form, host).unwrap();
        let field = Arc::new(Field {
            resets: Mutex::new(0),
        });
        doc.define_element(host, &field).unwrap();
        let internals = doc.attach_internals(host).unwrap();

        Fixture {
            doc,
            form,
            host,
            field,
            internals,
        }
    }

    #[test]
    fn test_entries_include_custom_form_value() {
        let f = fixture();
        f.internals.set_form_value(Some("Lovelace".into()), None);
        assert!(f.doc.request_submit(f.form, None));
        let submission = f.doc.submissions().pop().unwrap();
        assert_eq!(submission.values("first"), vec!["Ada"]);
        assert_eq!(submission.values("last"), vec!["Lovelace"]);
    }

    #[test]
    fn test_null_form_value_contributes_nothing() {
        let f = fixture();
        f.internals.set_form_value(None, None);
        let entries = f.doc.form_entries(f.form, None);
        assert_eq!(entries, vec![FormEntry::new("first", "Ada")]);
    }

    #[test]
    fn test_entries_value_expands() {
        let f = fixture();
        f.internals.set_form_value(
            Some(FormValue::Entries(vec![
                FormEntry::new("a", "1"),
                FormEntry::new("b", "2"),
            ])),
            None,
        );
        let names: Vec<String> = f
            .doc
            .form_entries(f.form, None)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["first", "a", "b"]);
    }

    #[test]
    fn test_checkables_only_when_checked() {
        let f = fixture();
        let checkbox = f.doc.create_element("input");
        f.doc.set_attribute(checkbox, "type", "checkbox").unwrap();
        f.doc.set_attribute(checkbox, "name", "agree").unwrap();
        f.doc.append_child(f.form, checkbox).unwrap();

        let entries = f.doc.form_entries(f.form, None);
        assert!(entries.iter().all(|e| e.name != "agree"));

        f.doc.set_control_checked(checkbox, true).unwrap();
        let entries = f.doc.form_entries(f.form, None);
        assert!(entries.contains(&FormEntry::new("agree", "on")));
    }

    #[test]
    fn test_invalid_custom_element_blocks_submission() {
        let f = fixture();
        f.internals.set_form_value(Some("x".into()), None);
        f.internals
            .set_validity(ValidityFlags::only(ValidityFlag::TooShort), "Too short", None);

        assert!(!f.doc.request_submit(f.form, None));
        assert!(f.doc.submissions().is_empty());
        assert_eq!(
            f.doc.reported_validity(),
            vec![ReportedValidity {
                node: f.host,
                message: "Too short".into()
            }]
        );

        f.doc.toggle_attribute(f.form, "novalidate", true).unwrap();
        assert!(f.doc.request_submit(f.form, None));
    }

    #[test]
    fn test_canceled_submit_event() {
        let f = fixture();
        f.doc
            .add_event_listener(f.form, EventType::Submit, |event| event.prevent_default());
        assert!(!f.doc.request_submit(f.form, None));
        assert!(f.doc.submissions().is_empty());
    }

    #[test]
    fn test_submitted_signal() {
        let f = fixture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.doc
            .submitted()
            .connect(move |submission: &FormSubmission| sink.lock().push(submission.entries.len()));
        assert!(f.doc.request_submit(f.form, None));
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_reset_restores_natives_and_calls_custom() {
        let f = fixture();
        let text = f.doc.with_tree(|t| t.children(f.form).unwrap()[0]);
        f.doc.set_control_value(text, "Grace").unwrap();

        assert!(f.doc.reset_form(f.form));
        assert_eq!(f.doc.control_value(text).as_deref(), Some("Ada"));
        assert_eq!(*f.field.resets.lock(), 1);

        f.doc
            .add_event_listener(f.form, EventType::Reset, |event| event.prevent_default());
        assert!(!f.doc.reset_form(f.form));
        assert_eq!(*f.field.resets.lock(), 1);
    }

    #[test]
    fn test_disabled_controls_are_skipped() {
        let f = fixture();
        f.internals.set_form_value(Some("x".into()), None);
        f.doc.toggle_attribute(f.host, "disabled", true).unwrap();
        let entries = f.doc.form_entries(f.form, None);
        assert_eq!(entries, vec![FormEntry::new("first", "Ada")]);
    }

    #[test]
    fn test_submitter_button_contributes() {
        let f = fixture();
        let button = f.doc.create_element("button");
        f.doc.set_attribute(button, "name", "action").unwrap();
        f.doc.set_attribute(button, "value", "save").unwrap();
        f.doc.append_child(f.form, button).unwrap();

        assert!(f.doc.form_entries(f.form, None).iter().all(|e| e.name != "action"));
        assert!(f
            .doc
            .form_entries(f.form, Some(button))
            .contains(&FormEntry::new("action", "save")));
    }
}
