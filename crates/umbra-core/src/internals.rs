//! Element internals for form-associated custom elements.
//!
//! [`Internals`] is what a host gets from
//! [`crate::Document::attach_internals`]: the channel through which a custom
//! element reports its submission value, its validity and its accessibility
//! semantics to the platform.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use crate::document::WeakDocument;
use crate::event::EventType;
use crate::form_data::FormValue;
use crate::logging::targets;
use crate::tree::NodeId;
use crate::validity::ValidityFlags;

/// A validity message shown to the user by `reportValidity` or by
/// interactive form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedValidity {
    /// The element whose problem was reported.
    pub node: NodeId,
    /// The message shown.
    pub message: String,
}

/// Point-in-time copy of everything internals hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalsSnapshot {
    /// Submission value.
    pub form_value: Option<FormValue>,
    /// Restoration state.
    pub state: Option<FormValue>,
    /// Validity flags.
    pub validity: ValidityFlags,
    /// Validation message as stored.
    pub validation_message: String,
    /// Anchor node for the validation bubble.
    #[serde(skip)]
    pub validation_anchor: Option<NodeId>,
    /// ARIA role.
    pub role: Option<String>,
    /// ARIA attributes, keyed by their `aria-*` name.
    pub aria: BTreeMap<String, String>,
    /// Custom states (`:state()` pseudo-classes).
    pub states: BTreeSet<String>,
}

/// Internals attached to one host element.
pub struct Internals {
    host: NodeId,
    document: WeakDocument,
    state: Mutex<InternalsSnapshot>,
}

impl fmt::Debug for Internals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Internals")
            .field("host", &self.host)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl Internals {
    pub(crate) fn new(host: NodeId, document: WeakDocument) -> Self {
        Self {
            host,
            document,
            state: Mutex::new(InternalsSnapshot::default()),
        }
    }

    /// The host element.
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> InternalsSnapshot {
        self.state.lock().clone()
    }

    // =========================================================================
    // Form value
    // =========================================================================

    /// Set the submission value and, optionally, the restoration state.
    ///
    /// `None` means the host contributes nothing to its form.
    pub fn set_form_value(&self, value: Option<FormValue>, state: Option<FormValue>) {
        tracing::trace!(target: targets::CUSTOM, host = ?self.host, ?value, "set form value");
        let mut current = self.state.lock();
        current.state = state.or_else(|| value.clone());
        current.form_value = value;
    }

    /// The submission value.
    pub fn form_value(&self) -> Option<FormValue> {
        self.state.lock().form_value.clone()
    }

    /// The restoration state.
    pub fn state(&self) -> Option<FormValue> {
        self.state.lock().state.clone()
    }

    /// The form owner of the host.
    pub fn form(&self) -> Option<NodeId> {
        self.document.upgrade()?.form_owner(self.host)
    }

    // =========================================================================
    // Validity
    // =========================================================================

    /// Replace the validity flags and message.
    ///
    /// A valid flag set clears the message. `anchor` marks the node the
    /// validation bubble should point at.
    pub fn set_validity(&self, flags: ValidityFlags, message: &str, anchor: Option<NodeId>) {
        let mut current = self.state.lock();
        current.validity = flags;
        if flags.valid() {
            current.validation_message.clear();
            current.validation_anchor = None;
        } else {
            current.validation_message = message.to_string();
            current.validation_anchor = anchor;
        }
    }

    /// The validity flags.
    pub fn validity(&self) -> ValidityFlags {
        self.state.lock().validity
    }

    /// The anchor passed to the last [`set_validity`](Self::set_validity).
    pub fn validation_anchor(&self) -> Option<NodeId> {
        self.state.lock().validation_anchor
    }

    /// Whether the host is a candidate for constraint validation.
    ///
    /// Disabled and readonly hosts are barred.
    pub fn will_validate(&self) -> bool {
        let Some(document) = self.document.upgrade() else {
            return false;
        };
        document.is_form_associated(self.host)
            && document.with_tree(|t| !t.is_disabled(self.host) && !t.has_attribute(self.host, "readonly"))
    }

    /// The message a candidate shows; empty for barred hosts.
    pub fn validation_message(&self) -> String {
        if !self.will_validate() {
            return String::new();
        }
        self.state.lock().validation_message.clone()
    }

    /// Check validity, firing a cancelable `invalid` event when it fails.
    pub fn check_validity(&self) -> bool {
        self.check_validity_inner().0
    }

    /// Like [`check_validity`](Self::check_validity), but an uncanceled
    /// `invalid` event also reports the message to the user.
    pub fn report_validity(&self) -> bool {
        let (valid, reported) = self.check_validity_inner();
        if !valid && reported {
            let message = self.state.lock().validation_message.clone();
            tracing::info!(target: targets::CUSTOM, host = ?self.host, %message, "reported validity");
            if let Some(document) = self.document.upgrade() {
                document.inner.reported.lock().push(ReportedValidity {
                    node: self.host,
                    message,
                });
            }
        }
        valid
    }

    /// Returns (valid, invalid event not canceled).
    fn check_validity_inner(&self) -> (bool, bool) {
        if !self.will_validate() || self.validity().valid() {
            return (true, false);
        }
        let not_canceled = self
            .document
            .upgrade()
            .is_some_and(|document| document.fire(self.host, EventType::Invalid));
        (false, not_canceled)
    }

    // =========================================================================
    // Accessibility
    // =========================================================================

    /// Set or clear the ARIA role.
    pub fn set_role(&self, role: Option<&str>) {
        self.state.lock().role = role.map(str::to_string);
    }

    /// The ARIA role.
    pub fn role(&self) -> Option<String> {
        self.state.lock().role.clone()
    }

    /// Set or clear one `aria-*` attribute.
    pub fn set_aria(&self, name: &str, value: Option<&str>) {
        let mut current = self.state.lock();
        match value {
            Some(value) => {
                current.aria.insert(name.to_string(), value.to_string());
            }
            None => {
                current.aria.remove(name);
            }
        }
    }

    /// One `aria-*` attribute.
    pub fn aria(&self, name: &str) -> Option<String> {
        self.state.lock().aria.get(name).cloned()
    }

    /// Clear every `aria-*` attribute.
    pub fn clear_aria(&self) {
        self.state.lock().aria.clear();
    }

    // =========================================================================
    // Custom states
    // =========================================================================

    /// Add or remove a custom state.
    pub fn set_state(&self, name: &str, present: bool) {
        let mut current = self.state.lock();
        if present {
            current.states.insert(name.to_string());
        } else {
            current.states.remove(name);
        }
    }

    /// Whether a custom state is set.
    pub fn has_state(&self, name: &str) -> bool {
        self.state.lock().states.contains(name)
    }
}

impl crate::Document {
    /// Validity messages reported to the user so far, oldest first.
    pub fn reported_validity(&self) -> Vec<ReportedValidity> {
        self.inner.reported.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::CustomElement;
    use crate::validity::ValidityFlag;
    use crate::Document;
    use std::sync::Arc;

    struct Associated;
    impl CustomElement for Associated {
        fn is_form_associated(&self) -> bool {
            true
        }
    }

    fn attached() -> (Document, NodeId, Arc<Associated>, Arc<Internals>) {
        let doc = Document::new();
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), host).unwrap();
        let element = Arc::new(Associated);
        doc.define_element(host, &element).unwrap();
        let internals = doc.attach_internals(host).unwrap();
        (doc, host, element, internals)
    }

    #[test]
    fn test_form_value_and_state() {
        let (_doc, _host, _element, internals) = attached();
        internals.set_form_value(Some("a".into()), None);
        assert_eq!(internals.form_value(), Some("a".into()));
        assert_eq!(internals.state(), Some("a".into()));

        internals.set_form_value(None, Some("restore".into()));
        assert_eq!(internals.form_value(), None);
        assert_eq!(internals.state(), Some("restore".into()));
    }

    #[test]
    fn test_valid_flags_clear_message() {
        let (_doc, _host, _element, internals) = attached();
        internals.set_validity(ValidityFlags::only(ValidityFlag::ValueMissing), "fill", None);
        assert_eq!(internals.validation_message(), "fill");
        internals.set_validity(ValidityFlags::VALID, "ignored", None);
        assert_eq!(internals.validation_message(), "");
    }

    #[test]
    fn test_check_and_report_validity() {
        let (doc, host, _element, internals) = attached();
        assert!(internals.check_validity());

        internals.set_validity(ValidityFlags::only(ValidityFlag::TooShort), "too short", None);
        let fired = Arc::new(Mutex::new(0));
        let counter = fired.clone();
        doc.add_event_listener(host, EventType::Invalid, move |_| *counter.lock() += 1);

        assert!(!internals.check_validity());
        assert!(doc.reported_validity().is_empty());
        assert!(!internals.report_validity());
        assert_eq!(*fired.lock(), 2);
        assert_eq!(
            doc.reported_validity(),
            vec![ReportedValidity {
                node: host,
                message: "too short".into()
            }]
        );
    }

    #[test]
    fn test_canceled_invalid_is_not_reported() {
        let (doc, host, _element, internals) = attached();
        internals.set_validity(ValidityFlags::only(ValidityFlag::CustomError), "no", None);
        doc.add_event_listener(host, EventType::Invalid, |event| event.prevent_default());
        assert!(!internals.report_validity());
        assert!(doc.reported_validity().is_empty());
    }

    #[test]
    fn test_disabled_host_is_barred() {
        let (doc, host, _element, internals) = attached();
        internals.set_validity(ValidityFlags::only(ValidityFlag::ValueMissing), "fill", None);
        doc.toggle_attribute(host, "disabled", true).unwrap();
        assert!(!internals.will_validate());
        assert!(internals.check_validity());
        assert_eq!(internals.validation_message(), "");
        assert!(!internals.validity().valid());
    }

    #[test]
    fn test_aria_and_states() {
        let (_doc, _host, _element, internals) = attached();
        internals.set_role(Some("checkbox"));
        internals.set_aria("aria-checked", Some("true"));
        internals.set_state("checked", true);
        let snapshot = internals.snapshot();
        assert_eq!(snapshot.role.as_deref(), Some("checkbox"));
        assert_eq!(snapshot.aria.get("aria-checked").map(String::as_str), Some("true"));
        assert!(internals.has_state("checked"));

        internals.clear_aria();
        internals.set_role(None);
        internals.set_state("checked", false);
        assert_eq!(internals.snapshot().aria.len(), 0);
        assert_eq!(internals.role(), None);
        assert!(!internals.has_state("checked"));
    }

    #[test]
    fn test_form_back_reference() {
        let doc = Document::new();
        let form = doc.create_element("form");
        let host = doc.create_element("x-field");
        doc.append_child(doc.root(), form).unwrap();
        doc.append_child(form, host).unwrap();
        let internals = doc.attach_internals(host).unwrap();
        assert_eq!(internals.form(), Some(form));
    }
}
