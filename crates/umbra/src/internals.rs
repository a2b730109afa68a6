//! The form-association capability a controller writes to.
//!
//! [`ElementInternals`] is the narrow interface through which a
//! [`FormParticipationController`](crate::controller::FormParticipationController)
//! reports its submission value, validity and ARIA semantics. The platform's
//! [`umbra_core::Internals`] implements it; embedders targeting another host
//! (or tests that want to observe the writes) can supply their own.

use umbra_core::{FormValue, Internals, InternalsSnapshot, NodeId, ValidityFlags};

/// Form association and accessibility reporting for one host element.
pub trait ElementInternals: Send + Sync {
    /// Set the submission value and restoration state.
    fn set_form_value(&self, value: Option<FormValue>, state: Option<FormValue>);

    /// Replace the validity flags and message.
    fn set_validity(&self, flags: ValidityFlags, message: &str, anchor: Option<NodeId>);

    /// The current validity flags.
    fn validity(&self) -> ValidityFlags;

    /// The message shown for the current validity; empty for barred hosts.
    fn validation_message(&self) -> String;

    /// Whether the host is a candidate for constraint validation.
    fn will_validate(&self) -> bool;

    /// Check validity, firing `invalid` when it fails.
    fn check_validity(&self) -> bool;

    /// Check validity and report the message to the user when it fails.
    fn report_validity(&self) -> bool;

    /// Set or clear the ARIA role.
    fn set_role(&self, role: Option<&str>);

    /// Set or clear one `aria-*` attribute.
    fn set_aria(&self, name: &str, value: Option<&str>);

    /// Clear every `aria-*` attribute.
    fn clear_aria(&self);

    /// The form owner of the host.
    fn form(&self) -> Option<NodeId>;

    /// A copy of everything the internals hold.
    fn snapshot(&self) -> InternalsSnapshot;
}

impl ElementInternals for Internals {
    fn set_form_value(&self, value: Option<FormValue>, state: Option<FormValue>) {
        Internals::set_form_value(self, value, state);
    }

    fn set_validity(&self, flags: ValidityFlags, message: &str, anchor: Option<NodeId>) {
        Internals::set_validity(self, flags, message, anchor);
    }

    fn validity(&self) -> ValidityFlags {
        Internals::validity(self)
    }

    fn validation_message(&self) -> String {
        Internals::validation_message(self)
    }

    fn will_validate(&self) -> bool {
        Internals::will_validate(self)
    }

    fn check_validity(&self) -> bool {
        Internals::check_validity(self)
    }

    fn report_validity(&self) -> bool {
        Internals::report_validity(self)
    }

    fn set_role(&self, role: Option<&str>) {
        Internals::set_role(self, role);
    }

    fn set_aria(&self, name: &str, value: Option<&str>) {
        Internals::set_aria(self, name, value);
    }

    fn clear_aria(&self) {
        Internals::clear_aria(self);
    }

    fn form(&self) -> Option<NodeId> {
        Internals::form(self)
    }

    fn snapshot(&self) -> InternalsSnapshot {
        Internals::snapshot(self)
    }
}
