//! Custom element reactions.
//!
//! A type implementing [`CustomElement`] is bound to a host node with
//! [`crate::Document::define_element`]. The document then calls the
//! lifecycle methods when the host is connected or disconnected, when an
//! observed attribute changes, and (for form-associated elements) when the
//! owning form resets or a disabling fieldset toggles.
//!
//! Reactions always run with no platform lock held, so an implementation may
//! call back into the document freely.

use std::any::Any;
use std::sync::Arc;

/// Lifecycle hooks of an autonomous custom element.
pub trait CustomElement: Any + Send + Sync {
    /// Attribute names whose changes reach [`attribute_changed_callback`](Self::attribute_changed_callback).
    fn observed_attributes(&self) -> &[&'static str] {
        &[]
    }

    /// Whether the element takes part in forms (`static formAssociated = true`).
    fn is_form_associated(&self) -> bool {
        false
    }

    /// The host became connected to the document.
    fn connected_callback(&self) {}

    /// The host was removed from the document.
    fn disconnected_callback(&self) {}

    /// An observed attribute was added, changed or removed.
    fn attribute_changed_callback(&self, _name: &str, _old: Option<&str>, _new: Option<&str>) {}

    /// The form owner was reset.
    fn form_reset_callback(&self) {}

    /// The disabled state of the host changed (own attribute or fieldset).
    fn form_disabled_callback(&self, _disabled: bool) {}
}

/// Downcast a custom element to its concrete type.
pub fn element_cast<T: CustomElement>(element: &dyn CustomElement) -> Option<&T> {
    (element as &dyn Any).downcast_ref::<T>()
}

/// Downcast a shared custom element to its concrete type.
pub fn element_cast_arc<T: CustomElement>(element: Arc<dyn CustomElement>) -> Option<Arc<T>> {
    let any: Arc<dyn Any + Send + Sync> = element;
    any.downcast::<T>().ok()
}
