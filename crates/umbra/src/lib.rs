//! Umbra - form-associated custom elements across shadow DOM boundaries.
//!
//! A custom element whose editable surface is a native control inside its
//! shadow tree still has to behave like a built-in control towards the
//! surrounding `<form>`: submit a value, validate, reset, form radio groups
//! and expose the right ARIA semantics. This crate provides the engine that
//! keeps all of that in sync:
//!
//! - **Descriptors** ([`descriptor`]): what kind of control an element is
//! - **Validity** ([`validity`]): constraint checks and their messages
//! - **ARIA** ([`aria`]): roles and attributes per control kind
//! - **Binding** ([`binding`]): finding the native control in the shadow tree
//! - **Controller** ([`controller`]): the participation state machine
//! - **Element** ([`element`]): the custom element a UI layer works with
//!
//! The platform these run against (node tree, events, forms, internals) is
//! [`umbra_core`], re-exported here.
//!
//! # Example
//!
//! ```
//! use umbra::{ControlKind, Document, FormControlDescriptor, FormControlElement};
//!
//! let doc = Document::new();
//! let form = doc.create_element("form");
//! doc.append_child(doc.root(), form).unwrap();
//!
//! let field = FormControlElement::create(&doc, "x-number-field").unwrap();
//! doc.append_child(form, field.host()).unwrap();
//!
//! // The component renders its native control into the shadow root.
//! let shadow = doc.attach_shadow(field.host()).unwrap();
//! let input = doc.create_element("input");
//! doc.set_attribute(input, "type", "number").unwrap();
//! doc.append_child(shadow, input).unwrap();
//! doc.run_microtasks();
//!
//! field.set_form_control(
//!     FormControlDescriptor::new(ControlKind::Number)
//!         .with_name("qty")
//!         .with_min("10")
//!         .with_max("20"),
//! );
//! doc.user_type(input, "15.5").unwrap();
//!
//! assert!(field.validity().step_mismatch);
//! assert!(!doc.request_submit(form, None));
//! ```

pub mod aria;
pub mod binding;
pub mod config;
pub mod controller;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod internals;
pub mod validity;

pub use aria::{AriaMapping, AriaRole};
pub use binding::{BindingSelector, InputBindingObserver};
pub use config::{DiagnosticsConfig, FormsConfig, MessageCatalog};
pub use controller::{FormParticipationController, Provenance};
pub use descriptor::{ButtonType, Control, ControlKind, FormControlDescriptor};
pub use element::FormControlElement;
pub use error::{DescriptorError, Result};
pub use internals::ElementInternals;
pub use validity::{ValidityEngine, ValidityInput, ValidityReport};

pub use umbra_core;
pub use umbra_core::{
    Document, DomError, Event, EventType, FileData, FormEntry, FormSubmission, FormValue, NodeId,
    Signal, ValidityFlag, ValidityFlags,
};
