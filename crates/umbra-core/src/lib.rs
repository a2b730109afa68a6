//! Platform model for umbra.
//!
//! This crate provides the in-process stand-in for the browser platform that
//! form-associated custom elements run against:
//!
//! - **Node Tree**: Elements, text, shadow roots, attributes, form ownership
//! - **Events**: Composed bubbling dispatch with cancelation
//! - **Microtasks**: FIFO checkpoint queue
//! - **Mutation Observers**: Batched child-list records
//! - **Custom Elements**: Lifecycle reactions bound to host nodes
//! - **Element Internals**: Form value, validity, ARIA role and states
//! - **Forms**: Reset, validation and submission entry lists
//! - **Signal/Slot System**: Type-safe change notification
//!
//! # Example
//!
//! ```
//! use umbra_core::{Document, EventType};
//!
//! let doc = Document::new();
//! let form = doc.create_element("form");
//! let input = doc.create_element("input");
//! doc.set_attribute(input, "name", "q").unwrap();
//! doc.append_child(doc.root(), form).unwrap();
//! doc.append_child(form, input).unwrap();
//!
//! doc.add_event_listener(input, EventType::Change, |event| {
//!     println!("committed on {:?}", event.target());
//! });
//! doc.user_type(input, "shadow dom").unwrap();
//!
//! assert!(doc.request_submit(form, None));
//! assert_eq!(doc.submissions()[0].values("q"), vec!["shadow dom"]);
//! ```

pub mod custom;
pub mod document;
mod error;
pub mod event;
pub mod form;
pub mod form_data;
pub mod internals;
pub mod logging;
pub mod microtask;
pub mod mutation;
pub mod signal;
pub mod tree;
mod user_agent;
pub mod validity;

pub use custom::{element_cast, element_cast_arc, CustomElement};
pub use document::{Document, WeakDocument};
pub use error::{DomError, DomResult};
pub use event::{Event, EventType, ListenerId};
pub use form::FormSubmission;
pub use form_data::{FileData, FormEntry, FormValue};
pub use internals::{Internals, InternalsSnapshot, ReportedValidity};
pub use logging::{TreeDebug, TreeFormatOptions, TreeStyle};
pub use microtask::MicrotaskId;
pub use mutation::{MutationObserver, MutationRecord};
pub use signal::{ConnectionId, Signal};
pub use tree::{NodeId, NodeKind, NodeTree};
pub use validity::{ValidityFlag, ValidityFlags};
