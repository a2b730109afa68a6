//! The form-associated custom element.
//!
//! [`FormControlElement`] binds a [`FormParticipationController`] to a host
//! node and exposes the property surface a UI layer works with:
//! `formControl`, `value`, `checked`, the descriptor fields, the validity
//! methods and the change signals.
//!
//! # Attributes
//!
//! `value`, `name`, `checked`, `disabled`, `required`, `readonly`,
//! `placeholder`, `role`, `min`, `max` and `step` are observed. Descriptor
//! field properties (`name`, `disabled`, `required`, `readonly`,
//! `placeholder`, `min`, `max`, `step`, `role`) are written through their
//! attribute, so the attribute is always the source. `value` and `checked`
//! attributes feed the properties but are never written back.
//!
//! # Buttons
//!
//! `button` and `image` controls act on their form owner when clicked. The
//! action is deferred to a microtask, so a listener that cancels the click
//! synchronously (anywhere along the propagation path) still prevents it.
//! Without an explicit `type`, a control with a form owner submits and one
//! without does nothing. In a form without a native submit button, Enter in
//! a single-line field submits through the first submit-type element.
//!
//! # Example
//!
//! ```
//! use umbra::descriptor::{ControlKind, FormControlDescriptor};
//! use umbra::element::FormControlElement;
//! use umbra_core::Document;
//!
//! let doc = Document::new();
//! let form = doc.create_element("form");
//! doc.append_child(doc.root(), form).unwrap();
//!
//! let field = FormControlElement::create(&doc, "x-text-field").unwrap();
//! doc.append_child(form, field.host()).unwrap();
//! field.set_form_control(
//!     FormControlDescriptor::new(ControlKind::Text)
//!         .with_name("city")
//!         .with_value("Oslo"),
//! );
//!
//! assert!(doc.request_submit(form, None));
//! assert_eq!(doc.submissions()[0].values("city"), vec!["Oslo"]);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use umbra_core::logging::targets;
use umbra_core::{
    element_cast, CustomElement, Document, Event, EventType, FileData, FormValue,
    InternalsSnapshot, ListenerId, NodeId, Signal, ValidityFlags, WeakDocument,
};

use crate::config::FormsConfig;
use crate::controller::{FormParticipationController, Provenance};
use crate::descriptor::{ButtonType, ControlKind, FormControlDescriptor};
use crate::error::Result;
use crate::validity::ValidityReport;

/// Attribute names the element reacts to.
pub const OBSERVED_ATTRIBUTES: &[&str] = &[
    "value",
    "name",
    "checked",
    "disabled",
    "required",
    "readonly",
    "placeholder",
    "role",
    "min",
    "max",
    "step",
];

/// A custom element taking part in forms through its internals.
pub struct FormControlElement {
    me: Weak<Self>,
    document: WeakDocument,
    host: NodeId,
    controller: Arc<FormParticipationController>,
    /// Listeners on the host, removed on drop.
    host_listeners: Mutex<Vec<ListenerId>>,
    /// The `keydown` listener on the form owner while connected.
    form_listener: Mutex<Option<ListenerId>>,
}

impl std::fmt::Debug for FormControlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormControlElement")
            .field("host", &self.host)
            .field("controller", &self.controller)
            .finish()
    }
}

impl FormControlElement {
    /// Create a host element with tag `tag` and upgrade it.
    pub fn create(document: &Document, tag: &str) -> Result<Arc<Self>> {
        let host = document.create_element(tag);
        Self::upgrade(document, host)
    }

    /// Upgrade an existing element with the default configuration.
    pub fn upgrade(document: &Document, host: NodeId) -> Result<Arc<Self>> {
        Self::upgrade_with_config(document, host, Arc::new(FormsConfig::default()))
    }

    /// Upgrade an existing element.
    ///
    /// Attaches internals, builds the controller and registers the element
    /// with the document. Existing observed attributes are applied, and the
    /// element connects right away if the host already is.
    pub fn upgrade_with_config(
        document: &Document,
        host: NodeId,
        config: Arc<FormsConfig>,
    ) -> Result<Arc<Self>> {
        let internals = document.attach_internals(host)?;
        let controller = FormParticipationController::new(document, host, internals, config);
        let element = Arc::new_cyclic(|me| Self {
            me: me.clone(),
            document: document.downgrade(),
            host,
            controller,
            host_listeners: Mutex::new(Vec::new()),
            form_listener: Mutex::new(None),
        });
        element.install_host_listeners(document);
        document.define_element(host, &element)?;
        tracing::debug!(target: targets::CONTROLLER, ?host, "form control element upgraded");
        Ok(element)
    }

    fn install_host_listeners(self: &Arc<Self>, document: &Document) {
        let weak = Arc::downgrade(self);
        let on_click = weak.clone();
        let click = document.add_event_listener(self.host, EventType::Click, move |event| {
            if let Some(element) = on_click.upgrade() {
                element.on_click(event);
            }
        });
        let on_down = weak.clone();
        let down = document.add_event_listener(self.host, EventType::MouseDown, move |_| {
            if let Some(element) = on_down.upgrade() {
                element.controller.set_pressed(true);
            }
        });
        let up = document.add_event_listener(self.host, EventType::MouseUp, move |_| {
            if let Some(element) = weak.upgrade() {
                element.controller.set_pressed(false);
            }
        });
        self.host_listeners.lock().extend([click, down, up]);
    }

    /// The host element.
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// The controller behind this element.
    pub fn controller(&self) -> &Arc<FormParticipationController> {
        &self.controller
    }

    // =========================================================================
    // Descriptor
    // =========================================================================

    /// The current descriptor.
    pub fn form_control(&self) -> FormControlDescriptor {
        self.controller.descriptor()
    }

    /// Replace the descriptor and re-initialize.
    ///
    /// `name`, `disabled`, `required`, `readonly`, `placeholder`, `min`,
    /// `max` and `step` are reflected onto the host.
    pub fn set_form_control(&self, descriptor: FormControlDescriptor) {
        let reflected = [
            ("name", descriptor.name.clone()),
            ("disabled", descriptor.disabled.then(String::new)),
            ("required", descriptor.required.then(String::new)),
            ("readonly", descriptor.readonly.then(String::new)),
            ("placeholder", descriptor.placeholder().map(str::to_string)),
            ("min", descriptor.min().map(str::to_string)),
            ("max", descriptor.max().map(str::to_string)),
            ("step", descriptor.step().map(str::to_string)),
        ];
        self.controller.set_descriptor(descriptor);
        for (name, value) in reflected {
            self.reflect(name, value.as_deref());
        }
    }

    /// Write a reflected attribute. The attribute callback updates the
    /// descriptor.
    fn reflect(&self, name: &str, value: Option<&str>) {
        let Some(document) = self.document.upgrade() else {
            return;
        };
        if document.get_attribute(self.host, name).as_deref() == value {
            return;
        }
        let result = match value {
            Some(value) => document.set_attribute(self.host, name, value),
            None => document.remove_attribute(self.host, name),
        };
        if let Err(err) = result {
            tracing::debug!(target: targets::CONTROLLER, host = ?self.host, %name, %err, "could not reflect attribute");
        }
    }

    // =========================================================================
    // Value and checkedness
    // =========================================================================

    /// The canonical value.
    pub fn value(&self) -> Option<FormValue> {
        self.controller.value()
    }

    /// Set the value.
    pub fn set_value(&self, value: impl Into<FormValue>) {
        self.controller.set_value(Some(value.into()), Provenance::Property);
    }

    /// Clear the value (`null`).
    pub fn clear_value(&self) {
        self.controller.set_value(None, Provenance::Property);
    }

    /// The canonical checkedness.
    pub fn checked(&self) -> bool {
        self.controller.checked()
    }

    /// Set the checkedness. Inert for kinds that are not checkable.
    pub fn set_checked(&self, checked: bool) {
        self.controller.set_checked(checked, Provenance::Property);
    }

    // =========================================================================
    // Reflected descriptor fields
    // =========================================================================

    /// The `name`.
    pub fn name(&self) -> Option<String> {
        self.controller.descriptor().name
    }

    /// Set the `name`.
    pub fn set_name(&self, name: &str) {
        self.reflect("name", Some(name));
    }

    /// Whether the descriptor disables the control.
    pub fn disabled(&self) -> bool {
        self.controller.descriptor().disabled
    }

    /// Set or clear the `disabled` attribute.
    pub fn set_disabled(&self, disabled: bool) {
        self.reflect("disabled", disabled.then_some(""));
    }

    /// Whether a value is required.
    pub fn required(&self) -> bool {
        self.controller.descriptor().required
    }

    /// Set or clear the `required` attribute.
    pub fn set_required(&self, required: bool) {
        self.reflect("required", required.then_some(""));
    }

    /// Whether the control is read-only.
    pub fn read_only(&self) -> bool {
        self.controller.descriptor().readonly
    }

    /// Set or clear the `readonly` attribute.
    pub fn set_read_only(&self, readonly: bool) {
        self.reflect("readonly", readonly.then_some(""));
    }

    /// The placeholder text.
    pub fn placeholder(&self) -> Option<String> {
        self.controller.descriptor().placeholder().map(str::to_string)
    }

    /// Set or remove the `placeholder` attribute.
    pub fn set_placeholder(&self, placeholder: Option<&str>) {
        self.reflect("placeholder", placeholder);
    }

    /// The lower bound, as written.
    pub fn min(&self) -> Option<String> {
        self.controller.descriptor().min().map(str::to_string)
    }

    /// Set or remove the `min` attribute.
    pub fn set_min(&self, min: Option<&str>) {
        self.reflect("min", min);
    }

    /// The upper bound, as written.
    pub fn max(&self) -> Option<String> {
        self.controller.descriptor().max().map(str::to_string)
    }

    /// Set or remove the `max` attribute.
    pub fn set_max(&self, max: Option<&str>) {
        self.reflect("max", max);
    }

    /// The step, as written.
    pub fn step(&self) -> Option<String> {
        self.controller.descriptor().step().map(str::to_string)
    }

    /// Set or remove the `step` attribute.
    pub fn set_step(&self, step: Option<&str>) {
        self.reflect("step", step);
    }

    /// The role in effect (the `role` attribute, else the mapped role).
    pub fn role(&self) -> Option<String> {
        self.controller.effective_role()
    }

    /// Override the role; `None` restores the mapped role.
    pub fn set_role(&self, role: Option<&str>) {
        self.reflect("role", role);
    }

    // =========================================================================
    // Unreflected descriptor fields
    // =========================================================================

    /// The selected files of a `file` control.
    pub fn files(&self) -> Option<Vec<FileData>> {
        self.controller.descriptor().files().map(<[FileData]>::to_vec)
    }

    /// Select files. Inert for kinds other than `file`.
    pub fn set_files(&self, files: Vec<FileData>) {
        if self.controller.kind() != Some(ControlKind::File) {
            return;
        }
        let value = FormValue::Files(files.clone());
        self.controller.patch_descriptor(|d| d.set_files(Some(files)));
        self.controller.set_value(Some(value), Provenance::Property);
    }

    /// Accepted file types of a `file` control.
    pub fn accept(&self) -> Option<String> {
        self.controller.descriptor().accept().map(str::to_string)
    }

    /// Set the accepted file types.
    pub fn set_accept(&self, accept: Option<&str>) {
        self.controller
            .patch_descriptor(|d| d.set_accept(accept.map(str::to_string)));
    }

    /// Whether several files or options may be selected.
    pub fn multiple(&self) -> bool {
        self.controller.descriptor().multiple()
    }

    /// Allow or forbid multiple selection.
    pub fn set_multiple(&self, multiple: bool) {
        self.controller.patch_descriptor(|d| d.set_multiple(multiple));
    }

    /// The pattern a text value must match.
    pub fn pattern(&self) -> Option<String> {
        self.controller.descriptor().pattern().map(str::to_string)
    }

    /// Set or clear the pattern.
    pub fn set_pattern(&self, pattern: Option<&str>) {
        self.controller
            .patch_descriptor(|d| d.set_pattern(pattern.map(str::to_string)));
    }

    /// Minimum length in UTF-16 code units.
    pub fn min_length(&self) -> Option<usize> {
        self.controller.descriptor().min_length()
    }

    /// Set or clear the minimum length.
    pub fn set_min_length(&self, min_length: Option<usize>) {
        self.controller.patch_descriptor(|d| d.set_min_length(min_length));
    }

    /// Maximum length in UTF-16 code units.
    pub fn max_length(&self) -> Option<usize> {
        self.controller.descriptor().max_length()
    }

    /// Set or clear the maximum length.
    pub fn set_max_length(&self, max_length: Option<usize>) {
        self.controller.patch_descriptor(|d| d.set_max_length(max_length));
    }

    // =========================================================================
    // Validity and form
    // =========================================================================

    /// Check validity, firing `invalid` on failure.
    pub fn check_validity(&self) -> bool {
        self.controller.check_validity()
    }

    /// Check validity and report the message on failure.
    pub fn report_validity(&self) -> bool {
        self.controller.report_validity()
    }

    /// Set a custom error; an empty message clears it.
    pub fn set_custom_validity(&self, message: &str) {
        self.controller.set_custom_validity(message);
    }

    /// The current validity flags.
    pub fn validity(&self) -> ValidityFlags {
        self.controller.validity()
    }

    /// The message for the current validity.
    pub fn validation_message(&self) -> String {
        self.controller.validation_message()
    }

    /// Whether the control takes part in constraint validation.
    pub fn will_validate(&self) -> bool {
        self.controller.will_validate()
    }

    /// The form owner.
    pub fn form(&self) -> Option<NodeId> {
        self.controller.form()
    }

    /// A read-only copy of the internals, for debugging.
    pub fn peek_internals(&self) -> InternalsSnapshot {
        self.controller.peek_internals()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Emitted after the value changes.
    pub fn value_changed(&self) -> &Signal<Option<FormValue>> {
        self.controller.value_changed()
    }

    /// Emitted after the checkedness changes.
    pub fn checked_changed(&self) -> &Signal<bool> {
        self.controller.checked_changed()
    }

    /// Emitted after each validity evaluation.
    pub fn validity_changed(&self) -> &Signal<ValidityReport> {
        self.controller.validity_changed()
    }

    // =========================================================================
    // Button pathway
    // =========================================================================

    /// The effective button type, or `None` for kinds that are not buttons.
    pub fn button_type(&self) -> Option<ButtonType> {
        let descriptor = self.controller.descriptor();
        if !descriptor.kind().is_some_and(ControlKind::is_button) {
            return None;
        }
        Some(descriptor.button_type().unwrap_or(if self.form().is_some() {
            ButtonType::Submit
        } else {
            ButtonType::Button
        }))
    }

    fn on_click(self: &Arc<Self>, event: &Event) {
        let Some(button_type) = self.button_type() else {
            return;
        };
        if button_type == ButtonType::Button || self.controller.is_disabled() {
            return;
        }
        let Some(document) = self.document.upgrade() else {
            return;
        };
        let weak = Arc::downgrade(self);
        let event = event.clone();
        document.queue_microtask(move || {
            let Some(element) = weak.upgrade() else {
                return;
            };
            if event.default_prevented() {
                tracing::debug!(target: targets::CONTROLLER, host = ?element.host, "button activation canceled");
                return;
            }
            element.activate(button_type);
        });
    }

    fn activate(&self, button_type: ButtonType) {
        let (Some(document), Some(form)) = (self.document.upgrade(), self.form()) else {
            return;
        };
        match button_type {
            ButtonType::Submit => {
                tracing::debug!(target: targets::CONTROLLER, host = ?self.host, ?form, "button requests submit");
                document.request_submit(form, Some(self.host));
            }
            ButtonType::Reset => {
                tracing::debug!(target: targets::CONTROLLER, host = ?self.host, ?form, "button resets form");
                document.reset_form(form);
            }
            ButtonType::Button => {}
        }
    }

    /// Whether this element is the one that submits `form` on Enter.
    fn is_implicit_submitter(&self, document: &Document, form: NodeId) -> bool {
        if self.button_type() != Some(ButtonType::Submit) || self.controller.is_disabled() {
            return false;
        }
        for candidate in document.form_elements(form) {
            let is_native_submit = document.with_tree(|tree| match tree.tag_name(candidate) {
                Some("button") => !matches!(
                    tree.attribute(candidate, "type").map(str::to_ascii_lowercase).as_deref(),
                    Some("reset" | "button")
                ),
                Some("input") => matches!(tree.input_type(candidate), Some("submit" | "image")),
                _ => false,
            });
            if is_native_submit {
                return false;
            }
            let custom = document.custom_element(candidate);
            if let Some(other) = custom.as_deref().and_then(element_cast::<FormControlElement>)
                && other.button_type() == Some(ButtonType::Submit)
            {
                return other.host == self.host;
            }
        }
        false
    }

    fn on_form_keydown(self: &Arc<Self>, event: &Event) {
        if event.key() != Some("Enter") {
            return;
        }
        let Some(document) = self.document.upgrade() else {
            return;
        };
        let Some(form) = self.form() else {
            return;
        };
        let target = event.target();
        let multiline_or_button = document.with_tree(|tree| match tree.tag_name(target) {
            Some("textarea" | "button" | "select") => true,
            Some("input") => matches!(
                tree.input_type(target),
                Some("submit" | "reset" | "button" | "image" | "checkbox" | "radio" | "file")
            ),
            _ => false,
        });
        if multiline_or_button || !self.is_implicit_submitter(&document, form) {
            return;
        }

        let weak = Arc::downgrade(self);
        let event = event.clone();
        document.queue_microtask(move || {
            let Some(element) = weak.upgrade() else {
                return;
            };
            if event.default_prevented() {
                tracing::debug!(target: targets::CONTROLLER, host = ?element.host, "implicit submission canceled");
                return;
            }
            element.activate(ButtonType::Submit);
        });
    }

    fn install_form_listener(self: &Arc<Self>) {
        self.remove_form_listener();
        let (Some(document), Some(form)) = (self.document.upgrade(), self.form()) else {
            return;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        let id = document.add_event_listener(form, EventType::KeyDown, move |event| {
            if let Some(element) = weak.upgrade() {
                element.on_form_keydown(event);
            }
        });
        *self.form_listener.lock() = Some(id);
    }

    fn remove_form_listener(&self) {
        let previous = self.form_listener.lock().take();
        if let (Some(id), Some(document)) = (previous, self.document.upgrade()) {
            document.remove_event_listener(id);
        }
    }
}

impl CustomElement for FormControlElement {
    fn observed_attributes(&self) -> &[&'static str] {
        OBSERVED_ATTRIBUTES
    }

    fn is_form_associated(&self) -> bool {
        true
    }

    fn connected_callback(&self) {
        tracing::debug!(target: targets::CONTROLLER, host = ?self.host, "connected");
        self.controller.connected();
        if let Some(this) = self.me.upgrade() {
            this.install_form_listener();
        }
    }

    fn disconnected_callback(&self) {
        tracing::debug!(target: targets::CONTROLLER, host = ?self.host, "disconnected");
        self.remove_form_listener();
        self.controller.disconnected();
    }

    fn attribute_changed_callback(&self, name: &str, _old: Option<&str>, new: Option<&str>) {
        let owned = new.map(str::to_string);
        match name {
            "value" => self
                .controller
                .set_value(new.map(FormValue::from), Provenance::Attribute),
            "checked" => self.controller.set_checked(new.is_some(), Provenance::Attribute),
            "name" => self.controller.patch_descriptor(|d| d.name = owned),
            "disabled" => self.controller.patch_descriptor(|d| d.disabled = new.is_some()),
            "required" => self.controller.patch_descriptor(|d| d.required = new.is_some()),
            "readonly" => self.controller.patch_descriptor(|d| d.readonly = new.is_some()),
            "placeholder" => self.controller.patch_descriptor(|d| d.set_placeholder(owned)),
            "min" => self.controller.patch_descriptor(|d| d.set_min(owned)),
            "max" => self.controller.patch_descriptor(|d| d.set_max(owned)),
            "step" => self.controller.patch_descriptor(|d| d.set_step(owned)),
            "role" => self.controller.set_role_override(new),
            _ => {}
        }
    }

    fn form_reset_callback(&self) {
        self.controller.form_reset_callback();
    }

    fn form_disabled_callback(&self, disabled: bool) {
        self.controller.form_disabled_callback(disabled);
    }
}

impl Drop for FormControlElement {
    fn drop(&mut self) {
        let Some(document) = self.document.upgrade() else {
            return;
        };
        for id in self.host_listeners.lock().drain(..) {
            document.remove_event_listener(id);
        }
        if let Some(id) = self.form_listener.lock().take() {
            document.remove_event_listener(id);
        }
    }
}
