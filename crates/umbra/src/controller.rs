//! The form participation state machine.
//!
//! A [`FormParticipationController`] owns the canonical value and
//! checkedness of one form-associated host and keeps everything else in
//! step with them:
//!
//! - the host's [`ElementInternals`] (form value, validity, ARIA),
//! - the native control bound inside the shadow tree (a view of the
//!   canonical state, never its source except while syncing user input),
//! - the radio group the host belongs to.
//!
//! # Provenance
//!
//! Every write is tagged with a [`Provenance`]. A change that came from the
//! bound control (`Input`) is never mirrored back into that control, so a
//! user edit does not bounce. The canonical state and the form value are
//! always updated before validity is recomputed.
//!
//! # Signals
//!
//! - `value_changed(Option<FormValue>)`
//! - `checked_changed(bool)`
//! - `validity_changed(ValidityReport)`: after every recomputation

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use umbra_core::logging::targets;
use umbra_core::{
    element_cast, Document, EventType, FormValue, InternalsSnapshot, NodeId, Signal, ValidityFlags,
    WeakDocument,
};

use crate::aria::AriaMapping;
use crate::binding::{BindingSelector, InputBindingObserver};
use crate::config::FormsConfig;
use crate::descriptor::{ControlKind, FormControlDescriptor};
use crate::element::FormControlElement;
use crate::internals::ElementInternals;
use crate::validity::{ValidityEngine, ValidityInput, ValidityReport};

/// The value a checked control submits when it has none of its own.
const DEFAULT_ON_VALUE: &str = "on";

/// Who caused the most recent change of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Set while applying a descriptor.
    Init,
    /// A property setter.
    Property,
    /// An observed attribute.
    Attribute,
    /// The bound native control.
    Input,
    /// A form reset.
    Reset,
}

struct ControllerState {
    descriptor: FormControlDescriptor,
    value: Option<FormValue>,
    checked: bool,
    initial_value: Option<FormValue>,
    default_checked: bool,
    value_source: Provenance,
    checked_source: Provenance,
    custom_message: String,
    report: ValidityReport,
    role_override: Option<String>,
    /// Effective disabled state reported by the form machinery.
    form_disabled: bool,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            descriptor: FormControlDescriptor::default(),
            value: None,
            checked: false,
            initial_value: None,
            default_checked: false,
            value_source: Provenance::Init,
            checked_source: Provenance::Init,
            custom_message: String::new(),
            report: ValidityReport::default(),
            role_override: None,
            form_disabled: false,
        }
    }

    fn is_checkable(&self) -> bool {
        self.descriptor.kind().is_some_and(ControlKind::is_checkable)
    }

    /// The value a checkable control holds for `checked`.
    fn checked_value(&self, checked: bool) -> Option<FormValue> {
        checked.then(|| {
            self.initial_value
                .clone()
                .unwrap_or_else(|| FormValue::from(DEFAULT_ON_VALUE))
        })
    }

    /// The value handed to the form. Unchecked controls contribute nothing.
    fn form_value(&self) -> Option<FormValue> {
        if self.is_checkable() && !self.checked {
            return None;
        }
        self.value.clone()
    }

    fn aria_mapping(&self) -> AriaMapping {
        let text = self.value.as_ref().map(FormValue::display_text);
        let mut mapping = AriaMapping::for_state(&self.descriptor, text.as_deref(), self.checked);
        if self.form_disabled
            && mapping.role.is_some()
            && mapping.attribute("aria-disabled").is_none()
        {
            mapping.attributes.push(("aria-disabled", "true".to_string()));
        }
        mapping
    }
}

/// How the canonical state should be written to the bound control.
#[derive(Debug, Clone, PartialEq)]
enum Mirror {
    Value(String),
    Checked(bool),
}

/// Keeps one host's form participation in sync.
pub struct FormParticipationController {
    document: WeakDocument,
    host: NodeId,
    internals: Arc<dyn ElementInternals>,
    binding: InputBindingObserver,
    config: Arc<FormsConfig>,
    state: Mutex<ControllerState>,
    value_changed: Signal<Option<FormValue>>,
    checked_changed: Signal<bool>,
    validity_changed: Signal<ValidityReport>,
}

impl std::fmt::Debug for FormParticipationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FormParticipationController")
            .field("host", &self.host)
            .field("kind", &state.descriptor.kind())
            .field("value", &state.value)
            .field("checked", &state.checked)
            .field("binding", &self.binding)
            .finish()
    }
}

impl FormParticipationController {
    /// Create a controller for `host` writing to `internals`.
    ///
    /// The controller starts with a default (text) descriptor and no
    /// binding; call [`connected`](Self::connected) once the host is in the
    /// document.
    pub fn new(
        document: &Document,
        host: NodeId,
        internals: Arc<dyn ElementInternals>,
        config: Arc<FormsConfig>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let binding = InputBindingObserver::new(document, host);
            binding.set_selector(BindingSelector::for_kind(Some(ControlKind::Text)));

            let on_rebound = weak.clone();
            binding.rebound().connect(move |bound| {
                if let Some(controller) = on_rebound.upgrade() {
                    tracing::debug!(target: targets::CONTROLLER, host = ?controller.host, ?bound, "bound control changed");
                    controller.reinitialize();
                }
            });
            let on_input = weak.clone();
            binding.input_event().connect(move |(node, event_type)| {
                if let Some(controller) = on_input.upgrade() {
                    controller.sync_from_input(*node, *event_type);
                }
            });

            Self {
                document: document.downgrade(),
                host,
                internals,
                binding,
                config,
                state: Mutex::new(ControllerState::new()),
                value_changed: Signal::new(),
                checked_changed: Signal::new(),
                validity_changed: Signal::new(),
            }
        })
    }

    /// The host element.
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// The configuration in use.
    pub fn config(&self) -> &FormsConfig {
        &self.config
    }

    /// The binding observer.
    pub fn binding(&self) -> &InputBindingObserver {
        &self.binding
    }

    /// The bound native control, if one is resolved.
    pub fn bound_input(&self) -> Option<NodeId> {
        self.binding.bound()
    }

    // =========================================================================
    // Descriptor
    // =========================================================================

    /// The current descriptor.
    pub fn descriptor(&self) -> FormControlDescriptor {
        self.state.lock().descriptor.clone()
    }

    /// The current control kind; `None` when unrecognized.
    pub fn kind(&self) -> Option<ControlKind> {
        self.state.lock().descriptor.kind()
    }

    /// Apply a new descriptor and re-initialize.
    ///
    /// The initial value and checkedness are taken from the descriptor and
    /// the custom validity message is cleared. An unrecognized control kind
    /// leaves the internals neutral: no role, no ARIA, no constraint checks.
    pub fn set_descriptor(&self, descriptor: FormControlDescriptor) {
        let kind = descriptor.kind();
        if kind.is_none() {
            tracing::debug!(target: targets::CONTROLLER, host = ?self.host, "unrecognized control kind, resetting to neutral");
        }
        {
            let mut state = self.state.lock();
            let checked = descriptor.checked().or(descriptor.default_checked()).unwrap_or(false);
            state.default_checked = descriptor
                .default_checked()
                .or(descriptor.checked())
                .unwrap_or(false);
            state.initial_value = descriptor.value.clone();
            state.descriptor = descriptor;
            state.checked = checked;
            state.value = if state.is_checkable() {
                state.checked_value(checked)
            } else {
                state.initial_value.clone()
            };
            state.value_source = Provenance::Init;
            state.checked_source = Provenance::Init;
            state.custom_message.clear();
        }
        self.binding.set_selector(BindingSelector::for_kind(kind));
        self.reinitialize();
        self.emit_state();
    }

    /// Change descriptor fields other than the value.
    ///
    /// Canonical value and checkedness are kept; ARIA and validity are
    /// derived again.
    pub fn patch_descriptor(&self, patch: impl FnOnce(&mut FormControlDescriptor)) {
        let kind = {
            let mut state = self.state.lock();
            let mut descriptor = state.descriptor.clone();
            patch(&mut descriptor);
            if descriptor == state.descriptor {
                return;
            }
            state.descriptor = descriptor;
            state.descriptor.kind()
        };
        self.binding.set_selector(BindingSelector::for_kind(kind));
        self.apply_aria();
        self.recompute_validity();
    }

    /// Push every piece of canonical state out again: ARIA, form value, the
    /// bound control and validity.
    pub fn reinitialize(&self) {
        let (form_value, mirror) = {
            let state = self.state.lock();
            (state.form_value(), self.mirror_of(&state))
        };
        self.apply_aria();
        self.internals.set_form_value(form_value, None);
        if let Some(mirror) = mirror {
            self.write_mirror(mirror);
        }
        self.recompute_validity();
    }

    // =========================================================================
    // Value
    // =========================================================================

    /// The canonical value.
    pub fn value(&self) -> Option<FormValue> {
        self.state.lock().value.clone()
    }

    /// The value captured by the last [`set_descriptor`](Self::set_descriptor).
    pub fn initial_value(&self) -> Option<FormValue> {
        self.state.lock().initial_value.clone()
    }

    /// Who set the current value.
    pub fn value_source(&self) -> Provenance {
        self.state.lock().value_source
    }

    /// Set the canonical value.
    ///
    /// Setting the current value again does nothing. Writing to a disabled
    /// control is allowed but logged as a warning.
    pub fn set_value(&self, value: Option<FormValue>, source: Provenance) {
        let (form_value, mirror) = {
            let mut state = self.state.lock();
            if state.value == value {
                return;
            }
            state.value = value;
            state.value_source = source;
            let mirror = if source == Provenance::Input { None } else { self.mirror_of(&state) };
            (state.form_value(), mirror)
        };
        if self.config.diagnostics.warn_on_disabled_write && self.is_disabled() {
            tracing::warn!(target: targets::CONTROLLER, host = ?self.host, ?source, "value written to a disabled control");
        }

        self.internals.set_form_value(form_value, None);
        if let Some(mirror) = mirror {
            self.write_mirror(mirror);
        }
        self.apply_aria();
        self.recompute_validity();
        self.value_changed.emit(self.value());
    }

    // =========================================================================
    // Checked
    // =========================================================================

    /// The canonical checkedness.
    pub fn checked(&self) -> bool {
        self.state.lock().checked
    }

    /// The checkedness restored by a form reset.
    pub fn default_checked(&self) -> bool {
        self.state.lock().default_checked
    }

    /// Who set the current checkedness.
    pub fn checked_source(&self) -> Provenance {
        self.state.lock().checked_source
    }

    /// Set the canonical checkedness. Inert for kinds that are not
    /// checkable.
    ///
    /// Checking a radio first unchecks every other radio of its group.
    pub fn set_checked(&self, checked: bool, source: Provenance) {
        let kind = {
            let state = self.state.lock();
            if !state.is_checkable() {
                tracing::trace!(target: targets::CONTROLLER, host = ?self.host, "checked ignored for this kind");
                return;
            }
            if state.checked == checked {
                return;
            }
            state.descriptor.kind()
        };
        if checked && kind == Some(ControlKind::Radio) {
            self.uncheck_radio_group();
        }

        let (form_value, mirror) = {
            let mut state = self.state.lock();
            state.checked = checked;
            state.checked_source = source;
            state.value = state.checked_value(checked);
            state.value_source = source;
            let mirror = if source == Provenance::Input { None } else { self.mirror_of(&state) };
            (state.form_value(), mirror)
        };

        self.internals.set_form_value(form_value, None);
        if let Some(mirror) = mirror {
            self.write_mirror(mirror);
        }
        self.apply_aria();
        self.recompute_validity();
        self.checked_changed.emit(checked);
        self.value_changed.emit(self.value());
    }

    /// The radio group name: the descriptor name, else the host attribute.
    fn group_name(&self, document: &Document) -> Option<String> {
        self.state
            .lock()
            .descriptor
            .name
            .clone()
            .or_else(|| document.get_attribute(self.host, "name"))
            .filter(|name| !name.is_empty())
    }

    /// Uncheck the other members of this host's radio group.
    ///
    /// Members are found by name in the form owner (or the tree of the host
    /// when it has none); a candidate only belongs to the group when it has
    /// the same form owner and acts as a radio.
    fn uncheck_radio_group(&self) {
        let Some(document) = self.document.upgrade() else {
            return;
        };
        let Some(name) = self.group_name(&document) else {
            return;
        };
        let form = self.internals.form();
        let candidates = document.with_tree(|tree| {
            let scope = form.unwrap_or_else(|| tree.tree_root(self.host));
            tree.query_by_name(scope, &name)
        });

        for candidate in candidates {
            if candidate == self.host || document.form_owner(candidate) != form {
                continue;
            }
            let custom = document.custom_element(candidate);
            if let Some(other) = custom.as_deref().and_then(element_cast::<FormControlElement>) {
                let controller = other.controller();
                if controller.effective_role().as_deref() == Some("radio") && controller.checked() {
                    tracing::trace!(target: targets::CONTROLLER, host = ?self.host, ?candidate, "unchecking radio");
                    controller.set_checked(false, Provenance::Property);
                }
                continue;
            }
            let native_radio = document.with_tree(|tree| tree.input_type(candidate) == Some("radio"));
            if native_radio {
                if document.control_checked(candidate) == Some(true) {
                    let _ = document.set_control_checked(candidate, false);
                }
            } else if document.get_attribute(candidate, "role").as_deref() == Some("radio")
                && document.has_attribute(candidate, "checked")
            {
                let _ = document.remove_attribute(candidate, "checked");
            }
        }
    }

    // =========================================================================
    // Bound control
    // =========================================================================

    /// What to write into the bound control for `state`.
    fn mirror_of(&self, state: &ControllerState) -> Option<Mirror> {
        let kind = state.descriptor.kind()?;
        if kind.is_checkable() {
            Some(Mirror::Checked(state.checked))
        } else if kind == ControlKind::File {
            None
        } else {
            Some(Mirror::Value(
                state.value.as_ref().map(FormValue::display_text).unwrap_or_default(),
            ))
        }
    }

    fn write_mirror(&self, mirror: Mirror) {
        let (Some(document), Some(bound)) = (self.document.upgrade(), self.binding.bound()) else {
            return;
        };
        let result = match mirror {
            Mirror::Value(value) => {
                if document.control_value(bound).as_deref() == Some(value.as_str()) {
                    return;
                }
                document.set_control_value(bound, &value)
            }
            Mirror::Checked(checked) => {
                if document.control_checked(bound) == Some(checked) {
                    return;
                }
                document.set_control_checked(bound, checked)
            }
        };
        if let Err(err) = result {
            tracing::debug!(target: targets::CONTROLLER, host = ?self.host, ?bound, %err, "could not mirror into bound control");
        }
    }

    /// Take in a user edit of the bound control.
    pub fn sync_from_input(&self, node: NodeId, event_type: EventType) {
        if self.binding.bound() != Some(node) {
            return;
        }
        let Some(document) = self.document.upgrade() else {
            return;
        };
        tracing::trace!(target: targets::CONTROLLER, host = ?self.host, ?node, %event_type, "syncing from bound control");

        // A checkable control's value is its descriptor value while checked,
        // so only checkedness is read back from the bound control.
        let checkable = self.state.lock().is_checkable();
        if checkable {
            if document.with_tree(|tree| tree.is_checkable(node))
                && let Some(checked) = document.control_checked(node)
            {
                self.set_checked(checked, Provenance::Input);
            }
        } else if let Some(value) = document.control_value(node) {
            self.set_value(Some(FormValue::Text(value)), Provenance::Input);
        }
    }

    // =========================================================================
    // ARIA
    // =========================================================================

    /// Override the mapped role (the host's `role` attribute).
    pub fn set_role_override(&self, role: Option<&str>) {
        self.state.lock().role_override = role.map(str::to_string);
        self.apply_aria();
    }

    /// The role in effect: the override, else the mapped role.
    pub fn effective_role(&self) -> Option<String> {
        let state = self.state.lock();
        state
            .role_override
            .clone()
            .or_else(|| state.aria_mapping().role.map(|role| role.as_str().to_string()))
    }

    /// Show a button as pressed. Only button kinds take this.
    pub fn set_pressed(&self, pressed: bool) {
        if self.kind().is_some_and(ControlKind::is_button) {
            self.internals
                .set_aria("aria-pressed", Some(if pressed { "true" } else { "false" }));
        }
    }

    fn apply_aria(&self) {
        let (mapping, role_override) = {
            let state = self.state.lock();
            (state.aria_mapping(), state.role_override.clone())
        };
        mapping.apply(self.internals.as_ref(), role_override.as_deref());
    }

    // =========================================================================
    // Validity
    // =========================================================================

    /// Evaluate constraints again and store the result in the internals.
    pub fn recompute_validity(&self) {
        let (descriptor, value, custom_message) = {
            let state = self.state.lock();
            (state.descriptor.clone(), state.value.clone(), state.custom_message.clone())
        };
        let bound = self.binding.bound();
        let native = match (self.document.upgrade(), bound) {
            (Some(document), Some(node)) => document.with_tree(|tree| tree.native_validity(node)),
            _ => None,
        };

        let report = ValidityEngine::new(&self.config.messages).evaluate(&ValidityInput {
            descriptor: &descriptor,
            value: value.as_ref(),
            custom_message: &custom_message,
            native: native.as_ref(),
        });
        self.internals.set_validity(report.flags, &report.message, bound);
        self.state.lock().report = report.clone();
        self.validity_changed.emit(report);
    }

    /// The last evaluation.
    pub fn report(&self) -> ValidityReport {
        self.state.lock().report.clone()
    }

    /// Set a custom validity message; an empty message clears it.
    pub fn set_custom_validity(&self, message: &str) {
        self.state.lock().custom_message = message.to_string();
        self.recompute_validity();
    }

    /// The validity flags held by the internals.
    pub fn validity(&self) -> ValidityFlags {
        self.internals.validity()
    }

    /// The message a candidate shows; empty when barred or valid.
    pub fn validation_message(&self) -> String {
        self.internals.validation_message()
    }

    /// Whether the host takes part in constraint validation.
    pub fn will_validate(&self) -> bool {
        self.internals.will_validate()
    }

    /// Check validity, firing `invalid` on failure.
    pub fn check_validity(&self) -> bool {
        self.internals.check_validity()
    }

    /// Check validity and report the message to the user on failure.
    pub fn report_validity(&self) -> bool {
        self.internals.report_validity()
    }

    // =========================================================================
    // Form lifecycle
    // =========================================================================

    /// The form owner of the host.
    pub fn form(&self) -> Option<NodeId> {
        self.internals.form()
    }

    /// Whether the host is disabled by its descriptor, its own attribute or
    /// a fieldset.
    pub fn is_disabled(&self) -> bool {
        let (own, form_disabled) = {
            let state = self.state.lock();
            (state.descriptor.disabled, state.form_disabled)
        };
        own || form_disabled
            || self
                .document
                .upgrade()
                .is_some_and(|document| document.is_disabled(self.host))
    }

    /// Restore the reset defaults: checkedness for checkable kinds, the
    /// initial value for the rest. The custom validity message survives.
    pub fn form_reset_callback(&self) {
        tracing::debug!(target: targets::CONTROLLER, host = ?self.host, "form reset");
        {
            let mut state = self.state.lock();
            if state.is_checkable() {
                let checked = state.default_checked;
                state.checked = checked;
                state.checked_source = Provenance::Reset;
                state.value = state.checked_value(checked);
            } else {
                state.value = state.initial_value.clone();
            }
            state.value_source = Provenance::Reset;
        }
        self.reinitialize();
        self.emit_state();
    }

    /// Mirror the effective disabled state into ARIA and validity.
    pub fn form_disabled_callback(&self, disabled: bool) {
        tracing::debug!(target: targets::CONTROLLER, host = ?self.host, disabled, "form disabled changed");
        self.state.lock().form_disabled = disabled;
        self.apply_aria();
        self.recompute_validity();
    }

    /// The host was connected: start watching the shadow tree.
    pub fn connected(&self) {
        self.binding.connect();
        self.reinitialize();
    }

    /// The host was disconnected: stop watching.
    pub fn disconnected(&self) {
        self.binding.disconnect();
    }

    /// A copy of the internals state, for debugging.
    pub fn peek_internals(&self) -> InternalsSnapshot {
        self.internals.snapshot()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Emitted after the canonical value changes.
    pub fn value_changed(&self) -> &Signal<Option<FormValue>> {
        &self.value_changed
    }

    /// Emitted after the canonical checkedness changes.
    pub fn checked_changed(&self) -> &Signal<bool> {
        &self.checked_changed
    }

    /// Emitted after every validity recomputation.
    pub fn validity_changed(&self) -> &Signal<ValidityReport> {
        &self.validity_changed
    }

    fn emit_state(&self) {
        let (value, checked) = {
            let state = self.state.lock();
            (state.value.clone(), state.checked)
        };
        self.value_changed.emit(value);
        self.checked_changed.emit(checked);
    }
}
