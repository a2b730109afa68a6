//! ARIA semantics derived from a descriptor.
//!
//! [`AriaMapping::for_state`] maps a control kind (plus the state it is in)
//! to the role and `aria-*` attributes the host should expose through its
//! internals:
//!
//! | control | role | extra |
//! |---|---|---|
//! | text family | textbox | `aria-placeholder` |
//! | textarea | textbox | `aria-multiline` |
//! | number, date family | spinbutton | `aria-valuemin`, `aria-valuemax`, `aria-valuenow` |
//! | range | slider | same as spinbutton |
//! | select | combobox | `aria-expanded`, `aria-haspopup`, `aria-autocomplete`, `aria-multiselectable` |
//! | checkbox, radio | checkbox, radio | `aria-checked` |
//! | button, image | button | `aria-pressed` |
//! | file | button | `aria-haspopup`, `aria-multiselectable` |
//! | hidden | none | |
//!
//! Every known kind also gets `aria-disabled`, `aria-required` and
//! `aria-readonly` when those are set. An unrecognized kind maps to no role
//! and no attributes.

use std::fmt;

use umbra_core::logging::targets;

use crate::descriptor::{ControlKind, FormControlDescriptor};
use crate::internals::ElementInternals;

/// The ARIA roles a form control can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AriaRole {
    Textbox,
    Spinbutton,
    Slider,
    Combobox,
    Checkbox,
    Radio,
    Button,
    /// `role="none"`: no semantics.
    Presentation,
}

impl AriaRole {
    /// The `role` attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            AriaRole::Textbox => "textbox",
            AriaRole::Spinbutton => "spinbutton",
            AriaRole::Slider => "slider",
            AriaRole::Combobox => "combobox",
            AriaRole::Checkbox => "checkbox",
            AriaRole::Radio => "radio",
            AriaRole::Button => "button",
            AriaRole::Presentation => "none",
        }
    }

    /// The role a control kind maps to.
    pub fn for_kind(kind: ControlKind) -> Self {
        match kind {
            ControlKind::Text
            | ControlKind::Password
            | ControlKind::Email
            | ControlKind::Tel
            | ControlKind::Url
            | ControlKind::Search
            | ControlKind::Textarea
            | ControlKind::Color => AriaRole::Textbox,
            ControlKind::Range => AriaRole::Slider,
            ControlKind::Number
            | ControlKind::Time
            | ControlKind::Date
            | ControlKind::DatetimeLocal
            | ControlKind::Month
            | ControlKind::Week => AriaRole::Spinbutton,
            ControlKind::Select => AriaRole::Combobox,
            ControlKind::Checkbox => AriaRole::Checkbox,
            ControlKind::Radio => AriaRole::Radio,
            ControlKind::Button | ControlKind::Image | ControlKind::File => AriaRole::Button,
            ControlKind::Hidden => AriaRole::Presentation,
        }
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "accessibility")]
impl From<AriaRole> for accesskit::Role {
    fn from(role: AriaRole) -> Self {
        match role {
            AriaRole::Textbox => accesskit::Role::TextInput,
            AriaRole::Spinbutton => accesskit::Role::SpinButton,
            AriaRole::Slider => accesskit::Role::Slider,
            AriaRole::Combobox => accesskit::Role::ComboBox,
            AriaRole::Checkbox => accesskit::Role::CheckBox,
            AriaRole::Radio => accesskit::Role::RadioButton,
            AriaRole::Button => accesskit::Role::Button,
            AriaRole::Presentation => accesskit::Role::GenericContainer,
        }
    }
}

/// Role plus `aria-*` attributes, in the order they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AriaMapping {
    pub role: Option<AriaRole>,
    pub attributes: Vec<(&'static str, String)>,
}

impl AriaMapping {
    /// Map `descriptor` in its current state.
    ///
    /// `value` is the canonical text value (for `aria-valuenow`) and `checked`
    /// the canonical checkedness.
    pub fn for_state(descriptor: &FormControlDescriptor, value: Option<&str>, checked: bool) -> Self {
        let Some(kind) = descriptor.kind() else {
            return Self::default();
        };
        let mut mapping = Self {
            role: Some(AriaRole::for_kind(kind)),
            attributes: Vec::new(),
        };

        match kind {
            ControlKind::Textarea => {
                mapping.push("aria-multiline", "true");
                mapping.push_opt("aria-placeholder", descriptor.placeholder());
            }
            kind if kind.is_text_family() => {
                mapping.push_opt("aria-placeholder", descriptor.placeholder());
            }
            kind if kind.is_numeric_family() => {
                mapping.push_opt("aria-valuemin", descriptor.min());
                mapping.push_opt("aria-valuemax", descriptor.max());
                mapping.push_opt("aria-valuenow", value.filter(|v| !v.is_empty()));
            }
            ControlKind::Select => {
                mapping.push("aria-expanded", "false");
                mapping.push("aria-haspopup", "listbox");
                mapping.push("aria-autocomplete", "list");
                mapping.push("aria-multiselectable", bool_str(descriptor.multiple()));
            }
            ControlKind::Checkbox | ControlKind::Radio => {
                mapping.push("aria-checked", bool_str(checked));
            }
            ControlKind::Button | ControlKind::Image => {
                mapping.push("aria-pressed", "false");
            }
            ControlKind::File => {
                mapping.push("aria-haspopup", "dialog");
                mapping.push("aria-multiselectable", bool_str(descriptor.multiple()));
            }
            _ => {}
        }

        if kind != ControlKind::Hidden {
            if descriptor.disabled {
                mapping.push("aria-disabled", "true");
            }
            if descriptor.required {
                mapping.push("aria-required", "true");
            }
            if descriptor.readonly {
                mapping.push("aria-readonly", "true");
            }
        }
        mapping
    }

    fn push(&mut self, name: &'static str, value: &str) {
        self.attributes.push((name, value.to_string()));
    }

    fn push_opt(&mut self, name: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    /// The value of one mapped attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace the ARIA state of `internals` with this mapping.
    ///
    /// `role_override` (the host's own `role` attribute) wins over the mapped
    /// role.
    pub fn apply(&self, internals: &dyn ElementInternals, role_override: Option<&str>) {
        let role = role_override.or(self.role.map(AriaRole::as_str));
        tracing::trace!(target: targets::ARIA, ?role, attributes = self.attributes.len(), "applying aria mapping");
        internals.clear_aria();
        internals.set_role(role);
        for (name, value) in &self.attributes {
            internals.set_aria(name, Some(value));
        }
    }

    /// The accessibility tree role for this mapping.
    ///
    /// Multi-line text boxes become `MultilineTextInput`.
    #[cfg(feature = "accessibility")]
    pub fn accesskit_role(&self) -> accesskit::Role {
        match self.role {
            Some(AriaRole::Textbox) if self.attribute("aria-multiline") == Some("true") => {
                accesskit::Role::MultilineTextInput
            }
            Some(role) => role.into(),
            None => accesskit::Role::Unknown,
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_family() {
        let descriptor = FormControlDescriptor::new(ControlKind::Email).with_placeholder("you@example.com");
        let mapping = AriaMapping::for_state(&descriptor, None, false);
        assert_eq!(mapping.role, Some(AriaRole::Textbox));
        assert_eq!(mapping.attribute("aria-placeholder"), Some("you@example.com"));
        assert_eq!(mapping.attribute("aria-multiline"), None);
    }

    #[test]
    fn test_textarea_is_multiline() {
        let mapping = AriaMapping::for_state(&FormControlDescriptor::new(ControlKind::Textarea), None, false);
        assert_eq!(mapping.role, Some(AriaRole::Textbox));
        assert_eq!(mapping.attribute("aria-multiline"), Some("true"));
    }

    #[test]
    fn test_numeric_family() {
        let range = FormControlDescriptor::new(ControlKind::Range)
            .with_min("0")
            .with_max("100");
        let mapping = AriaMapping::for_state(&range, Some("40"), false);
        assert_eq!(mapping.role, Some(AriaRole::Slider));
        assert_eq!(mapping.attribute("aria-valuemin"), Some("0"));
        assert_eq!(mapping.attribute("aria-valuemax"), Some("100"));
        assert_eq!(mapping.attribute("aria-valuenow"), Some("40"));

        let date = FormControlDescriptor::new(ControlKind::Date);
        let mapping = AriaMapping::for_state(&date, Some(""), false);
        assert_eq!(mapping.role, Some(AriaRole::Spinbutton));
        assert_eq!(mapping.attribute("aria-valuenow"), None);
    }

    #[test]
    fn test_select_and_file() {
        let select = FormControlDescriptor::new(ControlKind::Select).with_multiple(true);
        let mapping = AriaMapping::for_state(&select, None, false);
        assert_eq!(mapping.role, Some(AriaRole::Combobox));
        assert_eq!(mapping.attribute("aria-expanded"), Some("false"));
        assert_eq!(mapping.attribute("aria-haspopup"), Some("listbox"));
        assert_eq!(mapping.attribute("aria-autocomplete"), Some("list"));
        assert_eq!(mapping.attribute("aria-multiselectable"), Some("true"));

        let file = FormControlDescriptor::new(ControlKind::File);
        let mapping = AriaMapping::for_state(&file, None, false);
        assert_eq!(mapping.role, Some(AriaRole::Button));
        assert_eq!(mapping.attribute("aria-haspopup"), Some("dialog"));
        assert_eq!(mapping.attribute("aria-multiselectable"), Some("false"));
    }

    #[test]
    fn test_checkable_and_button() {
        let radio = FormControlDescriptor::new(ControlKind::Radio);
        let mapping = AriaMapping::for_state(&radio, None, true);
        assert_eq!(mapping.role, Some(AriaRole::Radio));
        assert_eq!(mapping.attribute("aria-checked"), Some("true"));

        let image = FormControlDescriptor::new(ControlKind::Image);
        let mapping = AriaMapping::for_state(&image, None, false);
        assert_eq!(mapping.role, Some(AriaRole::Button));
        assert_eq!(mapping.attribute("aria-pressed"), Some("false"));
    }

    #[test]
    fn test_common_states() {
        let descriptor = FormControlDescriptor::new(ControlKind::Text)
            .with_disabled(true)
            .with_required(true)
            .with_readonly(true);
        let mapping = AriaMapping::for_state(&descriptor, None, false);
        assert_eq!(mapping.attribute("aria-disabled"), Some("true"));
        assert_eq!(mapping.attribute("aria-required"), Some("true"));
        assert_eq!(mapping.attribute("aria-readonly"), Some("true"));
    }

    #[test]
    fn test_hidden_and_unknown() {
        let hidden = FormControlDescriptor::new(ControlKind::Hidden).with_required(true);
        let mapping = AriaMapping::for_state(&hidden, None, false);
        assert_eq!(mapping.role, Some(AriaRole::Presentation));
        assert!(mapping.attributes.is_empty());
        assert_eq!(AriaRole::Presentation.as_str(), "none");

        let unknown = AriaMapping::for_state(&FormControlDescriptor::unknown(), None, false);
        assert_eq!(unknown, AriaMapping::default());
    }

    #[cfg(feature = "accessibility")]
    #[test]
    fn test_accesskit_roles() {
        assert_eq!(accesskit::Role::from(AriaRole::Spinbutton), accesskit::Role::SpinButton);
        let textarea = AriaMapping::for_state(&FormControlDescriptor::new(ControlKind::Textarea), None, false);
        assert_eq!(textarea.accesskit_role(), accesskit::Role::MultilineTextInput);
        assert_eq!(AriaMapping::default().accesskit_role(), accesskit::Role::Unknown);
    }
}
