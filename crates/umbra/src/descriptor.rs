//! Form control descriptors.
//!
//! A [`FormControlDescriptor`] tells a form-associated element which native
//! control it stands in for and with which attributes. Descriptors are plain
//! values: an element replaces its descriptor wholesale and never mutates the
//! one it was given.
//!
//! The kind-specific fields live in the [`Control`] sum type. A field that
//! does not belong to the active kind simply does not exist for it; builder
//! methods that target such a field are inert.
//!
//! # JSON shape
//!
//! Descriptors deserialize from the object shape UI layers pass around:
//!
//! ```
//! use umbra::descriptor::{ControlKind, FormControlDescriptor};
//!
//! let descriptor = FormControlDescriptor::from_json(
//!     r#"{ "control": "number", "name": "qty", "min": 1, "max": "10", "required": true }"#,
//! ).unwrap();
//! assert_eq!(descriptor.kind(), Some(ControlKind::Number));
//! assert_eq!(descriptor.min(), Some("1"));
//! assert_eq!(descriptor.max(), Some("10"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use umbra_core::{FileData, FormValue};

use crate::error::{DescriptorError, Result};

/// The kind of native control a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Text,
    Password,
    Email,
    Tel,
    Url,
    Search,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Button,
    Image,
    Hidden,
    File,
    Color,
    Number,
    Range,
    Time,
    Date,
    DatetimeLocal,
    Month,
    Week,
}

impl ControlKind {
    /// Every kind, in declaration order.
    pub const ALL: [ControlKind; 22] = [
        ControlKind::Text,
        ControlKind::Password,
        ControlKind::Email,
        ControlKind::Tel,
        ControlKind::Url,
        ControlKind::Search,
        ControlKind::Textarea,
        ControlKind::Select,
        ControlKind::Checkbox,
        ControlKind::Radio,
        ControlKind::Button,
        ControlKind::Image,
        ControlKind::Hidden,
        ControlKind::File,
        ControlKind::Color,
        ControlKind::Number,
        ControlKind::Range,
        ControlKind::Time,
        ControlKind::Date,
        ControlKind::DatetimeLocal,
        ControlKind::Month,
        ControlKind::Week,
    ];

    /// The discriminant string (`"datetime-local"`, `"textarea"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::Password => "password",
            ControlKind::Email => "email",
            ControlKind::Tel => "tel",
            ControlKind::Url => "url",
            ControlKind::Search => "search",
            ControlKind::Textarea => "textarea",
            ControlKind::Select => "select",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Radio => "radio",
            ControlKind::Button => "button",
            ControlKind::Image => "image",
            ControlKind::Hidden => "hidden",
            ControlKind::File => "file",
            ControlKind::Color => "color",
            ControlKind::Number => "number",
            ControlKind::Range => "range",
            ControlKind::Time => "time",
            ControlKind::Date => "date",
            ControlKind::DatetimeLocal => "datetime-local",
            ControlKind::Month => "month",
            ControlKind::Week => "week",
        }
    }

    /// Single-line text kinds: text, password, email, tel, url, search.
    pub fn is_text_family(self) -> bool {
        matches!(
            self,
            ControlKind::Text
                | ControlKind::Password
                | ControlKind::Email
                | ControlKind::Tel
                | ControlKind::Url
                | ControlKind::Search
        )
    }

    /// Kinds checked for pattern and length constraints.
    pub fn is_text_like(self) -> bool {
        self.is_text_family() || self == ControlKind::Textarea
    }

    /// Kinds with `min` / `max` / `step`.
    pub fn is_numeric_family(self) -> bool {
        matches!(self, ControlKind::Number | ControlKind::Range) || self.is_date_family()
    }

    /// Date and time kinds.
    pub fn is_date_family(self) -> bool {
        matches!(
            self,
            ControlKind::Time
                | ControlKind::Date
                | ControlKind::DatetimeLocal
                | ControlKind::Month
                | ControlKind::Week
        )
    }

    /// Checkbox and radio.
    pub fn is_checkable(self) -> bool {
        matches!(self, ControlKind::Checkbox | ControlKind::Radio)
    }

    /// Button and image.
    pub fn is_button(self) -> bool {
        matches!(self, ControlKind::Button | ControlKind::Image)
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlKind {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self> {
        ControlKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DescriptorError::unknown_control(s))
    }
}

/// What activating a button-kind control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonType {
    /// Resets the form owner.
    Reset,
    /// Does nothing by default.
    Button,
    /// Submits the form owner. Invalid type names fall back to this.
    #[serde(other)]
    Submit,
}

impl ButtonType {
    /// The attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            ButtonType::Submit => "submit",
            ButtonType::Reset => "reset",
            ButtonType::Button => "button",
        }
    }
}

/// Accepts `"10"`, `10` and `2.5` alike for attribute-valued fields.
mod scalar {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    pub fn option<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
            Scalar::Text(text) => text,
            Scalar::Integer(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
        }))
    }
}

/// Fields of the text family, textarea and number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// `min` / `max` / `step` of range, number and the date family.
///
/// Bounds are kept as the attribute strings; their meaning depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeFields {
    #[serde(deserialize_with = "scalar::option", skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(deserialize_with = "scalar::option", skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(deserialize_with = "scalar::option", skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

/// Number carries both text and range fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFields {
    #[serde(flatten)]
    pub text: TextFields,
    #[serde(flatten)]
    pub range: RangeFields,
}

/// Checkbox and radio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_checked: Option<bool>,
}

/// Button and image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonFields {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub button_type: Option<ButtonType>,
}

/// File pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileData>>,
}

/// Select boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectFields {
    pub multiple: bool,
}

/// The kind discriminant together with its kind-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "kebab-case")]
pub enum Control {
    Text(TextFields),
    Password(TextFields),
    Email(TextFields),
    Tel(TextFields),
    Url(TextFields),
    Search(TextFields),
    Textarea(TextFields),
    Select(SelectFields),
    Checkbox(CheckFields),
    Radio(CheckFields),
    Button(ButtonFields),
    Image(ButtonFields),
    Hidden,
    File(FileFields),
    Color,
    Number(NumberFields),
    Range(RangeFields),
    Time(RangeFields),
    Date(RangeFields),
    DatetimeLocal(RangeFields),
    Month(RangeFields),
    Week(RangeFields),
    /// An unrecognized discriminant. Elements treat it as a neutral control.
    #[serde(other)]
    Unknown,
}

impl Control {
    /// A control of `kind` with every optional field unset.
    pub fn new(kind: ControlKind) -> Self {
        match kind {
            ControlKind::Text => Control::Text(TextFields::default()),
            ControlKind::Password => Control::Password(TextFields::default()),
            ControlKind::Email => Control::Email(TextFields::default()),
            ControlKind::Tel => Control::Tel(TextFields::default()),
            ControlKind::Url => Control::Url(TextFields::default()),
            ControlKind::Search => Control::Search(TextFields::default()),
            ControlKind::Textarea => Control::Textarea(TextFields::default()),
            ControlKind::Select => Control::Select(SelectFields::default()),
            ControlKind::Checkbox => Control::Checkbox(CheckFields::default()),
            ControlKind::Radio => Control::Radio(CheckFields::default()),
            ControlKind::Button => Control::Button(ButtonFields::default()),
            ControlKind::Image => Control::Image(ButtonFields::default()),
            ControlKind::Hidden => Control::Hidden,
            ControlKind::File => Control::File(FileFields::default()),
            ControlKind::Color => Control::Color,
            ControlKind::Number => Control::Number(NumberFields::default()),
            ControlKind::Range => Control::Range(RangeFields::default()),
            ControlKind::Time => Control::Time(RangeFields::default()),
            ControlKind::Date => Control::Date(RangeFields::default()),
            ControlKind::DatetimeLocal => Control::DatetimeLocal(RangeFields::default()),
            ControlKind::Month => Control::Month(RangeFields::default()),
            ControlKind::Week => Control::Week(RangeFields::default()),
        }
    }

    /// The kind, or `None` for [`Control::Unknown`].
    pub fn kind(&self) -> Option<ControlKind> {
        Some(match self {
            Control::Text(_) => ControlKind::Text,
            Control::Password(_) => ControlKind::Password,
            Control::Email(_) => ControlKind::Email,
            Control::Tel(_) => ControlKind::Tel,
            Control::Url(_) => ControlKind::Url,
            Control::Search(_) => ControlKind::Search,
            Control::Textarea(_) => ControlKind::Textarea,
            Control::Select(_) => ControlKind::Select,
            Control::Checkbox(_) => ControlKind::Checkbox,
            Control::Radio(_) => ControlKind::Radio,
            Control::Button(_) => ControlKind::Button,
            Control::Image(_) => ControlKind::Image,
            Control::Hidden => ControlKind::Hidden,
            Control::File(_) => ControlKind::File,
            Control::Color => ControlKind::Color,
            Control::Number(_) => ControlKind::Number,
            Control::Range(_) => ControlKind::Range,
            Control::Time(_) => ControlKind::Time,
            Control::Date(_) => ControlKind::Date,
            Control::DatetimeLocal(_) => ControlKind::DatetimeLocal,
            Control::Month(_) => ControlKind::Month,
            Control::Week(_) => ControlKind::Week,
            Control::Unknown => return None,
        })
    }

    pub fn text_fields(&self) -> Option<&TextFields> {
        match self {
            Control::Text(fields)
            | Control::Password(fields)
            | Control::Email(fields)
            | Control::Tel(fields)
            | Control::Url(fields)
            | Control::Search(fields)
            | Control::Textarea(fields) => Some(fields),
            Control::Number(fields) => Some(&fields.text),
            _ => None,
        }
    }

    pub fn text_fields_mut(&mut self) -> Option<&mut TextFields> {
        match self {
            Control::Text(fields)
            | Control::Password(fields)
            | Control::Email(fields)
            | Control::Tel(fields)
            | Control::Url(fields)
            | Control::Search(fields)
            | Control::Textarea(fields) => Some(fields),
            Control::Number(fields) => Some(&mut fields.text),
            _ => None,
        }
    }

    pub fn range_fields(&self) -> Option<&RangeFields> {
        match self {
            Control::Range(fields)
            | Control::Time(fields)
            | Control::Date(fields)
            | Control::DatetimeLocal(fields)
            | Control::Month(fields)
            | Control::Week(fields) => Some(fields),
            Control::Number(fields) => Some(&fields.range),
            _ => None,
        }
    }

    pub fn range_fields_mut(&mut self) -> Option<&mut RangeFields> {
        match self {
            Control::Range(fields)
            | Control::Time(fields)
            | Control::Date(fields)
            | Control::DatetimeLocal(fields)
            | Control::Month(fields)
            | Control::Week(fields) => Some(fields),
            Control::Number(fields) => Some(&mut fields.range),
            _ => None,
        }
    }

    pub fn check_fields(&self) -> Option<&CheckFields> {
        match self {
            Control::Checkbox(fields) | Control::Radio(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn check_fields_mut(&mut self) -> Option<&mut CheckFields> {
        match self {
            Control::Checkbox(fields) | Control::Radio(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn button_fields(&self) -> Option<&ButtonFields> {
        match self {
            Control::Button(fields) | Control::Image(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn button_fields_mut(&mut self) -> Option<&mut ButtonFields> {
        match self {
            Control::Button(fields) | Control::Image(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn file_fields(&self) -> Option<&FileFields> {
        match self {
            Control::File(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn file_fields_mut(&mut self) -> Option<&mut FileFields> {
        match self {
            Control::File(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Describes the native control a form-associated element stands in for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormControlDescriptor {
    /// Kind and kind-specific fields.
    #[serde(flatten)]
    pub control: Control,
    /// Initial value; `None` is `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FormValue>,
    /// Submission name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, alias = "readOnly")]
    pub readonly: bool,
}

impl Default for FormControlDescriptor {
    fn default() -> Self {
        Self::new(ControlKind::Text)
    }
}

impl FormControlDescriptor {
    /// A descriptor of `kind` with no value and no constraints.
    pub fn new(kind: ControlKind) -> Self {
        Self::with_control(Control::new(kind))
    }

    /// A descriptor carrying an unrecognized kind.
    pub fn unknown() -> Self {
        Self::with_control(Control::Unknown)
    }

    fn with_control(control: Control) -> Self {
        Self {
            control,
            value: None,
            name: None,
            disabled: false,
            required: false,
            readonly: false,
        }
    }

    /// Parse the JSON object shape.
    ///
    /// An unrecognized `control` string yields [`Control::Unknown`], not an
    /// error; only malformed JSON or a missing `control` key fails.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the JSON object shape.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The kind, or `None` for an unrecognized one.
    pub fn kind(&self) -> Option<ControlKind> {
        self.control.kind()
    }

    // =========================================================================
    // Field access
    // =========================================================================

    pub fn placeholder(&self) -> Option<&str> {
        self.control.text_fields()?.placeholder.as_deref()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.control.text_fields()?.pattern.as_deref()
    }

    pub fn min_length(&self) -> Option<usize> {
        self.control.text_fields()?.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.control.text_fields()?.max_length
    }

    pub fn min(&self) -> Option<&str> {
        self.control.range_fields()?.min.as_deref()
    }

    pub fn max(&self) -> Option<&str> {
        self.control.range_fields()?.max.as_deref()
    }

    pub fn step(&self) -> Option<&str> {
        self.control.range_fields()?.step.as_deref()
    }

    pub fn checked(&self) -> Option<bool> {
        self.control.check_fields()?.checked
    }

    pub fn default_checked(&self) -> Option<bool> {
        self.control.check_fields()?.default_checked
    }

    /// The declared button type, if any.
    pub fn button_type(&self) -> Option<ButtonType> {
        self.control.button_fields()?.button_type
    }

    pub fn accept(&self) -> Option<&str> {
        self.control.file_fields()?.accept.as_deref()
    }

    /// `multiple` of file and select controls.
    pub fn multiple(&self) -> bool {
        match &self.control {
            Control::File(fields) => fields.multiple,
            Control::Select(fields) => fields.multiple,
            _ => false,
        }
    }

    pub fn files(&self) -> Option<&[FileData]> {
        self.control.file_fields()?.files.as_deref()
    }

    // =========================================================================
    // Field updates (inert when the kind lacks the field)
    // =========================================================================

    pub fn set_placeholder(&mut self, placeholder: Option<String>) {
        if let Some(fields) = self.control.text_fields_mut() {
            fields.placeholder = placeholder;
        }
    }

    pub fn set_pattern(&mut self, pattern: Option<String>) {
        if let Some(fields) = self.control.text_fields_mut() {
            fields.pattern = pattern;
        }
    }

    pub fn set_min_length(&mut self, min_length: Option<usize>) {
        if let Some(fields) = self.control.text_fields_mut() {
            fields.min_length = min_length;
        }
    }

    pub fn set_max_length(&mut self, max_length: Option<usize>) {
        if let Some(fields) = self.control.text_fields_mut() {
            fields.max_length = max_length;
        }
    }

    pub fn set_min(&mut self, min: Option<String>) {
        if let Some(fields) = self.control.range_fields_mut() {
            fields.min = min;
        }
    }

    pub fn set_max(&mut self, max: Option<String>) {
        if let Some(fields) = self.control.range_fields_mut() {
            fields.max = max;
        }
    }

    pub fn set_step(&mut self, step: Option<String>) {
        if let Some(fields) = self.control.range_fields_mut() {
            fields.step = step;
        }
    }

    pub fn set_checked(&mut self, checked: Option<bool>) {
        if let Some(fields) = self.control.check_fields_mut() {
            fields.checked = checked;
        }
    }

    pub fn set_default_checked(&mut self, default_checked: Option<bool>) {
        if let Some(fields) = self.control.check_fields_mut() {
            fields.default_checked = default_checked;
        }
    }

    pub fn set_button_type(&mut self, button_type: Option<ButtonType>) {
        if let Some(fields) = self.control.button_fields_mut() {
            fields.button_type = button_type;
        }
    }

    pub fn set_accept(&mut self, accept: Option<String>) {
        if let Some(fields) = self.control.file_fields_mut() {
            fields.accept = accept;
        }
    }

    pub fn set_multiple(&mut self, multiple: bool) {
        match &mut self.control {
            Control::File(fields) => fields.multiple = multiple,
            Control::Select(fields) => fields.multiple = multiple,
            _ => {}
        }
    }

    pub fn set_files(&mut self, files: Option<Vec<FileData>>) {
        if let Some(fields) = self.control.file_fields_mut() {
            fields.files = files;
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    pub fn with_value(mut self, value: impl Into<FormValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.set_placeholder(Some(placeholder.into()));
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.set_pattern(Some(pattern.into()));
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.set_min_length(Some(min_length));
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.set_max_length(Some(max_length));
        self
    }

    pub fn with_min(mut self, min: impl Into<String>) -> Self {
        self.set_min(Some(min.into()));
        self
    }

    pub fn with_max(mut self, max: impl Into<String>) -> Self {
        self.set_max(Some(max.into()));
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.set_step(Some(step.into()));
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.set_checked(Some(checked));
        self
    }

    pub fn with_default_checked(mut self, default_checked: bool) -> Self {
        self.set_default_checked(Some(default_checked));
        self
    }

    pub fn with_button_type(mut self, button_type: ButtonType) -> Self {
        self.set_button_type(Some(button_type));
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.set_accept(Some(accept.into()));
        self
    }

    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.set_multiple(multiple);
        self
    }

    pub fn with_files(mut self, files: Vec<FileData>) -> Self {
        self.set_files(Some(files));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_parse_back() {
        for kind in ControlKind::ALL {
            assert_eq!(kind.as_str().parse::<ControlKind>().unwrap(), kind);
        }
        assert!(matches!(
            "slider".parse::<ControlKind>(),
            Err(DescriptorError::UnknownControl(name)) if name == "slider"
        ));
    }

    #[test]
    fn test_families() {
        assert!(ControlKind::Search.is_text_family());
        assert!(!ControlKind::Textarea.is_text_family());
        assert!(ControlKind::Textarea.is_text_like());
        assert!(ControlKind::Week.is_numeric_family());
        assert!(ControlKind::Week.is_date_family());
        assert!(!ControlKind::Number.is_date_family());
        assert!(ControlKind::Radio.is_checkable());
        assert!(ControlKind::Image.is_button());
    }

    #[test]
    fn test_json_radio() {
        let descriptor =
            FormControlDescriptor::from_json(r#"{"control": "radio", "name": "g", "checked": true}"#)
                .unwrap();
        assert_eq!(descriptor.kind(), Some(ControlKind::Radio));
        assert_eq!(descriptor.name.as_deref(), Some("g"));
        assert_eq!(descriptor.checked(), Some(true));
        assert_eq!(descriptor.default_checked(), None);
    }

    #[test]
    fn test_json_unknown_control_is_soft() {
        let descriptor =
            FormControlDescriptor::from_json(r#"{"control": "slider", "name": "s"}"#).unwrap();
        assert_eq!(descriptor.control, Control::Unknown);
        assert_eq!(descriptor.kind(), None);
        assert_eq!(descriptor.name.as_deref(), Some("s"));
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            FormControlDescriptor::from_json("{"),
            Err(DescriptorError::Json(_))
        ));
        assert!(FormControlDescriptor::from_json(r#"{"name": "x"}"#).is_err());
    }

    #[test]
    fn test_json_foreign_fields_ignored() {
        let descriptor = FormControlDescriptor::from_json(
            r#"{"control": "text", "min": "3", "checked": true, "placeholder": "Name"}"#,
        )
        .unwrap();
        assert_eq!(descriptor.placeholder(), Some("Name"));
        assert_eq!(descriptor.min(), None);
        assert_eq!(descriptor.checked(), None);
    }

    #[test]
    fn test_json_number_fields() {
        let descriptor = FormControlDescriptor::from_json(
            r#"{"control": "number", "min": 10, "max": 20.5, "step": "any", "minLength": 2, "readOnly": true}"#,
        )
        .unwrap();
        assert_eq!(descriptor.min(), Some("10"));
        assert_eq!(descriptor.max(), Some("20.5"));
        assert_eq!(descriptor.step(), Some("any"));
        assert_eq!(descriptor.min_length(), Some(2));
        assert!(descriptor.readonly);
    }

    #[test]
    fn test_json_values() {
        let text = FormControlDescriptor::from_json(r#"{"control": "hidden", "value": "x"}"#).unwrap();
        assert_eq!(text.value, Some(FormValue::Text("x".into())));

        let file = FormControlDescriptor::from_json(
            r#"{"control": "file", "multiple": true, "value": [{"name": "a.txt", "type": "text/plain", "size": 3}]}"#,
        )
        .unwrap();
        assert!(file.multiple());
        assert_eq!(
            file.value,
            Some(FormValue::Files(vec![FileData::new("a.txt").with_type("text/plain").with_size(3)]))
        );

        let null = FormControlDescriptor::from_json(r#"{"control": "text", "value": null}"#).unwrap();
        assert_eq!(null.value, None);
    }

    #[test]
    fn test_button_type() {
        let submit = FormControlDescriptor::from_json(r#"{"control": "button", "type": "bogus"}"#).unwrap();
        assert_eq!(submit.button_type(), Some(ButtonType::Submit));
        let reset = FormControlDescriptor::from_json(r#"{"control": "image", "type": "reset"}"#).unwrap();
        assert_eq!(reset.button_type(), Some(ButtonType::Reset));
        let plain = FormControlDescriptor::new(ControlKind::Button);
        assert_eq!(plain.button_type(), None);

        let explicit = FormControlDescriptor::new(ControlKind::Button).with_button_type(ButtonType::Submit);
        let json = explicit.to_json().unwrap();
        assert!(json.contains(r#""type":"submit""#));
        assert_eq!(FormControlDescriptor::from_json(&json).unwrap(), explicit);
        let button = FormControlDescriptor::from_json(r#"{"control": "button", "type": "button"}"#).unwrap();
        assert_eq!(button.button_type(), Some(ButtonType::Button));
    }

    #[test]
    fn test_builders_inert_on_foreign_fields() {
        let descriptor = FormControlDescriptor::new(ControlKind::Checkbox)
            .with_placeholder("ignored")
            .with_min("1")
            .with_default_checked(true)
            .with_name("agree");
        assert_eq!(descriptor.placeholder(), None);
        assert_eq!(descriptor.min(), None);
        assert_eq!(descriptor.default_checked(), Some(true));

        let number = FormControlDescriptor::new(ControlKind::Number)
            .with_placeholder("qty")
            .with_step("0.5");
        assert_eq!(number.placeholder(), Some("qty"));
        assert_eq!(number.step(), Some("0.5"));
    }

    #[test]
    fn test_json_round_trip_shape() {
        let descriptor = FormControlDescriptor::new(ControlKind::DatetimeLocal)
            .with_name("when")
            .with_min("2024-01-01T00:00");
        let json = descriptor.to_json().unwrap();
        assert!(json.contains(r#""control":"datetime-local""#));
        assert_eq!(FormControlDescriptor::from_json(&json).unwrap(), descriptor);
    }
}
