//! Values that participate in form submission.
//!
//! [`FormValue`] mirrors what `ElementInternals.setFormValue()` accepts: a
//! string, a single file, a file list, or a set of named entries.

use serde::{Deserialize, Serialize};

/// Metadata describing a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileData {
    /// The file name, without any directory part.
    pub name: String,
    /// The MIME type, empty when unknown.
    #[serde(rename = "type", default)]
    pub content_type: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl FileData {
    /// Create file metadata with an unknown type and zero size.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: String::new(),
            size: 0,
        }
    }

    /// Set the MIME type.
    pub fn with_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

/// A single named entry of a form data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormEntry {
    /// Entry name.
    pub name: String,
    /// Entry value.
    pub value: FormValue,
}

impl FormEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A value a control contributes to its form.
///
/// `None` at the use sites stands for `null` (no contribution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// A plain string value.
    Text(String),
    /// A single file.
    File(FileData),
    /// A list of files.
    Files(Vec<FileData>),
    /// Several named entries (a `FormData`).
    Entries(Vec<FormEntry>),
}

impl FormValue {
    /// The string payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the value carries nothing (empty string, empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Text(text) => text.is_empty(),
            FormValue::File(_) => false,
            FormValue::Files(files) => files.is_empty(),
            FormValue::Entries(entries) => entries.is_empty(),
        }
    }

    /// The string a native control shows for this value.
    ///
    /// Files render as their name (the first one for lists); entry sets have
    /// no textual form.
    pub fn display_text(&self) -> String {
        match self {
            FormValue::Text(text) => text.clone(),
            FormValue::File(file) => file.name.clone(),
            FormValue::Files(files) => files.first().map(|f| f.name.clone()).unwrap_or_default(),
            FormValue::Entries(_) => String::new(),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<FileData> for FormValue {
    fn from(value: FileData) -> Self {
        FormValue::File(value)
    }
}

impl From<Vec<FileData>> for FormValue {
    fn from(value: Vec<FileData>) -> Self {
        FormValue::Files(value)
    }
}
