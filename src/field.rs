use std::path::Path;

use scraper::ElementRef;

use crate::choice::{RadioGroup, SelectField};
use crate::error::{Error, Result};
use crate::value::{FieldValue, FileUpload, SetValue};

/// Capabilities shared by every form field variant.
pub trait Field {
    /// The submitted name, possibly in bracket notation.
    fn name(&self) -> &str;

    /// The value that would be submitted, if any.
    fn value(&self) -> Option<FieldValue>;

    fn set_value(&mut self, value: SetValue) -> Result<()>;

    /// Whether the field contributes to the submitted values.
    fn has_value(&self) -> bool;

    fn is_disabled(&self) -> bool;
}

pub(crate) fn tag_name<'a>(element: &ElementRef<'a>) -> &'a str {
    element.value().name()
}

pub(crate) fn input_type(element: &ElementRef) -> String {
    element
        .value()
        .attr("type")
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub(crate) fn has_attr(element: &ElementRef, name: &str) -> bool {
    element.value().attr(name).is_some()
}

pub(crate) fn name_attr(element: &ElementRef) -> String {
    element.value().attr("name").unwrap_or_default().to_string()
}

/// Text inputs, hidden inputs and every other `<input>` that is not a
/// checkbox, a radio button or a file upload. Also built from `<button>`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    name: String,
    value: Option<String>,
    disabled: bool,
}

impl InputField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            disabled: false,
        }
    }

    pub fn from_element(element: ElementRef) -> Result<Self> {
        let tag = tag_name(&element);
        if tag != "input" && tag != "button" {
            return Err(Error::tag_mismatch("an input or button element", tag));
        }
        match input_type(&element).as_str() {
            "checkbox" => {
                return Err(Error::tag_mismatch(
                    "a non-checkbox input",
                    "input[type=checkbox]",
                ))
            }
            "file" => return Err(Error::tag_mismatch("a non-file input", "input[type=file]")),
            _ => {}
        }

        Ok(Self {
            name: name_attr(&element),
            value: element.value().attr("value").map(String::from),
            disabled: has_attr(&element, "disabled"),
        })
    }
}

impl Field for InputField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.clone().map(FieldValue::Text)
    }

    fn set_value(&mut self, value: SetValue) -> Result<()> {
        self.value = Some(match value {
            SetValue::Text(text) => text,
            SetValue::Bool(true) => "1".to_string(),
            SetValue::Bool(false) => String::new(),
            _ => return Err(Error::type_mismatch(&self.name, "a string")),
        });
        Ok(())
    }

    fn has_value(&self) -> bool {
        self.value.is_some()
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// A `<textarea>`; always submitted, even when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TextareaField {
    name: String,
    value: String,
    disabled: bool,
}

impl TextareaField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            disabled: false,
        }
    }

    pub fn from_element(element: ElementRef) -> Result<Self> {
        let tag = tag_name(&element);
        if tag != "textarea" {
            return Err(Error::tag_mismatch("a textarea element", tag));
        }

        Ok(Self {
            name: name_attr(&element),
            value: element.text().collect(),
            disabled: has_attr(&element, "disabled"),
        })
    }
}

impl Field for TextareaField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<FieldValue> {
        Some(FieldValue::Text(self.value.clone()))
    }

    fn set_value(&mut self, value: SetValue) -> Result<()> {
        self.value = match value {
            SetValue::Text(text) => text,
            SetValue::Bool(true) => "1".to_string(),
            SetValue::Bool(false) => String::new(),
            _ => return Err(Error::type_mismatch(&self.name, "a string")),
        };
        Ok(())
    }

    fn has_value(&self) -> bool {
        true
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// `<input type="checkbox">`: submits its `value` attribute (or `"on"`) when
/// ticked and nothing otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckBoxField {
    name: String,
    checked_value: String,
    value: Option<String>,
    disabled: bool,
}

impl CheckBoxField {
    /// An unticked checkbox submitting `checked_value` once ticked.
    pub fn new(name: impl Into<String>, checked_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checked_value: checked_value.into(),
            value: None,
            disabled: false,
        }
    }

    pub fn from_element(element: ElementRef) -> Result<Self> {
        let tag = tag_name(&element);
        if tag != "input" {
            return Err(Error::tag_mismatch("an input element", tag));
        }
        let kind = input_type(&element);
        if kind != "checkbox" {
            return Err(Error::tag_mismatch(
                "an input with a type of checkbox",
                format!("input[type={kind}]"),
            ));
        }

        let mut field = Self {
            name: name_attr(&element),
            checked_value: element.value().attr("value").unwrap_or("on").to_string(),
            value: None,
            disabled: has_attr(&element, "disabled"),
        };
        field.set_checked(has_attr(&element, "checked"));
        Ok(field)
    }

    pub fn tick(&mut self) {
        self.set_checked(true);
    }

    pub fn untick(&mut self) {
        self.set_checked(false);
    }

    pub fn is_checked(&self) -> bool {
        self.value.is_some()
    }

    fn set_checked(&mut self, checked: bool) {
        self.value = checked.then(|| self.checked_value.clone());
    }
}

impl Field for CheckBoxField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.clone().map(FieldValue::Text)
    }

    /// Booleans tick or untick; text ticks unless it is empty or `"0"`.
    fn set_value(&mut self, value: SetValue) -> Result<()> {
        let checked = match value {
            SetValue::Bool(flag) => flag,
            SetValue::Text(text) => !(text.is_empty() || text == "0"),
            _ => return Err(Error::type_mismatch(&self.name, "a boolean")),
        };
        self.set_checked(checked);
        Ok(())
    }

    fn has_value(&self) -> bool {
        self.is_checked()
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// `<input type="file">`. Always carries a descriptor; an untouched input
/// holds the "no file" descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FileField {
    name: String,
    upload: FileUpload,
    disabled: bool,
}

impl FileField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upload: FileUpload::empty(),
            disabled: false,
        }
    }

    pub fn from_element(element: ElementRef) -> Result<Self> {
        let tag = tag_name(&element);
        if tag != "input" {
            return Err(Error::tag_mismatch("an input element", tag));
        }
        let kind = input_type(&element);
        if kind != "file" {
            return Err(Error::tag_mismatch(
                "an input with a type of file",
                format!("input[type={kind}]"),
            ));
        }

        Ok(Self {
            name: name_attr(&element),
            upload: FileUpload::empty(),
            disabled: has_attr(&element, "disabled"),
        })
    }

    /// Attach the file at `path`.
    pub fn upload(&mut self, path: impl AsRef<Path>) {
        self.upload = FileUpload::from_path(path);
    }

    pub fn set_upload(&mut self, upload: FileUpload) {
        self.upload = upload;
    }

    pub fn clear(&mut self) {
        self.upload = FileUpload::empty();
    }

    pub fn descriptor(&self) -> &FileUpload {
        &self.upload
    }
}

impl Field for FileField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<FieldValue> {
        Some(FieldValue::File(self.upload.clone()))
    }

    /// Text is taken as a path to attach; empty text detaches.
    fn set_value(&mut self, value: SetValue) -> Result<()> {
        match value {
            SetValue::Text(path) if path.is_empty() => self.clear(),
            SetValue::Text(path) => self.upload(path),
            _ => return Err(Error::type_mismatch(&self.name, "a file path")),
        }
        Ok(())
    }

    fn has_value(&self) -> bool {
        !self.upload.is_empty()
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// Every kind of field a form can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Input(InputField),
    Textarea(TextareaField),
    CheckBox(CheckBoxField),
    Radio(RadioGroup),
    Select(SelectField),
    File(FileField),
}

macro_rules! dispatch {
    ($self:expr, $field:ident => $body:expr) => {
        match $self {
            FormField::Input($field) => $body,
            FormField::Textarea($field) => $body,
            FormField::CheckBox($field) => $body,
            FormField::Radio($field) => $body,
            FormField::Select($field) => $body,
            FormField::File($field) => $body,
        }
    };
}

impl Field for FormField {
    fn name(&self) -> &str {
        dispatch!(self, f => f.name())
    }

    fn value(&self) -> Option<FieldValue> {
        dispatch!(self, f => f.value())
    }

    fn set_value(&mut self, value: SetValue) -> Result<()> {
        dispatch!(self, f => f.set_value(value))
    }

    fn has_value(&self) -> bool {
        dispatch!(self, f => f.has_value())
    }

    fn is_disabled(&self) -> bool {
        dispatch!(self, f => f.is_disabled())
    }
}

impl FormField {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Textarea(_) => "textarea",
            Self::CheckBox(_) => "checkbox",
            Self::Radio(_) => "radio",
            Self::Select(_) => "select",
            Self::File(_) => "file",
        }
    }

    /// Convenience for [`Field::set_value`] with anything convertible.
    pub fn set(&mut self, value: impl Into<SetValue>) -> Result<()> {
        self.set_value(value.into())
    }

    /// Select `value` on a radio group or a select box; plain assignment otherwise.
    pub fn select(&mut self, value: &str) -> Result<()> {
        match self {
            Self::Radio(radio) => radio.select(value),
            Self::Select(select) => select.select(value),
            other => other.set_value(SetValue::Text(value.to_string())),
        }
    }

    pub fn as_checkbox_mut(&mut self) -> Option<&mut CheckBoxField> {
        match self {
            Self::CheckBox(checkbox) => Some(checkbox),
            _ => None,
        }
    }

    pub fn as_radio(&self) -> Option<&RadioGroup> {
        match self {
            Self::Radio(radio) => Some(radio),
            _ => None,
        }
    }

    pub fn as_radio_mut(&mut self) -> Option<&mut RadioGroup> {
        match self {
            Self::Radio(radio) => Some(radio),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectField> {
        match self {
            Self::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileField> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Lift option validation on radio groups and select boxes.
    pub fn disable_validation(&mut self) {
        match self {
            Self::Radio(radio) => {
                radio.disable_validation();
            }
            Self::Select(select) => {
                select.disable_validation();
            }
            _ => {}
        }
    }
}

impl From<InputField> for FormField {
    fn from(field: InputField) -> Self {
        Self::Input(field)
    }
}

impl From<TextareaField> for FormField {
    fn from(field: TextareaField) -> Self {
        Self::Textarea(field)
    }
}

impl From<CheckBoxField> for FormField {
    fn from(field: CheckBoxField) -> Self {
        Self::CheckBox(field)
    }
}

impl From<RadioGroup> for FormField {
    fn from(field: RadioGroup) -> Self {
        Self::Radio(field)
    }
}

impl From<SelectField> for FormField {
    fn from(field: SelectField) -> Self {
        Self::Select(field)
    }
}

impl From<FileField> for FormField {
    fn from(field: FileField) -> Self {
        Self::File(field)
    }
}
