//! Fields whose value is picked from a fixed set of options: radio groups
//! and select boxes.

use scraper::ElementRef;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::field::{has_attr, input_type, name_attr, tag_name, Field};
use crate::value::{FieldValue, SetValue};

/// One selectable option, as found in the markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: String,
    pub disabled: bool,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// The `value` attribute, else the element text when non-empty, else `"on"`.
    fn from_element(element: &ElementRef) -> Self {
        let value = match element.value().attr("value") {
            Some(value) => value.to_string(),
            None => {
                let text: String = element.text().collect();
                if text.is_empty() {
                    "on".to_string()
                } else {
                    text
                }
            }
        };

        Self {
            value,
            disabled: has_attr(element, "disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Choices {
    options: Vec<ChoiceOption>,
    validation_disabled: bool,
}

impl Choices {
    fn available_values(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.value.as_str()).collect()
    }

    fn contains(&self, value: &str) -> bool {
        self.validation_disabled || self.options.iter().any(|o| o.value == value)
    }

    fn check(&self, field: &str, value: &str) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(Error::InvalidOption {
                field: field.to_string(),
                value: value.to_string(),
                available: self.available_values().join(", "),
            })
        }
    }

    fn is_disabled_value(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value && o.disabled)
    }
}

/// Radio buttons sharing one name, submitted as a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioGroup {
    name: String,
    choices: Choices,
    value: Option<String>,
}

impl RadioGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            choices: Choices::default(),
            value: None,
        }
    }

    /// Register another radio button of this group.
    ///
    /// A checked button takes the selection; otherwise the first enabled
    /// button becomes the default.
    pub fn add_choice(&mut self, element: ElementRef) -> Result<()> {
        if tag_name(&element) != "input"
            || input_type(&element) != "radio"
            || name_attr(&element) != self.name
        {
            return Err(Error::NotARadioInput(self.name.clone()));
        }

        let option = ChoiceOption::from_element(&element);
        self.add_option(option, has_attr(&element, "checked"));
        Ok(())
    }

    pub fn add_option(&mut self, option: ChoiceOption, checked: bool) {
        if checked || (self.value.is_none() && !option.disabled) {
            self.value = Some(option.value.clone());
        }
        self.choices.options.push(option);
    }

    pub fn select(&mut self, value: &str) -> Result<()> {
        self.choices.check(&self.name, value)?;
        self.value = Some(value.to_string());
        Ok(())
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.choices.options
    }

    pub fn available_values(&self) -> Vec<&str> {
        self.choices.available_values()
    }

    pub fn contains_option(&self, value: &str) -> bool {
        self.choices.contains(value)
    }

    pub fn disable_validation(&mut self) -> &mut Self {
        self.choices.validation_disabled = true;
        self
    }
}

impl Field for RadioGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<FieldValue> {
        self.value.clone().map(FieldValue::Text)
    }

    fn set_value(&mut self, value: SetValue) -> Result<()> {
        match value {
            SetValue::Text(value) => self.select(&value),
            other => Err(Error::type_mismatch(
                &self.name,
                &format!("a string, not {}", other.kind()),
            )),
        }
    }

    fn has_value(&self) -> bool {
        !self.choices.options.is_empty()
    }

    fn is_disabled(&self) -> bool {
        self.value
            .as_deref()
            .is_some_and(|value| self.choices.is_disabled_value(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Selection {
    Single(Option<String>),
    Multiple(Vec<String>),
}

/// A `<select>` box, single or multiple.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    name: String,
    choices: Choices,
    selection: Selection,
    disabled: bool,
}

impl SelectField {
    pub fn new(name: impl Into<String>, multiple: bool) -> Self {
        Self {
            name: name.into(),
            choices: Choices::default(),
            selection: if multiple {
                Selection::Multiple(Vec::new())
            } else {
                Selection::Single(None)
            },
            disabled: false,
        }
    }

    /// Build from a `<select>` element and its descendant `<option>`s.
    ///
    /// A multiple select named `foo[]` is registered as `foo`: the array is
    /// carried by the value, not by the name.
    pub fn from_element(element: ElementRef) -> Result<Self> {
        let tag = tag_name(&element);
        if tag != "select" {
            return Err(Error::tag_mismatch("a select element", tag));
        }

        let multiple = has_attr(&element, "multiple");
        let mut name = name_attr(&element);
        if multiple {
            if let Some(stripped) = name.strip_suffix("[]") {
                name = stripped.to_string();
            }
        }

        let mut field = Self::new(name, multiple);
        field.disabled = has_attr(&element, "disabled");

        for option in element
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| tag_name(e) == "option")
        {
            field.add_option(ChoiceOption::from_element(&option), has_attr(&option, "selected"));
        }

        Ok(field)
    }

    pub fn add_option(&mut self, option: ChoiceOption, selected: bool) {
        if selected {
            match &mut self.selection {
                Selection::Single(value) => *value = Some(option.value.clone()),
                Selection::Multiple(values) => values.push(option.value.clone()),
            }
        }
        self.choices.options.push(option);
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self.selection, Selection::Multiple(_))
    }

    pub fn select(&mut self, value: &str) -> Result<()> {
        self.set_value(SetValue::Text(value.to_string()))
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.choices.options
    }

    pub fn available_values(&self) -> Vec<&str> {
        self.choices.available_values()
    }

    pub fn contains_option(&self, value: &str) -> bool {
        self.choices.contains(value)
    }

    pub fn disable_validation(&mut self) -> &mut Self {
        self.choices.validation_disabled = true;
        self
    }

    /// The selected value of a single select; browsers fall back to the first option.
    fn effective_single(&self) -> Option<&str> {
        match &self.selection {
            Selection::Single(Some(value)) => Some(value),
            Selection::Single(None) => self.choices.options.first().map(|o| o.value.as_str()),
            Selection::Multiple(_) => None,
        }
    }
}

impl Field for SelectField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<FieldValue> {
        match &self.selection {
            Selection::Multiple(values) => Some(FieldValue::Multiple(values.clone())),
            Selection::Single(_) => self
                .effective_single()
                .map(|value| FieldValue::Text(value.to_string())),
        }
    }

    fn set_value(&mut self, value: SetValue) -> Result<()> {
        match value {
            SetValue::Text(value) => {
                self.choices.check(&self.name, &value)?;
                self.selection = match self.selection {
                    Selection::Single(_) => Selection::Single(Some(value)),
                    Selection::Multiple(_) => Selection::Multiple(vec![value]),
                };
                Ok(())
            }
            SetValue::List(values) => {
                if !self.is_multiple() {
                    return Err(Error::type_mismatch(&self.name, "a string, not a list"));
                }
                for value in &values {
                    self.choices.check(&self.name, value)?;
                }
                self.selection = Selection::Multiple(values);
                Ok(())
            }
            other => Err(Error::type_mismatch(
                &self.name,
                &format!("a string or a list, not {}", other.kind()),
            )),
        }
    }

    fn has_value(&self) -> bool {
        !self.choices.options.is_empty()
    }

    fn is_disabled(&self) -> bool {
        self.disabled
            || self
                .effective_single()
                .is_some_and(|value| self.choices.is_disabled_value(value))
    }
}
