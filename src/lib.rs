//! Browser-accurate emulation of HTML forms and links: resolve where a link
//! or form points to and compute exactly what a submission would send.

pub mod choice;
pub mod document;
pub mod error;
pub mod field;
pub mod form;
pub mod link;
pub mod path;
pub mod registry;
pub mod serialize;
pub mod uri;
pub mod value;

pub use choice::{ChoiceOption, RadioGroup, SelectField};
pub use document::Document;
pub use error::{Error, Result};
pub use field::{CheckBoxField, Field, FileField, FormField, InputField, TextareaField};
pub use form::{Form, Submission};
pub use link::Link;
pub use registry::FieldRegistry;
pub use value::{FieldValue, FileUpload, NestedValue, NestedValues, SetValue};
