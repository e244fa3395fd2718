use crate::field::{Field, FormField};
use crate::form::Form;
use crate::link::Link;
use crate::path;
use crate::value::{FieldValue, NestedValue, NestedValues};

/// Render a form and what submitting it would send.
///
/// Example output:
/// ```text
/// form: GET http://example.com/search?q=rust&lang=en
/// ---
/// input q = "rust"
/// checkbox remember [unchecked]
/// select lang = "en" (en|fr)
/// file avatar [no file]
/// ---
/// values:
///   q = "rust"
///   lang = "en"
/// ```
pub fn to_compact_text(form: &Form) -> String {
    let submission = form.submission();
    let mut output = format!("form: {} {}\n---\n", submission.method, submission.uri);

    for (name, field) in form.all_fields() {
        serialize_field(&name, field, &mut output);
    }

    if !submission.values.is_empty() || !submission.files.is_empty() {
        output.push_str("---\n");
    }
    if !submission.values.is_empty() {
        output.push_str("values:\n");
        serialize_nested(&submission.values, "", &mut output);
    }
    if !submission.files.is_empty() {
        output.push_str("files:\n");
        serialize_nested(&submission.files, "", &mut output);
    }

    output
}

/// One line per link: `link "Text" -> resolved`.
pub fn links_to_compact_text(links: &[Link]) -> String {
    let mut output = String::new();
    for link in links {
        output.push_str(link.tag());
        if !link.text().is_empty() {
            output.push_str(&format!(" \"{}\"", link.text()));
        }
        output.push_str(&format!(" -> {}\n", link.uri()));
    }
    output
}

fn serialize_field(name: &str, field: &FormField, output: &mut String) {
    output.push_str(&format!("{} {name}", field.kind()));

    match (field, field.value()) {
        (FormField::CheckBox(_), None) => output.push_str(" [unchecked]"),
        (FormField::File(_), Some(FieldValue::File(upload))) if upload.is_empty() => {
            output.push_str(" [no file]")
        }
        (_, Some(FieldValue::File(upload))) => {
            output.push_str(&format!(" = {} ({})", upload.name, upload.tmp_name))
        }
        (_, Some(FieldValue::Text(text))) => output.push_str(&format!(" = \"{text}\"")),
        (_, Some(FieldValue::Multiple(items))) => {
            let quoted: Vec<String> = items.iter().map(|item| format!("\"{item}\"")).collect();
            output.push_str(&format!(" = [{}]", quoted.join(", ")));
        }
        (_, None) => {}
    }

    let options = match field {
        FormField::Radio(radio) => radio.available_values(),
        FormField::Select(select) => select.available_values(),
        _ => Vec::new(),
    };
    if !options.is_empty() {
        output.push_str(&format!(" ({})", options.join("|")));
    }

    if field.is_disabled() {
        output.push_str(" [disabled]");
    }
    output.push('\n');
}

fn serialize_nested(values: &NestedValues, base: &str, output: &mut String) {
    for (key, value) in values {
        let name = path::join(base, key);
        match value {
            NestedValue::Text(text) => output.push_str(&format!("  {name} = \"{text}\"\n")),
            NestedValue::File(upload) if upload.is_empty() => {
                output.push_str(&format!("  {name}: [no file]\n"))
            }
            NestedValue::File(upload) => output.push_str(&format!(
                "  {name}: {} ({}, {} bytes)\n",
                upload.name, upload.tmp_name, upload.size
            )),
            NestedValue::Map(children) => serialize_nested(children, &name, output),
        }
    }
}
