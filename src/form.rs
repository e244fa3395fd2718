use indexmap::IndexMap;
use scraper::{ElementRef, Selector};
use serde::Serialize;
use tracing::debug;

use crate::choice::{RadioGroup, SelectField};
use crate::error::{Error, Result};
use crate::field::{
    input_type, name_attr, tag_name, CheckBoxField, Field, FileField, FormField, InputField,
    TextareaField,
};
use crate::path;
use crate::registry::FieldRegistry;
use crate::uri;
use crate::value::{self, FieldValue, FileUpload, NestedValues, SetValue};

/// Methods whose submission carries a body instead of a query string.
const BODY_METHODS: &[&str] = &["POST", "PUT", "DELETE", "PATCH"];

const FIELD_SELECTOR: &str = "input, button, textarea, select";

/// A `<form>` element turned into the request a browser would send.
///
/// The form is a snapshot: fields are read once from the markup and only
/// change through the setters afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    method: String,
    action: String,
    current_uri: String,
    base_href: Option<String>,
    fields: FieldRegistry,
}

/// Everything an HTTP client needs to send a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub method: String,
    pub uri: String,
    pub values: NestedValues,
    pub files: NestedValues,
}

impl Form {
    /// Build a form from a `<form>` element found on the page at `current_uri`.
    ///
    /// `method` overrides the `method` attribute; both default to `GET`.
    pub fn new(element: ElementRef, current_uri: &str, method: Option<&str>) -> Result<Self> {
        Self::with_base_href(element, current_uri, method, None)
    }

    /// Like [`Form::new`], resolving a non-empty `action` against `base_href`
    /// (the page's `<base>` element) instead of `current_uri`.
    pub fn with_base_href(
        element: ElementRef,
        current_uri: &str,
        method: Option<&str>,
        base_href: Option<&str>,
    ) -> Result<Self> {
        let tag = tag_name(&element);
        if tag != "form" {
            return Err(Error::tag_mismatch("a form element", tag));
        }
        uri::validate_current_uri(current_uri)?;
        if let Some(base_href) = base_href {
            uri::validate_current_uri(base_href)?;
        }

        let method = method
            .filter(|m| !m.is_empty())
            .or_else(|| element.value().attr("method").filter(|m| !m.is_empty()))
            .unwrap_or("GET")
            .to_ascii_uppercase();

        let fields = collect_fields(element)?;

        let form = Self {
            method,
            action: element.value().attr("action").unwrap_or_default().to_string(),
            current_uri: current_uri.to_string(),
            base_href: base_href.map(String::from),
            fields,
        };
        debug!(
            method = %form.method,
            action = %form.action,
            fields = form.fields.all().len(),
            "assembled form"
        );
        Ok(form)
    }

    /// The upper-cased HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The URI the form submits to.
    ///
    /// For methods without a body the submitted values are merged into the
    /// action's query string: a form value replaces every existing pair under
    /// its name, taking the place of the first one; new names are appended.
    pub fn uri(&self) -> String {
        let uri = uri::resolve(&self.action, self.resolution_base());
        if self.has_body() {
            return uri;
        }

        let (base, query) = match uri.split_once('?') {
            Some((base, rest)) => (base, rest.split('#').next().unwrap_or_default()),
            None => (uri.as_str(), ""),
        };

        let mut pairs = value::parse_query(query);
        for (name, value) in self.values() {
            let submitted = match value {
                FieldValue::Text(text) => vec![(name.clone(), text)],
                FieldValue::Multiple(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| (path::join(&name, &index.to_string()), item))
                    .collect(),
                FieldValue::File(_) => continue,
            };
            merge_value(&mut pairs, &name, submitted);
        }

        format!("{base}?{}", value::build_query(&pairs))
            .trim_end_matches('?')
            .to_string()
    }

    /// Values of every enabled, non-file field that would be submitted.
    pub fn values(&self) -> IndexMap<String, FieldValue> {
        self.fields
            .all()
            .into_iter()
            .filter(|(_, field)| !field.is_disabled() && !field.is_file() && field.has_value())
            .filter_map(|(name, field)| field.value().map(|value| (name, value)))
            .collect()
    }

    /// Upload descriptors of enabled file fields; empty unless the method carries a body.
    pub fn files(&self) -> IndexMap<String, FileUpload> {
        if !self.has_body() {
            return IndexMap::new();
        }

        self.fields
            .all()
            .into_iter()
            .filter(|(_, field)| !field.is_disabled())
            .filter_map(|(name, field)| match field {
                FormField::File(file) => Some((name, file.descriptor().clone())),
                _ => None,
            })
            .collect()
    }

    /// [`Form::values`] with bracket names expanded into nested maps.
    pub fn php_values(&self) -> NestedValues {
        value::expand(self.values())
    }

    /// [`Form::files`] with bracket names expanded into nested maps.
    pub fn php_files(&self) -> NestedValues {
        value::expand(
            self.files()
                .into_iter()
                .map(|(name, upload)| (name, FieldValue::File(upload))),
        )
    }

    pub fn submission(&self) -> Submission {
        Submission {
            method: self.method.clone(),
            uri: self.uri(),
            values: self.php_values(),
            files: self.php_files(),
        }
    }

    /// Assign several values at once, stopping at the first failure.
    pub fn set_values<I, K, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SetValue>,
    {
        for (name, value) in values {
            self.fields.set(name.as_ref(), value.into())?;
        }
        Ok(self)
    }

    /// Alias of [`Form::set_values`].
    pub fn fill<I, K, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<SetValue>,
    {
        self.set_values(values)
    }

    pub fn set(&mut self, name: &str, value: impl Into<SetValue>) -> Result<()> {
        self.fields.set(name, value.into())
    }

    pub fn add_field(&mut self, field: impl Into<FormField>) -> Result<&mut Self> {
        self.fields.add(field)?;
        Ok(self)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.has(name)
    }

    pub fn field(&self, name: &str) -> Result<&FormField> {
        self.fields.get(name)
    }

    pub fn field_mut(&mut self, name: &str) -> Result<&mut FormField> {
        self.fields.get_mut(name)
    }

    pub fn remove_field(&mut self, name: &str) -> Result<()> {
        self.fields.remove(name)
    }

    pub fn all_fields(&self) -> IndexMap<String, &FormField> {
        self.fields.all()
    }

    /// Let every radio group and select box accept values outside their options.
    pub fn disable_validation(&mut self) -> &mut Self {
        for field in self.fields.fields_mut() {
            field.disable_validation();
        }
        self
    }

    fn has_body(&self) -> bool {
        BODY_METHODS.contains(&self.method.as_str())
    }

    fn resolution_base(&self) -> &str {
        match &self.base_href {
            Some(base_href) if !self.action.is_empty() => base_href,
            _ => &self.current_uri,
        }
    }
}

/// Replace the first pair named `name` and drop its duplicates, or append.
/// Replace every query pair below the top-level name `name` with `submitted`,
/// in place of the first replaced pair. Bracketed names merge pair by pair.
fn merge_value(pairs: &mut Vec<(String, String)>, name: &str, submitted: Vec<(String, String)>) {
    let mut first = None;
    let mut index = 0;
    pairs.retain(|(key, _)| {
        let keep = top_level(key) != name;
        if !keep && first.is_none() {
            first = Some(index);
        }
        index += 1;
        keep
    });

    match first {
        Some(at) => {
            pairs.splice(at..at, submitted);
        }
        None => {
            for (key, value) in submitted {
                merge_pair(pairs, key, value);
            }
        }
    }
}

fn top_level(key: &str) -> &str {
    let end = key.find('[').filter(|&end| end > 0).unwrap_or(key.len());
    &key[..end]
}

fn merge_pair(pairs: &mut Vec<(String, String)>, name: String, value: String) {
    match pairs.iter().position(|(key, _)| *key == name) {
        Some(first) => {
            pairs[first].1 = value;
            let mut index = 0;
            pairs.retain(|(key, _)| {
                let keep = index <= first || *key != name;
                index += 1;
                keep
            });
        }
        None => pairs.push((name, value)),
    }
}

fn collect_fields(form: ElementRef) -> Result<FieldRegistry> {
    let selector =
        Selector::parse(FIELD_SELECTOR).map_err(|e| Error::InvalidSelector(e.to_string()))?;
    let mut registry = FieldRegistry::new();

    for element in form.select(&selector) {
        let name = name_attr(&element);
        if name.is_empty() {
            continue;
        }

        match (tag_name(&element), input_type(&element).as_str()) {
            ("select", _) => registry.add(SelectField::from_element(element)?)?,
            ("input", "checkbox") => registry.add(CheckBoxField::from_element(element)?)?,
            ("input", "radio") => {
                // Other fields may share the name; only an existing group absorbs the radio.
                if let Some(group) = registry
                    .get_mut(&name)
                    .ok()
                    .and_then(FormField::as_radio_mut)
                {
                    group.add_choice(element)?;
                } else {
                    let mut group = RadioGroup::new(name.as_str());
                    group.add_choice(element)?;
                    registry.add(group)?;
                }
            }
            ("input", "file") => registry.add(FileField::from_element(element)?)?,
            ("input", "submit" | "button" | "image") => {}
            ("input", _) => registry.add(InputField::from_element(element)?)?,
            ("textarea", _) => registry.add(TextareaField::from_element(element)?)?,
            _ => {}
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{NestedValue, UPLOAD_ERR_NO_FILE};
    use rstest::rstest;
    use scraper::Html;

    fn build(markup: &str, method: Option<&str>, current_uri: Option<&str>) -> Result<Form> {
        let html = Html::parse_document(&format!("<html>{markup}</html>"));
        let selector = Selector::parse("form").unwrap();
        let element = html.select(&selector).last().unwrap();
        Form::new(element, current_uri.unwrap_or("http://example.com/"), method)
    }

    fn form(markup: &str) -> Form {
        build(markup, None, None).unwrap()
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::from(value)
    }

    fn summary(form: &Form) -> Vec<(String, &'static str, Option<FieldValue>)> {
        form.all_fields()
            .into_iter()
            .map(|(name, field)| (name, field.kind(), field.value()))
            .collect()
    }

    #[test]
    fn rejects_other_tags() {
        let html = Html::parse_fragment("<textarea></textarea>");
        let element = html.select(&Selector::parse("textarea").unwrap()).next().unwrap();
        let err = Form::new(element, "http://example.com/", None).unwrap_err();
        assert!(matches!(err, Error::LogicalTagMismatch { .. }));
    }

    #[test]
    fn rejects_relative_current_uri() {
        let err = build("<form></form>", None, Some("example.com")).unwrap_err();
        assert_eq!(err, Error::InvalidCurrentUri("example.com".to_string()));
    }

    #[rstest]
    #[case::nameless("<input type=\"text\" value=\"foo\"><input type=\"submit\">", vec![])]
    #[case::empty_name(
        "<input type=\"text\" name=\"\" value=\"foo\"><input type=\"submit\">",
        vec![]
    )]
    #[case::disabled_input(
        "<input type=\"text\" name=\"foo\" value=\"foo\" disabled=\"disabled\"><input type=\"submit\">",
        vec![("foo", "input", Some("foo"))]
    )]
    #[case::textarea(
        "<textarea name=\"foo\">foo</textarea>",
        vec![("foo", "textarea", Some("foo"))]
    )]
    #[case::input(
        "<input type=\"text\" name=\"foo\" value=\"foo\">",
        vec![("foo", "input", Some("foo"))]
    )]
    #[case::checkbox(
        "<input type=\"checkbox\" name=\"foo\" value=\"foo\" checked=\"checked\">",
        vec![("foo", "checkbox", Some("foo"))]
    )]
    #[case::unchecked_checkbox(
        "<input type=\"checkbox\" name=\"foo\" value=\"foo\">",
        vec![("foo", "checkbox", None)]
    )]
    #[case::radio(
        "<input type=\"radio\" name=\"foo\" value=\"foo\"><input type=\"radio\" name=\"foo\" value=\"bar\" checked=\"bar\">",
        vec![("foo", "radio", Some("bar"))]
    )]
    #[case::buttons(
        "<button name=\"b\">go</button><input type=\"image\" name=\"i\"><input type=\"button\" name=\"x\">",
        vec![]
    )]
    fn classifies_fields(#[case] body: &str, #[case] expected: Vec<(&str, &str, Option<&str>)>) {
        let form = form(&format!("<form>{body}</form>"));
        let expected: Vec<_> = expected
            .into_iter()
            .map(|(name, kind, value)| (name.to_string(), kind, value.map(text)))
            .collect();
        assert_eq!(summary(&form), expected);
    }

    #[test]
    fn file_inputs_hold_an_empty_descriptor() {
        let form = form("<form><input type=\"file\" name=\"foo\"></form>");
        let value = form.field("foo").unwrap().value().unwrap();
        assert_eq!(value, FieldValue::File(FileUpload::empty()));
        assert_eq!(value.as_file().unwrap().error, UPLOAD_ERR_NO_FILE);
    }

    #[test]
    fn multi_valued_fields() {
        let mut form = form(
            "<form>\
             <input type=\"text\" name=\"foo[2]\" value=\"foo\">\
             <input type=\"text\" name=\"foo[]\" value=\"foo\">\
             <input type=\"text\" name=\"bar[foo][]\" value=\"foo\">\
             <input type=\"text\" name=\"bar[foo][foobar]\" value=\"foo\">\
             </form>",
        );

        let names: Vec<_> = form.all_fields().into_keys().collect();
        assert_eq!(names, vec!["foo[2]", "foo[3]", "bar[foo][0]", "bar[foo][foobar]"]);

        form.set("foo[2]", "bar").unwrap();
        form.set("foo[3]", "bar").unwrap();
        assert_eq!(form.field("foo[3]").unwrap().value(), Some(text("bar")));

        let mut foo = IndexMap::new();
        foo.insert("0", SetValue::from("bar"));
        foo.insert("foobar", SetValue::from("foobar"));
        let mut bar = IndexMap::new();
        bar.insert("foo", SetValue::from(foo));
        form.set("bar", SetValue::from(bar)).unwrap();

        assert_eq!(form.field("bar[foo][0]").unwrap().value(), Some(text("bar")));
        assert_eq!(form.field("bar[foo][foobar]").unwrap().value(), Some(text("foobar")));
    }

    #[test]
    fn field_and_group_with_the_same_name_fail_to_assemble() {
        let err = build(
            "<form><input type=\"text\" name=\"foo[4]\" value=\"a\"><input type=\"text\" name=\"foo\" value=\"b\"></form>",
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, Error::CompoundFieldMutation("foo".to_string()));
    }

    #[test]
    fn later_fields_replace_earlier_ones_with_the_same_name() {
        let form = form(
            "<form action=\"/\">\
             <input type=\"hidden\" name=\"option\" value=\"default\">\
             <input type=\"radio\" name=\"option\" value=\"A\">\
             <input type=\"radio\" name=\"option\" value=\"B\">\
             <input type=\"hidden\" name=\"settings[1]\" value=\"0\">\
             <input type=\"checkbox\" name=\"settings[1]\" value=\"1\">\
             <button>klickme</button>\
             </form>",
        );

        let option = form.field("option").unwrap();
        assert_eq!(option.kind(), "radio");
        assert_eq!(option.as_radio().unwrap().available_values(), vec!["A", "B"]);
        assert_eq!(form.field("settings[1]").unwrap().kind(), "checkbox");
    }

    #[rstest]
    #[case("<form></form>", None, "GET")]
    #[case("<form method=\"post\"></form>", None, "POST")]
    #[case("<form method=\"post\"></form>", Some("put"), "PUT")]
    #[case("<form method=\"post\"></form>", Some("delete"), "DELETE")]
    #[case("<form method=\"post\"></form>", Some("patch"), "PATCH")]
    fn method_resolution(
        #[case] markup: &str,
        #[case] method: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(build(markup, method, None).unwrap().method(), expected);
    }

    #[test]
    fn files_require_a_body_method() {
        let markup = "<form method=\"post\"><input type=\"file\" name=\"foo[bar]\"><input type=\"text\" name=\"bar\" value=\"bar\"></form>";

        assert!(build(markup, Some("get"), None).unwrap().files().is_empty());
        for method in ["post", "put", "delete", "patch"] {
            let files = build(markup, Some(method), None).unwrap().files();
            assert_eq!(files.len(), 1);
            assert_eq!(files["foo[bar]"], FileUpload::empty());
        }

        let disabled = form(
            "<form method=\"post\"><input type=\"file\" name=\"foo[bar]\" disabled></form>",
        );
        assert!(disabled.files().is_empty());
    }

    #[test]
    fn php_files_are_nested() {
        let form = form(
            "<form method=\"post\">\
             <input type=\"file\" name=\"f.o o[bar][ba.z]\">\
             <input type=\"file\" name=\"f.o o[bar][]\">\
             <input type=\"text\" name=\"bar\" value=\"bar\">\
             </form>",
        );

        let files = form.php_files();
        let bar = files["f.o o"].get("bar").unwrap();
        assert_eq!(bar.get("ba.z"), Some(&NestedValue::File(FileUpload::empty())));
        assert_eq!(bar.get("0"), Some(&NestedValue::File(FileUpload::empty())));
        assert!(!files.contains_key("bar"));
    }

    #[rstest]
    #[case::plain("<form action=\"/foo\"></form>", None, vec![], "/foo")]
    #[case::appends_values(
        "<form action=\"/foo\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        None, vec![], "/foo?foo=foo"
    )]
    #[case::merges_submitted_values(
        "<form action=\"/foo\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        None, vec![("foo", "bar")], "/foo?foo=bar"
    )]
    #[case::post_keeps_action(
        "<form action=\"/foo\" method=\"post\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        None, vec![], "/foo"
    )]
    #[case::put_keeps_action(
        "<form action=\"/foo\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        Some("PUT"), vec![], "/foo"
    )]
    #[case::delete_keeps_action(
        "<form action=\"/foo\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        Some("DELETE"), vec![], "/foo"
    )]
    #[case::patch_keeps_action(
        "<form action=\"/foo\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        Some("PATCH"), vec![], "/foo"
    )]
    #[case::existing_query(
        "<form action=\"/foo?bar=bar\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        None, vec![], "/foo?bar=bar&foo=foo"
    )]
    #[case::replaces_query_pair(
        "<form action=\"/foo?bar=bar\"><input type=\"text\" name=\"bar\" value=\"foo\"></form>",
        None, vec![], "/foo?bar=foo"
    )]
    #[case::list_replaces_whole_query_array(
        "<form action=\"/f?multi[0]=a&amp;multi[1]=b&amp;keep=1\"><select multiple name=\"multi\">\
         <option>a</option><option selected>x</option></select></form>",
        None, vec![], "/f?multi%5B0%5D=x&keep=1"
    )]
    #[case::scalar_replaces_query_array(
        "<form action=\"/f?a[b]=1&amp;a[c]=2\"><input type=\"text\" name=\"a\" value=\"x\"></form>",
        None, vec![], "/f?a=x"
    )]
    #[case::empty_action("<form></form>", None, vec![], "/")]
    #[case::empty_action_with_values(
        "<form><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        None, vec![], "/?foo=foo"
    )]
    #[case::sharp_action(
        "<form action=\"#\" method=\"post\"><input type=\"text\" name=\"foo\" value=\"foo\"></form>",
        None, vec![], "/#"
    )]
    #[case::encodes_brackets_and_spaces(
        "<form action=\"/s\"><input type=\"text\" name=\"q[term]\" value=\"a b&c\"></form>",
        None, vec![], "/s?q%5Bterm%5D=a+b%26c"
    )]
    fn submission_uri(
        #[case] markup: &str,
        #[case] method: Option<&str>,
        #[case] values: Vec<(&str, &str)>,
        #[case] expected: &str,
    ) {
        let mut form = build(markup, method, None).unwrap();
        form.set_values(values).unwrap();
        assert_eq!(form.uri(), format!("http://example.com{expected}"));
    }

    #[test]
    fn uri_resolution_edge_cases() {
        let anchor = build(
            "<form action=\"#foo\"></form>",
            None,
            Some("http://example.com/id/123"),
        )
        .unwrap();
        assert_eq!(anchor.uri(), "http://example.com/id/123#foo");

        let relative = build(
            "<form action=\"foo\"></form>",
            None,
            Some("http://localhost/foo/"),
        )
        .unwrap();
        assert_eq!(relative.uri(), "http://localhost/foo/foo");

        let absolute_path = build(
            "<form action=\"/foo\"></form>",
            None,
            Some("http://localhost/foo/"),
        )
        .unwrap();
        assert_eq!(absolute_path.uri(), "http://localhost/foo");

        let query_only = build(
            "<form action=\"?get=param\"></form>",
            None,
            Some("http://localhost/foo/bar"),
        )
        .unwrap();
        assert_eq!(query_only.uri(), "http://localhost/foo/bar?get=param");

        let no_action = build("<form></form>", None, Some("http://localhost/foo/bar")).unwrap();
        assert_eq!(no_action.uri(), "http://localhost/foo/bar");
    }

    #[rstest]
    #[case("https://login.foo.com")]
    #[case("https://login.foo.com/bar/")]
    #[case("https://www.foo.com")]
    #[case("https://www.foo.com/bar/")]
    fn absolute_action_ignores_current_uri(#[case] current_uri: &str) {
        let form = build(
            "<form action=\"https://login.foo.com/login.php?login_attempt=1\" method=\"POST\">\
             <input type=\"text\" name=\"foo\" value=\"foo\"></form>",
            None,
            Some(current_uri),
        )
        .unwrap();
        assert_eq!(form.uri(), "https://login.foo.com/login.php?login_attempt=1");
    }

    #[test]
    fn multiple_select_values_are_indexed_in_the_query() {
        let mut form = form(
            "<form action=\"/f\"><select multiple name=\"multi[]\">\
             <option>foo</option><option>bar</option></select></form>",
        );
        form.set("multi", vec!["foo", "bar"]).unwrap();
        assert_eq!(form.uri(), "http://example.com/f?multi%5B0%5D=foo&multi%5B1%5D=bar");
    }

    #[test]
    fn duplicated_query_keys_collapse_on_replacement() {
        let form = form("<form action=\"/f?a=1&b=2&a=3\"><input name=\"a\" value=\"x\"></form>");
        assert_eq!(form.uri(), "http://example.com/f?a=x&b=2");
    }

    #[test]
    fn base_href_applies_to_non_empty_actions_only() {
        let html = Html::parse_document(
            "<form id=\"a\" action=\"foo.php\"></form><form id=\"b\"></form>",
        );
        let pick = |id: &str| {
            let selector = Selector::parse(&format!("form#{id}")).unwrap();
            html.select(&selector).next().unwrap()
        };

        let with_action = Form::with_base_href(
            pick("a"),
            "http://www.foo.com/bar/",
            None,
            Some("http://cdn.foo.com/"),
        )
        .unwrap();
        assert_eq!(with_action.uri(), "http://cdn.foo.com/foo.php");

        let without_action = Form::with_base_href(
            pick("b"),
            "http://www.foo.com/bar/",
            None,
            Some("http://cdn.foo.com/"),
        )
        .unwrap();
        assert_eq!(without_action.uri(), "http://www.foo.com/bar/");

        let err = Form::with_base_href(
            pick("a"),
            "http://www.foo.com/",
            None,
            Some("cdn"),
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidCurrentUri("cdn".to_string()));
    }

    #[test]
    fn field_access() {
        let mut form = form(
            "<form method=\"post\"><input type=\"text\" name=\"bar\" value=\"bar\"></form>",
        );

        assert!(!form.has_field("foo"));
        assert!(form.has_field("bar"));
        assert_eq!(form.field("bar").unwrap().kind(), "input");
        assert_eq!(form.field("foo").unwrap_err(), Error::UnreachableField("foo".to_string()));
        assert_eq!(form.all_fields().len(), 1);

        form.field_mut("bar").unwrap().set("baz").unwrap();
        assert_eq!(form.values()["bar"], text("baz"));

        assert!(form.set("foobar", "bar").is_err());

        form.add_field(InputField::new("extra", "1")).unwrap();
        assert!(form.has_field("extra"));

        form.remove_field("bar").unwrap();
        assert!(!form.has_field("bar"));
    }

    #[test]
    fn malformed_names_are_refused() {
        let mut form = form(
            "<form><input name=\"foo[bar]\" value=\"bar\"><input name=\"foo[baz]\" value=\"baz\"></form>",
        );
        assert_eq!(
            form.set("foo[bar", "bar"),
            Err(Error::MalformedFieldName("foo[bar".to_string()))
        );
    }

    #[test]
    fn values_skip_disabled_unchecked_file_and_empty_multiple_fields() {
        let cases = [
            "<form><input name=\"foo[bar]\" value=\"foo\"><input name=\"bar\" value=\"bar\"><select multiple name=\"baz[]\"></select></form>",
            "<form><input type=\"checkbox\" name=\"foo\" value=\"foo\"><input name=\"bar\" value=\"bar\"></form>",
            "<form><input type=\"file\" name=\"foo\"><input name=\"bar\" value=\"bar\"></form>",
            "<form><input name=\"foo\" value=\"foo\" disabled><input name=\"bar\" value=\"bar\"></form>",
        ];

        let values = form(cases[0]).values();
        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["foo[bar]", "bar"]);

        for markup in &cases[1..] {
            let values = form(markup).values();
            assert_eq!(values.len(), 1, "{markup}");
            assert_eq!(values["bar"], text("bar"));
        }
    }

    #[test]
    fn set_values_drives_checkboxes_and_inputs() {
        let mut form = form(
            "<form><input type=\"checkbox\" name=\"foo\" value=\"foo\" checked><input name=\"bar\" value=\"bar\"></form>",
        );
        form.set_values([("foo", SetValue::from(false)), ("bar", SetValue::from("foo"))])
            .unwrap();

        let values = form.values();
        assert_eq!(values.len(), 1);
        assert_eq!(values["bar"], text("foo"));
    }

    #[test]
    fn fill_sets_multiple_select() {
        let mut form = form(
            "<form><select multiple name=\"multi\"><option value=\"foo\">foo</option><option value=\"bar\">bar</option></select></form>",
        );
        form.fill([("multi", vec!["foo", "bar"])]).unwrap();
        assert_eq!(
            form.values()["multi"],
            FieldValue::Multiple(vec!["foo".to_string(), "bar".to_string()])
        );
    }

    #[test]
    fn php_values_are_nested() {
        let form1 = form(
            "<form><input name=\"foo[bar]\" value=\"foo\"><input name=\"bar\" value=\"bar\"></form>",
        );
        let values = form1.php_values();
        assert_eq!(values["foo"].get("bar").and_then(NestedValue::as_text), Some("foo"));
        assert_eq!(values["bar"].as_text(), Some("bar"));

        let form2 = form(
            "<form><input name=\"fo.o[ba.r]\" value=\"foo\"><input name=\"ba r\" value=\"bar\"></form>",
        );
        let values = form2.php_values();
        assert_eq!(values["fo.o"].get("ba.r").and_then(NestedValue::as_text), Some("foo"));
        assert_eq!(values["ba r"].as_text(), Some("bar"));

        let form3 = form(
            "<form><input name=\"fo.o[ba.r][]\" value=\"foo\"><input name=\"fo.o[ba.r][ba.z]\" value=\"bar\"></form>",
        );
        let values = form3.php_values();
        let inner = values["fo.o"].get("ba.r").unwrap();
        assert_eq!(inner.get("0").and_then(NestedValue::as_text), Some("foo"));
        assert_eq!(inner.get("ba.z").and_then(NestedValue::as_text), Some("bar"));
    }

    #[test]
    fn empty_textarea_survives_expansion() {
        let form = form("<form><textarea name=\"example\"></textarea></form>");
        assert_eq!(form.php_values()["example"].as_text(), Some(""));
    }

    #[test]
    fn empty_multiple_select_disappears_from_php_values() {
        let mut form = form(
            "<form><select multiple name=\"tags\"><option>a</option></select><input name=\"q\" value=\"x\"></form>",
        );
        form.set("tags", Vec::<String>::new()).unwrap();
        assert!(form.values().contains_key("tags"));
        assert!(!form.php_values().contains_key("tags"));
    }

    #[test]
    fn disable_validation_reaches_every_choice_field() {
        let mut form = form(
            "<form>\
             <select name=\"foo[bar]\"><option value=\"bar\">bar</option></select>\
             <select name=\"foo[baz]\"><option value=\"foo\">foo</option></select>\
             </form>",
        );
        assert!(form.field_mut("foo[bar]").unwrap().select("foo").is_err());

        form.disable_validation();
        form.field_mut("foo[bar]").unwrap().select("foo").unwrap();
        form.field_mut("foo[baz]").unwrap().select("bar").unwrap();
        assert_eq!(form.field("foo[bar]").unwrap().value(), Some(text("foo")));
        assert_eq!(form.field("foo[baz]").unwrap().value(), Some(text("bar")));
    }

    #[test]
    fn submission_bundles_everything() {
        let mut form = form(
            "<form action=\"/upload\" method=\"post\"><input name=\"a[b]\" value=\"1\"><input type=\"file\" name=\"doc\"></form>",
        );
        form.field_mut("doc")
            .unwrap()
            .as_file_mut()
            .unwrap()
            .upload("/tmp/report.pdf");

        let submission = form.submission();
        assert_eq!(submission.method, "POST");
        assert_eq!(submission.uri, "http://example.com/upload");
        assert_eq!(submission.values["a"].get("b").and_then(NestedValue::as_text), Some("1"));

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["files"]["doc"]["name"], "report.pdf");
        assert_eq!(json["files"]["doc"]["error"], 0);
    }
}
