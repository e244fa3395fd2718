//! String-level href resolution, mirroring what a browser does when a link
//! or a form action is followed from a page.

use crate::error::{Error, Result};

const ACCEPTED_SCHEMES: &[&str] = &["http:", "https:", "file:"];

/// Check that `uri` can serve as the base of a resolution.
///
/// The empty string is accepted (a document without a known location);
/// anything else must be an absolute `http`, `https` or `file` URI.
pub fn validate_current_uri(uri: &str) -> Result<()> {
    if uri.is_empty() {
        return Ok(());
    }
    let lower = uri.to_ascii_lowercase();
    if ACCEPTED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        Ok(())
    } else {
        Err(Error::InvalidCurrentUri(uri.to_string()))
    }
}

/// Resolve a raw `href` against the URI of the page it appears on.
///
/// The algorithm works on plain strings and never normalizes the current URI
/// beyond what a given reference kind requires:
///
/// ```text
/// resolve("/foo", "http://localhost/bar/foo/")     = "http://localhost/foo"
/// resolve("foo", "http://localhost/bar/foo/")      = "http://localhost/bar/foo/foo"
/// resolve("?a=b", "http://localhost/bar#foo")      = "http://localhost/bar?a=b"
/// resolve("//x.com/a", "https://localhost/")       = "https://x.com/a"
/// ```
pub fn resolve(raw_href: &str, current_uri: &str) -> String {
    let href = raw_href.trim();

    if has_scheme(href) {
        return href.to_string();
    }

    if href.is_empty() {
        return current_uri.to_string();
    }

    if href.starts_with('#') {
        return format!("{}{href}", strip_fragment(current_uri));
    }

    let base_uri = strip_query(strip_fragment(current_uri));

    if href.starts_with('?') {
        return format!("{base_uri}{href}");
    }

    if href.starts_with("//") {
        return format!("{}{href}", scheme_prefix(base_uri));
    }

    let authority = authority_prefix(base_uri);

    if href.starts_with('/') {
        return format!("{authority}{href}");
    }

    // Relative path: replace the last segment of the current path.
    let path = path_component(&current_uri[authority.len()..]);
    let directory = path.rfind('/').map_or("", |pos| &path[..pos]);
    let canonical = canonicalize_path(&format!("{directory}/{href}"));
    let canonical = canonical.strip_prefix('/').unwrap_or(&canonical);

    format!("{authority}/{canonical}")
}

/// `scheme ":"` per the generic URI grammar: an ASCII letter followed by
/// letters, digits, `+`, `-` or `.`.
fn has_scheme(href: &str) -> bool {
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn strip_fragment(uri: &str) -> &str {
    uri.find('#').map_or(uri, |pos| &uri[..pos])
}

fn strip_query(uri: &str) -> &str {
    uri.find('?').map_or(uri, |pos| &uri[..pos])
}

/// Everything before the first `//`, provided no single slash precedes it
/// (`"http:"` for `"http://host/path"`). Left untouched otherwise.
fn scheme_prefix(uri: &str) -> &str {
    match uri.find("//") {
        Some(pos) if !uri[..pos].contains('/') => &uri[..pos],
        _ => uri,
    }
}

/// Scheme and authority: everything up to the first `/` following `//`.
fn authority_prefix(uri: &str) -> &str {
    let Some(pos) = uri.find("//") else {
        return uri;
    };
    let host_start = pos + 2;
    match uri[host_start..].find('/') {
        Some(slash) => &uri[..host_start + slash],
        None => uri,
    }
}

/// Path part of a URI tail that starts right after the authority.
fn path_component(tail: &str) -> &str {
    tail.find(['?', '#']).map_or(tail, |pos| &tail[..pos])
}

/// Remove `.` and `..` segments (RFC 3986, section 5.2.4).
///
/// Popping past the root is a silent no-op.
fn canonicalize_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return path.to_string();
    }

    let mut path = path.to_string();
    if path.ends_with('.') {
        path.push('/');
    }

    let mut output: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            ".." => {
                output.pop();
            }
            "." => {}
            other => output.push(other),
        }
    }

    output.join("/")
}
