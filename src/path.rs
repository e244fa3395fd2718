//! Bracket-notation field names: `base[key][key2]`.

use crate::error::{Error, Result};

/// Split a field name into its path segments the way a browser submits it.
///
/// ```text
/// parse("base[foo][3][]") = ["base", "foo", "3", ""]
/// ```
///
/// An empty segment stands for "next free index" and is only resolved when the
/// field is inserted into a registry. Names without a base segment or with an
/// unterminated bracket are rejected.
pub fn parse(name: &str) -> Result<Vec<String>> {
    let malformed = || Error::MalformedFieldName(name.to_string());

    let base_end = name.find('[').unwrap_or(name.len());
    if base_end == 0 {
        return Err(malformed());
    }

    let mut segments = vec![name[..base_end].to_string()];
    let mut rest = &name[base_end..];

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }

    Ok(segments)
}

/// Build the fully qualified name of `key` below `base`.
pub fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}[{key}]")
    }
}
