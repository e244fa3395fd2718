use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::{Field, FormField};
use crate::path;
use crate::value::SetValue;

/// A path in the registry leads either to a field or to a group of children.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Field(FormField),
    Group(IndexMap<String, Node>),
}

/// Fields indexed by their bracket-notation path, in insertion order.
///
/// `foo[]`, `foo[]`, `bar[5]`, `bar[]`, `bar[baz]` are stored as
///
/// ```text
/// foo: { 0: field, 1: field }
/// bar: { 5: field, 6: field, baz: field }
/// ```
///
/// A path holds either a field or a group, never both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRegistry {
    fields: IndexMap<String, Node>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field under its own name. Empty segments (`foo[]`) receive the
    /// next free index of their level.
    ///
    /// A field with the same path replaces the previous one in place.
    pub fn add(&mut self, field: impl Into<FormField>) -> Result<()> {
        let field = field.into();
        let name = field.name().to_string();
        let segments = path::parse(&name)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(Error::MalformedFieldName(name));
        };

        let mut target = &mut self.fields;
        for segment in parents {
            let key = resolve_key(target, segment)
                .ok_or_else(|| Error::MalformedFieldName(name.clone()))?;
            let node = target
                .entry(key)
                .or_insert_with(|| Node::Group(IndexMap::new()));
            target = match node {
                Node::Group(children) => children,
                Node::Field(_) => return Err(Error::CompoundFieldMutation(name)),
            };
        }

        let key = resolve_key(target, last)
            .ok_or_else(|| Error::MalformedFieldName(name.clone()))?;
        if let Some(Node::Group(_)) = target.get(&key) {
            return Err(Error::CompoundFieldMutation(name));
        }

        debug!(name = %name, key = %key, kind = field.kind(), "registering field");
        target.insert(key, Node::Field(field));
        Ok(())
    }

    /// Remove a field or a whole group. Unknown paths are ignored.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let segments = path::parse(name)?;
        let Some((last, parents)) = segments.split_last() else {
            return Ok(());
        };

        let mut target = &mut self.fields;
        for segment in parents {
            match target.get_mut(segment.as_str()) {
                Some(Node::Group(children)) => target = children,
                _ => return Ok(()),
            }
        }

        target.shift_remove(last.as_str());
        Ok(())
    }

    /// The field registered under a fully qualified name.
    pub fn get(&self, name: &str) -> Result<&FormField> {
        match self.lookup(name)? {
            Node::Field(field) => Ok(field),
            Node::Group(_) => Err(Error::CompoundField(name.to_string())),
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut FormField> {
        match self.lookup_mut(name)? {
            Node::Field(field) => Ok(field),
            Node::Group(_) => Err(Error::CompoundField(name.to_string())),
        }
    }

    /// Whether `name` leads to a field or a group. Malformed names are simply absent.
    pub fn has(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Assign a value to a field, or spread a list/map over a group.
    ///
    /// Select boxes take lists directly. Other compound values are split into
    /// `name[key]` assignments; a scalar aimed at a group is refused.
    pub fn set(&mut self, name: &str, value: SetValue) -> Result<()> {
        match self.lookup_mut(name)? {
            Node::Field(field) if matches!(field, FormField::Select(_)) || !value.is_compound() => {
                field.set_value(value)
            }
            _ if value.is_compound() => {
                for (key, item) in value.into_entries() {
                    self.set(&path::join(name, &key), item)?;
                }
                Ok(())
            }
            _ => Err(Error::CompoundFieldMutation(name.to_string())),
        }
    }

    /// Every field keyed by its fully qualified name, depth first, in insertion order.
    pub fn all(&self) -> IndexMap<String, &FormField> {
        let mut output = IndexMap::new();
        walk(&self.fields, "", &mut output);
        output
    }

    /// Mutable access to every field, in the same order as [`FieldRegistry::all`].
    pub fn fields_mut(&mut self) -> Vec<&mut FormField> {
        let mut output = Vec::new();
        collect_mut(&mut self.fields, &mut output);
        output
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&Node> {
        let segments = path::parse(name)?;
        let mut children = Some(&self.fields);
        let mut found = None;

        for segment in &segments {
            let node = children
                .and_then(|c| c.get(segment.as_str()))
                .ok_or_else(|| Error::UnreachableField(segment.clone()))?;
            children = match node {
                Node::Group(c) => Some(c),
                Node::Field(_) => None,
            };
            found = Some(node);
        }

        found.ok_or_else(|| Error::MalformedFieldName(name.to_string()))
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Node> {
        let segments = path::parse(name)?;
        let Some((first, rest)) = segments.split_first() else {
            return Err(Error::MalformedFieldName(name.to_string()));
        };

        let mut node = self
            .fields
            .get_mut(first.as_str())
            .ok_or_else(|| Error::UnreachableField(first.clone()))?;

        for segment in rest {
            node = match node {
                Node::Group(children) => children.get_mut(segment.as_str()),
                Node::Field(_) => None,
            }
            .ok_or_else(|| Error::UnreachableField(segment.clone()))?;
        }

        Ok(node)
    }
}

/// `segment`, or the next free index of `level` when the segment is empty.
/// `None` once the largest index leaves no room for another one.
fn resolve_key(level: &IndexMap<String, Node>, segment: &str) -> Option<String> {
    if !segment.is_empty() {
        return Some(segment.to_string());
    }
    let next = match level.keys().filter_map(|key| as_index(key)).max() {
        Some(max) => max.checked_add(1)?,
        None => 0,
    };
    Some(next.to_string())
}

/// Canonical non-negative integer keys only: `"7"` counts, `"07"` does not.
fn as_index(key: &str) -> Option<u64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}

fn walk<'a>(
    level: &'a IndexMap<String, Node>,
    base: &str,
    output: &mut IndexMap<String, &'a FormField>,
) {
    for (key, node) in level {
        let name = path::join(base, key);
        match node {
            Node::Field(field) => {
                output.insert(name, field);
            }
            Node::Group(children) => walk(children, &name, output),
        }
    }
}

fn collect_mut<'a>(level: &'a mut IndexMap<String, Node>, output: &mut Vec<&'a mut FormField>) {
    for node in level.values_mut() {
        match node {
            Node::Field(field) => output.push(field),
            Node::Group(children) => collect_mut(children, output),
        }
    }
}
