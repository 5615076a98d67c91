//! Query parameters.
//!
//! [`RawParams`] is the query string with bracketed keys nested one level
//! (`fields[books]=title` becomes group `fields` with member `books`).
//! [`Parameters`] is the validated, typed form produced by the parameter
//! resolver: sparse fieldsets, an [`IncludeTree`] and an optional
//! [`Pagination`].

use crate::pagination::{PageParams, Pagination};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// One raw query value: either `key=value` or a `key[member]=value` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A plain value.
    Single(String),
    /// A bracketed group.
    Group(IndexMap<String, String>),
}

/// Raw query parameters with one level of bracket nesting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: IndexMap<String, RawValue>,
}

impl RawParams {
    /// Creates empty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an url-encoded query string (without the leading `?`).
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        Ok(Self::from_pairs(pairs))
    }

    /// Nests decoded `(key, value)` pairs. When a key repeats, the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            match split_bracketed(&key) {
                Some((group, member)) => params.insert_member(group, member, value),
                None => {
                    params.values.insert(key, RawValue::Single(value));
                }
            }
        }
        params
    }

    fn insert_member(&mut self, group: &str, member: &str, value: String) {
        let entry = self
            .values
            .entry(group.to_string())
            .or_insert_with(|| RawValue::Group(IndexMap::new()));
        match entry {
            RawValue::Group(members) => {
                members.insert(member.to_string(), value);
            }
            RawValue::Single(_) => {
                *entry = RawValue::Group(IndexMap::from([(member.to_string(), value)]));
            }
        }
    }

    /// Returns the value for a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterates over the top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns a copy with `key` replaced by a group.
    #[must_use]
    pub fn with_group(&self, key: &str, members: PageParams) -> Self {
        let mut values = self.values.clone();
        values.insert(key.to_string(), RawValue::Group(members));
        Self { values }
    }

    /// Flattens back into `(key, value)` pairs, writing groups as `key[member]`.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .flat_map(|(key, value)| match value {
                RawValue::Single(single) => vec![(key.clone(), single.clone())],
                RawValue::Group(members) => members
                    .iter()
                    .map(|(member, v)| (format!("{key}[{member}]"), v.clone()))
                    .collect(),
            })
            .collect()
    }

    /// Encodes the parameters as a query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self.to_pairs()).unwrap_or_default()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Splits `group[member]` into its parts. Keys with no brackets, nested
/// brackets or trailing characters are not groups.
fn split_bracketed(key: &str) -> Option<(&str, &str)> {
    let (group, rest) = key.split_once('[')?;
    let member = rest.strip_suffix(']')?;
    if group.is_empty() || member.contains(['[', ']']) {
        return None;
    }
    Some((group, member))
}

/// A tree of relationship names to include.
///
/// `include=books,books.series` becomes `{books: {series: {}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeTree {
    children: IndexMap<String, IncludeTree>,
}

impl IncludeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a path, creating intermediate nodes.
    pub fn insert_path<'a>(&mut self, segments: impl IntoIterator<Item = &'a str>) {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }

    /// Returns the subtree under a relationship name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IncludeTree> {
        self.children.get(name)
    }

    /// Iterates over the direct children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &IncludeTree)> {
        self.children.iter().map(|(name, tree)| (name.as_str(), tree))
    }

    /// Returns `true` if nothing is included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if the dotted path (or one extending it) is in the tree.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        let mut node = self;
        for segment in path.split('.') {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }

    /// All dotted paths in the tree, ancestors first.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, child) in &self.children {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            out.push(path.clone());
            child.collect_paths(&path, out);
        }
    }
}

/// Validated request parameters for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    type_name: String,
    fields: HashMap<String, IndexSet<String>>,
    include: IncludeTree,
    pagination: Option<Pagination>,
    raw: RawParams,
}

impl Parameters {
    /// Creates parameters with no fieldsets, includes or pagination.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Sets the sparse fieldset of one type.
    #[must_use]
    pub fn with_fields<I, S>(mut self, type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(type_name.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the include tree.
    #[must_use]
    pub fn with_include(mut self, include: IncludeTree) -> Self {
        self.include = include;
        self
    }

    /// Sets the pagination window.
    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Keeps the raw parameters for link building.
    #[must_use]
    pub fn with_raw(mut self, raw: RawParams) -> Self {
        self.raw = raw;
        self
    }

    /// The root resource type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The sparse fieldset of a type, if one was requested.
    #[must_use]
    pub fn fields(&self, type_name: &str) -> Option<&IndexSet<String>> {
        self.fields.get(type_name)
    }

    /// Returns `true` if `field` of `type_name` should be serialized.
    #[must_use]
    pub fn allows_field(&self, type_name: &str, field: &str) -> bool {
        self.fields
            .get(type_name)
            .map_or(true, |fields| fields.contains(field))
    }

    /// The include tree.
    #[must_use]
    pub const fn include(&self) -> &IncludeTree {
        &self.include
    }

    /// The pagination window, if any.
    #[must_use]
    pub const fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// The raw parameters.
    #[must_use]
    pub const fn raw(&self) -> &RawParams {
        &self.raw
    }
}
