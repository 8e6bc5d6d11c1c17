//! SCIM 2.0 Filter Evaluation
//!
//! Identity providers only need equality lookups during their initial sync
//! (`userName eq "alice@example.com"`, `externalId eq "..."`,
//! `displayName eq "Engineering"`), so this module supports exactly one
//! expression shape:
//!
//! ```text
//! filter = ATTRNAME SP "eq" SP DQUOTE value DQUOTE
//! ```
//!
//! Parsing is lenient: anything that does not have this shape yields no
//! filter at all and the full collection is returned. A well-formed filter on
//! an attribute the resource type does not expose matches nothing.

use super::types::{ScimGroup, ScimUser};

/// A parsed `attr eq "value"` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqFilter {
    /// Attribute name, compared exactly (e.g. "userName")
    pub attr: String,
    /// Value with the surrounding quotes removed
    pub value: String,
}

impl EqFilter {
    /// Whether `resource` satisfies this filter.
    pub fn matches<R: Filterable>(&self, resource: &R) -> bool {
        resource
            .filter_attr(&self.attr)
            .is_some_and(|v| v == self.value)
    }
}

/// Resources that expose string attributes to filter expressions.
pub trait Filterable {
    /// Value of the named attribute, or `None` if the attribute is unknown
    /// for this resource type or unset on this resource.
    fn filter_attr(&self, attr: &str) -> Option<&str>;
}

impl Filterable for ScimUser {
    fn filter_attr(&self, attr: &str) -> Option<&str> {
        match attr {
            "userName" => Some(&self.user_name),
            "externalId" => self.external_id.as_deref(),
            _ => None,
        }
    }
}

impl Filterable for ScimGroup {
    fn filter_attr(&self, attr: &str) -> Option<&str> {
        match attr {
            "displayName" => Some(&self.display_name),
            _ => None,
        }
    }
}

/// Parse a filter expression.
///
/// Returns `None` when the input is not of the supported shape.
pub fn parse_filter(input: &str) -> Option<EqFilter> {
    let input = input.trim();

    let (attr, rest) = input.split_once(char::is_whitespace)?;
    let (op, value) = rest.trim_start().split_once(char::is_whitespace)?;
    if op != "eq" {
        return None;
    }

    let value = value.trim_start();
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    if inner.contains('"') {
        return None;
    }

    Some(EqFilter {
        attr: attr.to_string(),
        value: inner.to_string(),
    })
}

/// Apply an optional raw filter string to a collection.
///
/// A missing or unparseable filter returns the collection unchanged.
pub fn apply_filter<R: Filterable>(resources: Vec<R>, filter: Option<&str>) -> Vec<R> {
    match filter.and_then(parse_filter) {
        Some(filter) => resources
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect(),
        None => resources,
    }
}

// =============================================================================
// Tests
// =============================================================================
