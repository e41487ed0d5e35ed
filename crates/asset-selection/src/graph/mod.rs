//! The graph provider interface selections resolve against.
//!
//! Resolution only reads from the graph. Implementations are expected to be
//! static snapshots for the duration of a [`resolve`] call.
//!
//! [`resolve`]: crate::selection::AssetSelection::resolve

mod in_memory;

pub use in_memory::{AssetRecord, ColumnRecord, InMemoryAssetGraph};

use std::collections::BTreeSet;

use crate::key::AssetKey;
use crate::selection::Attribute;

/// Group name that `group:<null>` treats the same as having no group.
pub const DEFAULT_GROUP_NAME: &str = "default";

/// Value of `changed_in_branch` that matches any change reason.
pub const ANY_CHANGE_REASON: &str = "any";

/// What an asset carries for one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Single-valued attributes (tag, group, status, ...)
    Single(String),
    /// Multi-valued attributes (owners, kinds, columns, ...)
    Multiple(BTreeSet<String>),
}

impl AttributeValue {
    /// Whether `value` is (one of) the asset's values.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(actual) => actual == value,
            Self::Multiple(actual) => actual.contains(value),
        }
    }

    /// Whether the asset effectively carries no value.
    ///
    /// An empty string is a value; an empty set is not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Multiple(actual) => actual.is_empty(),
        }
    }
}

/// Read-only view of an asset dependency graph.
///
/// Edges run from a dependency to its dependents: if `b` depends on `a`, then
/// `a` is in `direct_upstream(b)` and `b` is in `direct_downstream(a)`.
pub trait AssetGraph {
    /// Every asset key in the graph.
    fn keys(&self) -> BTreeSet<AssetKey>;

    /// Assets `key` directly depends on.
    fn direct_upstream(&self, key: &AssetKey) -> BTreeSet<AssetKey>;

    /// Assets that directly depend on `key`.
    fn direct_downstream(&self, key: &AssetKey) -> BTreeSet<AssetKey>;

    /// The asset's value for `attribute`, or `None` when it has none.
    fn attribute(&self, key: &AssetKey, attribute: &Attribute) -> Option<AttributeValue>;

    /// Whether the asset is a source (observable, not materialized here).
    fn is_source(&self, key: &AssetKey) -> bool;
}
