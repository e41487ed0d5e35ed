//! In-memory asset graph using HashMap and petgraph.
//!
//! # Graph Representation
//!
//! The dependency graph uses petgraph's `DiGraph` with edges directed from
//! **dependent to dependency**: if `b` depends on `a`, the edge is `b -> a`.
//!
//! - Upstream (ancestors) = outgoing neighbors
//! - Downstream (descendants) = incoming neighbors
//!
//! Cycles are accepted; resolution treats visited assets as a hard stop.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{AssetGraph, AttributeValue};
use crate::error::GraphError;
use crate::key::AssetKey;
use crate::selection::Attribute;

/// One asset in a graph snapshot, with its dependencies and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetRecord {
    /// The asset's key
    pub key: AssetKey,

    /// Keys of assets this asset depends on
    #[serde(default)]
    pub deps: Vec<AssetKey>,

    /// Asset tags; key-only tags have an empty value
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Owners (users or teams)
    #[serde(default)]
    pub owners: BTreeSet<String>,

    /// Group name (optional)
    #[serde(default)]
    pub group: Option<String>,

    /// Compute kinds
    #[serde(default)]
    pub kinds: BTreeSet<String>,

    /// Code location defining the asset (optional)
    #[serde(default)]
    pub code_location: Option<String>,

    /// Health status (optional)
    #[serde(default)]
    pub status: Option<String>,

    /// Columns of the asset's schema
    #[serde(default)]
    pub columns: Vec<ColumnRecord>,

    /// Table name (optional)
    #[serde(default)]
    pub table_name: Option<String>,

    /// Reasons the asset changed in the current branch
    #[serde(default)]
    pub changed_in_branch: BTreeSet<String>,

    /// Whether this is a source asset
    #[serde(default)]
    pub is_source: bool,
}

/// A column in an asset's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnRecord {
    /// Column name
    pub name: String,

    /// Column tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl AssetRecord {
    /// Create a record with no dependencies or metadata.
    pub fn new(key: impl Into<AssetKey>) -> Self {
        Self {
            key: key.into(),
            deps: Vec::new(),
            tags: BTreeMap::new(),
            owners: BTreeSet::new(),
            group: None,
            kinds: BTreeSet::new(),
            code_location: None,
            status: None,
            columns: Vec::new(),
            table_name: None,
            changed_in_branch: BTreeSet::new(),
            is_source: false,
        }
    }

    /// Add dependencies.
    #[must_use]
    pub fn with_deps<I, K>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<AssetKey>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Add an owner.
    #[must_use]
    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owners.insert(owner.to_string());
        self
    }

    /// Set the group.
    #[must_use]
    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    /// Add a compute kind.
    #[must_use]
    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kinds.insert(kind.to_string());
        self
    }

    /// Set the code location.
    #[must_use]
    pub fn with_code_location(mut self, location: &str) -> Self {
        self.code_location = Some(location.to_string());
        self
    }

    /// Set the health status.
    #[must_use]
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    /// Add a column with tags.
    #[must_use]
    pub fn with_column(mut self, name: &str, tags: &[(&str, &str)]) -> Self {
        self.columns.push(ColumnRecord {
            name: name.to_string(),
            tags: tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
        self
    }

    /// Set the table name.
    #[must_use]
    pub fn with_table_name(mut self, table: &str) -> Self {
        self.table_name = Some(table.to_string());
        self
    }

    /// Record a reason the asset changed in the branch.
    #[must_use]
    pub fn with_change(mut self, reason: &str) -> Self {
        self.changed_in_branch.insert(reason.to_string());
        self
    }

    /// Mark the asset as a source.
    #[must_use]
    pub fn source(mut self) -> Self {
        self.is_source = true;
        self
    }

    fn attribute(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute {
            Attribute::Tag(name) => self.tags.get(name).cloned().map(AttributeValue::Single),
            Attribute::Owner => multiple(self.owners.iter().cloned()),
            Attribute::Group => self.group.clone().map(AttributeValue::Single),
            Attribute::Kind => multiple(self.kinds.iter().cloned()),
            Attribute::CodeLocation => self.code_location.clone().map(AttributeValue::Single),
            Attribute::Status => self.status.clone().map(AttributeValue::Single),
            Attribute::Column => multiple(self.columns.iter().map(|c| c.name.clone())),
            Attribute::TableName => self.table_name.clone().map(AttributeValue::Single),
            Attribute::ColumnTag(name) => {
                multiple(self.columns.iter().filter_map(|c| c.tags.get(name).cloned()))
            }
            Attribute::ChangedInBranch => multiple(self.changed_in_branch.iter().cloned()),
        }
    }
}

fn multiple(values: impl Iterator<Item = String>) -> Option<AttributeValue> {
    let values: BTreeSet<String> = values.collect();
    (!values.is_empty()).then_some(AttributeValue::Multiple(values))
}

/// Asset graph held entirely in memory.
///
/// # Invariants
///
/// Every record in `records` has a node in `graph` and an entry in
/// `node_map`, and every dependency names a record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetGraph {
    /// Records indexed by key for O(1) attribute lookups
    records: HashMap<AssetKey, AssetRecord>,

    /// Dependency graph; edge direction is dependent -> dependency
    graph: DiGraph<AssetKey, ()>,

    /// Mapping from key to graph node
    node_map: HashMap<AssetKey, NodeIndex>,
}

impl InMemoryAssetGraph {
    /// Build a graph from asset records.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateKey`] if two records share a key and
    /// [`GraphError::UnknownDependency`] if a record depends on a key that
    /// no record defines.
    pub fn from_records<I>(records: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = AssetRecord>,
    {
        let mut graph = Self::default();

        for record in records {
            if graph.records.contains_key(&record.key) {
                return Err(GraphError::DuplicateKey(record.key));
            }
            let node = graph.graph.add_node(record.key.clone());
            graph.node_map.insert(record.key.clone(), node);
            graph.records.insert(record.key.clone(), record);
        }

        for (key, record) in &graph.records {
            let from = graph.node_map[key];
            for dep in &record.deps {
                let Some(&to) = graph.node_map.get(dep) else {
                    return Err(GraphError::UnknownDependency {
                        asset: key.clone(),
                        dependency: dep.clone(),
                    });
                };
                graph.graph.update_edge(from, to, ());
            }
        }

        tracing::debug!(
            assets = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "Built in-memory asset graph"
        );
        Ok(graph)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the graph has no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record for `key`, if present.
    #[must_use]
    pub fn record(&self, key: &AssetKey) -> Option<&AssetRecord> {
        self.records.get(key)
    }

    fn neighbors(&self, key: &AssetKey, direction: Direction) -> BTreeSet<AssetKey> {
        let Some(&node) = self.node_map.get(key) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .collect()
    }
}

impl AssetGraph for InMemoryAssetGraph {
    fn keys(&self) -> BTreeSet<AssetKey> {
        self.records.keys().cloned().collect()
    }

    fn direct_upstream(&self, key: &AssetKey) -> BTreeSet<AssetKey> {
        self.neighbors(key, Direction::Outgoing)
    }

    fn direct_downstream(&self, key: &AssetKey) -> BTreeSet<AssetKey> {
        self.neighbors(key, Direction::Incoming)
    }

    fn attribute(&self, key: &AssetKey, attribute: &Attribute) -> Option<AttributeValue> {
        self.records.get(key)?.attribute(attribute)
    }

    fn is_source(&self, key: &AssetKey) -> bool {
        self.records.get(key).is_some_and(|r| r.is_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> InMemoryAssetGraph {
        InMemoryAssetGraph::from_records([
            AssetRecord::new("a"),
            AssetRecord::new("b").with_deps(["a"]),
            AssetRecord::new("c").with_deps(["b"]),
        ])
        .unwrap()
    }

    #[test]
    fn edges_point_from_dependent_to_dependency() {
        let graph = chain();
        let b = AssetKey::from("b");

        assert_eq!(graph.direct_upstream(&b), BTreeSet::from([AssetKey::from("a")]));
        assert_eq!(graph.direct_downstream(&b), BTreeSet::from([AssetKey::from("c")]));
        assert!(graph.direct_upstream(&AssetKey::from("a")).is_empty());
    }

    #[test]
    fn unknown_key_has_no_neighbors() {
        let graph = chain();
        assert!(graph.direct_upstream(&AssetKey::from("zzz")).is_empty());
        assert!(graph.attribute(&AssetKey::from("zzz"), &Attribute::Owner).is_none());
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = InMemoryAssetGraph::from_records([AssetRecord::new("a"), AssetRecord::new("a")])
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateKey(AssetKey::from("a")));
    }

    #[test]
    fn rejects_unknown_dependencies() {
        let err = InMemoryAssetGraph::from_records([AssetRecord::new("b").with_deps(["a"])])
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownDependency { .. }));
    }

    #[test]
    fn duplicate_deps_produce_one_edge() {
        let graph = InMemoryAssetGraph::from_records([
            AssetRecord::new("a"),
            AssetRecord::new("b").with_deps(["a", "a"]),
        ])
        .unwrap();
        assert_eq!(graph.graph.edge_count(), 1);
    }

    #[test]
    fn column_tags_collect_values_across_columns() {
        let graph = InMemoryAssetGraph::from_records([AssetRecord::new("a")
            .with_column("id", &[("pii", "false")])
            .with_column("email", &[("pii", "true")])
            .with_column("created", &[])])
        .unwrap();
        let key = AssetKey::from("a");

        let value = graph
            .attribute(&key, &Attribute::ColumnTag("pii".to_string()))
            .unwrap();
        assert!(value.contains("true"));
        assert!(value.contains("false"));
        assert!(graph
            .attribute(&key, &Attribute::ColumnTag("owner".to_string()))
            .is_none());
        assert!(graph.attribute(&key, &Attribute::Column).unwrap().contains("created"));
    }

    #[test]
    fn records_deserialize_with_defaults() {
        let record: AssetRecord =
            serde_json::from_str(r#"{"key": ["raw", "orders"], "deps": ["raw/customers"]}"#)
                .unwrap();
        assert_eq!(record.key, AssetKey::new(["raw", "orders"]));
        assert_eq!(record.deps, vec![AssetKey::new(["raw", "customers"])]);
        assert!(!record.is_source);
        assert!(record.tags.is_empty());
    }
}
