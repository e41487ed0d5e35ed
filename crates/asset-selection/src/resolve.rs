//! Resolution of selections against an [`AssetGraph`].
//!
//! Resolution is recursive and memo-free: every node of the selection tree
//! evaluates its children and combines their key sets. Predicates scan every
//! key the graph lists, source assets included; only [`AssetSelection::All`]
//! filters sources out.

use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, VecDeque};

use crate::error::{ResolutionError, Result};
use crate::graph::{ANY_CHANGE_REASON, AssetGraph, AttributeValue, DEFAULT_GROUP_NAME};
use crate::key::AssetKey;
use crate::selection::{AssetSelection, Attribute, Depth};

/// Direction of a traversal along dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Toward dependencies
    Upstream,
    /// Toward dependents
    Downstream,
}

impl AssetSelection {
    /// Evaluate this selection against `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::DanglingEdge`] if the graph reports a
    /// neighbor it does not list in [`AssetGraph::keys`], and
    /// [`ResolutionError::InvalidPattern`] if a key wildcard cannot be
    /// compiled.
    pub fn resolve<G: AssetGraph + ?Sized>(&self, graph: &G) -> Result<BTreeSet<AssetKey>> {
        let resolver = Resolver {
            graph,
            universe: graph.keys(),
        };
        let selected = resolver.resolve(self)?;
        tracing::debug!(
            universe = resolver.universe.len(),
            selected = selected.len(),
            "Resolved selection"
        );
        Ok(selected)
    }
}

struct Resolver<'g, G: ?Sized> {
    graph: &'g G,
    universe: BTreeSet<AssetKey>,
}

impl<G: AssetGraph + ?Sized> Resolver<'_, G> {
    fn resolve(&self, selection: &AssetSelection) -> Result<BTreeSet<AssetKey>> {
        let keys = match selection {
            AssetSelection::All { include_sources } => self
                .universe
                .iter()
                .filter(|key| *include_sources || !self.graph.is_source(key))
                .cloned()
                .collect(),
            AssetSelection::KeyWildcard { pattern } => {
                let matcher = wildcard_regex(pattern)?;
                self.universe
                    .iter()
                    .filter(|key| matcher.is_match(&key.to_user_string()))
                    .cloned()
                    .collect()
            }
            AssetSelection::Attribute { attribute, value } => self
                .universe
                .iter()
                .filter(|key| {
                    let actual = self.graph.attribute(key, attribute);
                    attribute_matches(attribute, value.as_deref(), actual.as_ref())
                })
                .cloned()
                .collect(),
            AssetSelection::And { left, right } => {
                let left = self.resolve(left)?;
                let right = self.resolve(right)?;
                left.intersection(&right).cloned().collect()
            }
            AssetSelection::Or { left, right } => {
                let mut left = self.resolve(left)?;
                left.extend(self.resolve(right)?);
                left
            }
            AssetSelection::Minus { left, right } => {
                let left = self.resolve(left)?;
                let right = self.resolve(right)?;
                left.difference(&right).cloned().collect()
            }
            AssetSelection::Upstream { selection, depth } => {
                let start = self.resolve(selection)?;
                self.traverse(start, *depth, Direction::Upstream)?
            }
            AssetSelection::Downstream { selection, depth } => {
                let start = self.resolve(selection)?;
                self.traverse(start, *depth, Direction::Downstream)?
            }
            AssetSelection::Sinks { selection } => {
                let inner = self.resolve(selection)?;
                self.without_neighbors_in(&inner, Direction::Downstream)?
            }
            AssetSelection::Roots { selection } => {
                let inner = self.resolve(selection)?;
                self.without_neighbors_in(&inner, Direction::Upstream)?
            }
        };
        tracing::trace!(?selection, selected = keys.len(), "Resolved node");
        Ok(keys)
    }

    /// Direct neighbors of `key`, each checked against the universe.
    fn neighbors(&self, key: &AssetKey, direction: Direction) -> Result<BTreeSet<AssetKey>> {
        let neighbors = match direction {
            Direction::Upstream => self.graph.direct_upstream(key),
            Direction::Downstream => self.graph.direct_downstream(key),
        };
        if let Some(unknown) = neighbors.iter().find(|n| !self.universe.contains(*n)) {
            return Err(ResolutionError::DanglingEdge {
                from: key.clone(),
                to: unknown.clone(),
            }
            .into());
        }
        Ok(neighbors)
    }

    /// Breadth-first walk from `start`, keeping nodes within `depth` hops.
    fn traverse(
        &self,
        start: BTreeSet<AssetKey>,
        depth: Depth,
        direction: Direction,
    ) -> Result<BTreeSet<AssetKey>> {
        let mut queue: VecDeque<(AssetKey, u32)> =
            start.iter().map(|key| (key.clone(), 0)).collect();
        let mut visited = start;

        while let Some((key, hops)) = queue.pop_front() {
            let next = hops.saturating_add(1);
            if !depth.allows(next) {
                continue;
            }
            for neighbor in self.neighbors(&key, direction)? {
                if visited.insert(neighbor.clone()) {
                    queue.push_back((neighbor, next));
                }
            }
        }

        Ok(visited)
    }

    /// Members of `inner` with no direct neighbor in `direction` inside `inner`.
    fn without_neighbors_in(
        &self,
        inner: &BTreeSet<AssetKey>,
        direction: Direction,
    ) -> Result<BTreeSet<AssetKey>> {
        let mut selected = BTreeSet::new();
        for key in inner {
            let neighbors = self.neighbors(key, direction)?;
            if neighbors.is_disjoint(inner) {
                selected.insert(key.clone());
            }
        }
        Ok(selected)
    }
}

/// Compile a `*` wildcard into an anchored regex over the `/`-joined key.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{body}$"))
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| {
            ResolutionError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}

fn attribute_matches(
    attribute: &Attribute,
    expected: Option<&str>,
    actual: Option<&AttributeValue>,
) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (None, Some(actual)) => {
            actual.is_empty()
                || (*attribute == Attribute::Group && actual.contains(DEFAULT_GROUP_NAME))
        }
        (Some(_), None) => false,
        (Some(ANY_CHANGE_REASON), Some(actual)) if *attribute == Attribute::ChangedInBranch => {
            !actual.is_empty()
        }
        (Some(expected), Some(actual)) => actual.contains(expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AssetRecord, InMemoryAssetGraph};
    use std::collections::BTreeMap;

    fn keys(names: &[&str]) -> BTreeSet<AssetKey> {
        names.iter().map(|n| AssetKey::from(*n)).collect()
    }

    /// `a -> b -> c` plus a source `s` feeding `a`.
    fn graph() -> InMemoryAssetGraph {
        InMemoryAssetGraph::from_records([
            AssetRecord::new("s").source(),
            AssetRecord::new("a").with_deps(["s"]).with_group("default"),
            AssetRecord::new("b").with_deps(["a"]).with_group("marts"),
            AssetRecord::new("c")
                .with_deps(["b"])
                .with_change("code_version"),
        ])
        .unwrap()
    }

    #[test]
    fn all_excludes_sources_unless_asked() {
        let graph = graph();
        assert_eq!(
            AssetSelection::all(false).resolve(&graph).unwrap(),
            keys(&["a", "b", "c"])
        );
        assert_eq!(
            AssetSelection::all(true).resolve(&graph).unwrap(),
            keys(&["s", "a", "b", "c"])
        );
    }

    #[test]
    fn wildcard_star_spans_newlines() {
        let graph =
            InMemoryAssetGraph::from_records([AssetRecord::new(AssetKey::new(["a\nb"]))]).unwrap();
        let expected = BTreeSet::from([AssetKey::new(["a\nb"])]);
        assert_eq!(AssetSelection::key_wildcard("*").resolve(&graph).unwrap(), expected);
        assert_eq!(AssetSelection::key_wildcard("a*b").resolve(&graph).unwrap(), expected);
    }

    #[test]
    fn predicates_include_sources() {
        let graph = graph();
        assert_eq!(
            AssetSelection::key_wildcard("s").resolve(&graph).unwrap(),
            keys(&["s"])
        );
    }

    #[test]
    fn wildcard_matches_joined_key() {
        let graph = InMemoryAssetGraph::from_records([
            AssetRecord::new(AssetKey::new(["raw", "orders"])),
            AssetRecord::new(AssetKey::new(["raw", "customers"])),
            AssetRecord::new("raw.orders"),
        ])
        .unwrap();

        let selected = AssetSelection::key_wildcard("raw/*").resolve(&graph).unwrap();
        assert_eq!(selected.len(), 2);

        // '.' is literal, not a regex metacharacter
        let selected = AssetSelection::key_wildcard("raw.orders").resolve(&graph).unwrap();
        assert_eq!(selected, keys(&["raw.orders"]));
    }

    #[test]
    fn null_group_matches_default_and_missing() {
        let graph = graph();
        assert_eq!(
            AssetSelection::group(None).resolve(&graph).unwrap(),
            keys(&["s", "a", "c"])
        );
    }

    #[test]
    fn changed_in_branch_any_matches_every_reason() {
        let graph = graph();
        assert_eq!(
            AssetSelection::changed_in_branch(Some("any"))
                .resolve(&graph)
                .unwrap(),
            keys(&["c"])
        );
        assert_eq!(
            AssetSelection::changed_in_branch(None)
                .resolve(&graph)
                .unwrap(),
            keys(&["s", "a", "b"])
        );
    }

    #[test]
    fn bounded_traversal_stops_at_depth() {
        let graph = graph();
        let selected = AssetSelection::key_wildcard("c")
            .upstream(Some(1))
            .resolve(&graph)
            .unwrap();
        assert_eq!(selected, keys(&["b", "c"]));

        let selected = AssetSelection::key_wildcard("c")
            .upstream(Some(0))
            .resolve(&graph)
            .unwrap();
        assert_eq!(selected, keys(&["c"]));
    }

    #[test]
    fn traversal_terminates_on_cycles() {
        let graph = InMemoryAssetGraph::from_records([
            AssetRecord::new("x").with_deps(["y"]),
            AssetRecord::new("y").with_deps(["x"]),
        ])
        .unwrap();
        let selected = AssetSelection::key_wildcard("x")
            .downstream(None)
            .resolve(&graph)
            .unwrap();
        assert_eq!(selected, keys(&["x", "y"]));
    }

    #[test]
    fn roots_and_sinks_are_relative_to_inner_set() {
        let graph = graph();
        let inner = AssetSelection::key_wildcard("a").or(AssetSelection::key_wildcard("b"));
        assert_eq!(inner.clone().roots().resolve(&graph).unwrap(), keys(&["a"]));
        assert_eq!(inner.sinks().resolve(&graph).unwrap(), keys(&["b"]));
    }

    /// A provider whose edges point outside its key set.
    struct Dangling;

    impl AssetGraph for Dangling {
        fn keys(&self) -> BTreeSet<AssetKey> {
            keys(&["a"])
        }

        fn direct_upstream(&self, _key: &AssetKey) -> BTreeSet<AssetKey> {
            keys(&["ghost"])
        }

        fn direct_downstream(&self, _key: &AssetKey) -> BTreeSet<AssetKey> {
            BTreeSet::new()
        }

        fn attribute(&self, _key: &AssetKey, _attribute: &Attribute) -> Option<AttributeValue> {
            None
        }

        fn is_source(&self, _key: &AssetKey) -> bool {
            false
        }
    }

    #[test]
    fn dangling_edge_is_reported() {
        let err = AssetSelection::all(false)
            .upstream(None)
            .resolve(&Dangling)
            .unwrap_err();
        assert!(err.is_resolution_error());
        assert_eq!(
            err,
            ResolutionError::DanglingEdge {
                from: AssetKey::from("a"),
                to: AssetKey::from("ghost"),
            }
            .into()
        );
    }

    #[test]
    fn tag_with_empty_value_differs_from_absent_tag() {
        let graph = InMemoryAssetGraph::from_records([
            AssetRecord::new("flagged").with_tag("pii", ""),
            AssetRecord::new("valued").with_tag("pii", "true"),
            AssetRecord::new("plain"),
        ])
        .unwrap();

        let cases = BTreeMap::from([
            (Some(""), keys(&["flagged"])),
            (Some("true"), keys(&["valued"])),
            (None, keys(&["plain"])),
        ]);
        for (value, expected) in cases {
            assert_eq!(
                AssetSelection::tag("pii", value).resolve(&graph).unwrap(),
                expected,
                "tag value {value:?}"
            );
        }
    }
}
