//! The selection algebra.
//!
//! An [`AssetSelection`] is an immutable expression tree with value
//! semantics: two trees built along different paths compare equal when they
//! have the same shape. Combinators consume their operands and return a new
//! tree; nothing is mutated in place.
//!
//! ```
//! use asset_selection::{AssetSelection, Depth};
//!
//! let selection = AssetSelection::key_wildcard("raw/*")
//!     .downstream(None)
//!     .and(AssetSelection::group(Some("marts")));
//!
//! assert_eq!(
//!     selection.to_selection_string().unwrap(),
//!     r#"key:"raw/*"+ and group:marts"#
//! );
//! assert_eq!(
//!     AssetSelection::key_wildcard("a").upstream(Some(2)),
//!     AssetSelection::Upstream {
//!         selection: Box::new(AssetSelection::key_wildcard("a")),
//!         depth: Depth::Bounded(2),
//!     }
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Sub};

/// How many hops a traversal walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// At most this many hops
    Bounded(u32),
    /// Until no new assets are found
    Unbounded,
}

impl Depth {
    /// Whether a node `hops` edges away from the start is within range.
    #[must_use]
    pub fn allows(self, hops: u32) -> bool {
        match self {
            Self::Bounded(limit) => hops <= limit,
            Self::Unbounded => true,
        }
    }
}

impl From<Option<u32>> for Depth {
    fn from(depth: Option<u32>) -> Self {
        depth.map_or(Self::Unbounded, Self::Bounded)
    }
}

/// Asset attributes a selection can filter on.
///
/// Each variant names one lookup on the [`AssetGraph`](crate::graph::AssetGraph)
/// provider. `Tag` and `ColumnTag` carry the tag name being looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Value of the named tag
    Tag(String),
    /// Owners of the asset
    Owner,
    /// Group the asset belongs to
    Group,
    /// Compute kinds of the asset
    Kind,
    /// Code location defining the asset
    CodeLocation,
    /// Health status
    Status,
    /// Column names in the asset's schema
    Column,
    /// Table name the asset materializes to
    TableName,
    /// Values of the named tag across the asset's columns
    ColumnTag(String),
    /// Reasons the asset changed in the current branch
    ChangedInBranch,
}

impl Attribute {
    /// The attribute name as written in selection strings.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tag(_) => "tag",
            Self::Owner => "owner",
            Self::Group => "group",
            Self::Kind => "kind",
            Self::CodeLocation => "code_location",
            Self::Status => "status",
            Self::Column => "column",
            Self::TableName => "table_name",
            Self::ColumnTag(_) => "column_tag",
            Self::ChangedInBranch => "changed_in_branch",
        }
    }
}

/// A composable selection of assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetSelection {
    /// Every asset, optionally including source assets
    All {
        /// Whether source assets are part of the universe
        include_sources: bool,
    },
    /// Assets whose `/`-joined key matches a `*` wildcard
    KeyWildcard {
        /// The wildcard pattern
        pattern: String,
    },
    /// Assets whose attribute holds `value`, or holds nothing when `value` is `None`
    Attribute {
        /// Which attribute to look up
        attribute: Attribute,
        /// The value to match; `None` matches assets without the attribute
        value: Option<String>,
    },
    /// Assets in both operands
    And {
        /// Left operand
        left: Box<AssetSelection>,
        /// Right operand
        right: Box<AssetSelection>,
    },
    /// Assets in either operand
    Or {
        /// Left operand
        left: Box<AssetSelection>,
        /// Right operand
        right: Box<AssetSelection>,
    },
    /// Assets in `left` but not in `right`
    Minus {
        /// Assets to start from
        left: Box<AssetSelection>,
        /// Assets to remove
        right: Box<AssetSelection>,
    },
    /// The inner selection plus its ancestors up to `depth` hops
    Upstream {
        /// Where the walk starts
        selection: Box<AssetSelection>,
        /// How far to walk
        depth: Depth,
    },
    /// The inner selection plus its descendants up to `depth` hops
    Downstream {
        /// Where the walk starts
        selection: Box<AssetSelection>,
        /// How far to walk
        depth: Depth,
    },
    /// Members of the inner selection with no dependents inside it
    Sinks {
        /// The subgraph to search
        selection: Box<AssetSelection>,
    },
    /// Members of the inner selection with no dependencies inside it
    Roots {
        /// The subgraph to search
        selection: Box<AssetSelection>,
    },
}

impl AssetSelection {
    /// Every asset; source assets only when `include_sources` is set.
    #[must_use]
    pub fn all(include_sources: bool) -> Self {
        Self::All { include_sources }
    }

    /// Assets whose key matches `pattern`, where `*` matches any substring.
    pub fn key_wildcard(pattern: impl Into<String>) -> Self {
        Self::KeyWildcard {
            pattern: pattern.into(),
        }
    }

    /// Assets carrying tag `key` with `value`; `None` selects assets without the tag.
    pub fn tag(key: impl Into<String>, value: Option<&str>) -> Self {
        Self::attribute(Attribute::Tag(key.into()), value)
    }

    /// Assets owned by `owner`; `None` selects assets without owners.
    #[must_use]
    pub fn owner(owner: Option<&str>) -> Self {
        Self::attribute(Attribute::Owner, owner)
    }

    /// Assets in `group`; `None` selects assets in the default group.
    #[must_use]
    pub fn group(group: Option<&str>) -> Self {
        Self::attribute(Attribute::Group, group)
    }

    /// Assets with compute kind `kind`; `None` selects assets without kinds.
    #[must_use]
    pub fn kind(kind: Option<&str>) -> Self {
        Self::attribute(Attribute::Kind, kind)
    }

    /// Assets defined in `location`; `None` selects assets without one.
    #[must_use]
    pub fn code_location(location: Option<&str>) -> Self {
        Self::attribute(Attribute::CodeLocation, location)
    }

    /// Assets whose health status is `status`.
    pub fn status(status: impl Into<String>) -> Self {
        Self::Attribute {
            attribute: Attribute::Status,
            value: Some(status.into()),
        }
    }

    /// Assets with a column named `column`; `None` selects assets without columns.
    #[must_use]
    pub fn column(column: Option<&str>) -> Self {
        Self::attribute(Attribute::Column, column)
    }

    /// Assets materialized to `table`; `None` selects assets without a table name.
    #[must_use]
    pub fn table_name(table: Option<&str>) -> Self {
        Self::attribute(Attribute::TableName, table)
    }

    /// Assets with a column tagged `key` = `value`.
    pub fn column_tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            attribute: Attribute::ColumnTag(key.into()),
            value: Some(value.into()),
        }
    }

    /// Assets changed in the branch for `reason` (`any` matches every
    /// reason); `None` selects unchanged assets.
    #[must_use]
    pub fn changed_in_branch(reason: Option<&str>) -> Self {
        Self::attribute(Attribute::ChangedInBranch, reason)
    }

    fn attribute(attribute: Attribute, value: Option<&str>) -> Self {
        Self::Attribute {
            attribute,
            value: value.map(str::to_string),
        }
    }

    /// Assets selected by both `self` and `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Assets selected by either `self` or `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Assets selected by `self` and not by `other`.
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        Self::Minus {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// This selection plus ancestors up to `depth` hops (`None` for unbounded).
    #[must_use]
    pub fn upstream(self, depth: Option<u32>) -> Self {
        Self::Upstream {
            selection: Box::new(self),
            depth: depth.into(),
        }
    }

    /// This selection plus descendants up to `depth` hops (`None` for unbounded).
    #[must_use]
    pub fn downstream(self, depth: Option<u32>) -> Self {
        Self::Downstream {
            selection: Box::new(self),
            depth: depth.into(),
        }
    }

    /// Members of this selection with no dependents inside it.
    #[must_use]
    pub fn sinks(self) -> Self {
        Self::Sinks {
            selection: Box::new(self),
        }
    }

    /// Members of this selection with no dependencies inside it.
    #[must_use]
    pub fn roots(self) -> Self {
        Self::Roots {
            selection: Box::new(self),
        }
    }
}

impl BitAnd for AssetSelection {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for AssetSelection {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl Sub for AssetSelection {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.minus(rhs)
    }
}
