//! Hierarchical asset keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separator between segments in the string form of a key.
pub const KEY_SEPARATOR: char = '/';

/// Identifier of an asset: a path of string segments.
///
/// The string form joins segments with `/`, so `["warehouse", "orders"]`
/// displays as `warehouse/orders`. Key wildcards match against that form.
/// A segment may itself contain `/`; such keys display like their split
/// counterparts but serialize as a segment array so they stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetKey(Vec<String>);

impl AssetKey {
    /// Create a key from its path segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a `/`-separated key string.
    #[must_use]
    pub fn from_user_string(path: &str) -> Self {
        Self::new(path.split(KEY_SEPARATOR))
    }

    /// The path segments of this key.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The `/`-joined string form of this key.
    #[must_use]
    pub fn to_user_string(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_user_string())
    }
}

impl From<&str> for AssetKey {
    fn from(path: &str) -> Self {
        Self::from_user_string(path)
    }
}

impl From<String> for AssetKey {
    fn from(path: String) -> Self {
        Self::from_user_string(&path)
    }
}

impl FromStr for AssetKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_user_string(s))
    }
}

impl Serialize for AssetKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.iter().any(|segment| segment.contains(KEY_SEPARATOR)) {
            self.0.serialize(serializer)
        } else {
            serializer.serialize_str(&self.to_user_string())
        }
    }
}

/// Keys are written either as `"a/b"` or as `["a", "b"]` in snapshot files.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Path(String),
    Segments(Vec<String>),
}

impl<'de> Deserialize<'de> for AssetKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match KeyRepr::deserialize(deserializer)? {
            KeyRepr::Path(path) => Self::from_user_string(&path),
            KeyRepr::Segments(segments) => Self(segments),
        })
    }
}
