//! Loading asset graph snapshots from disk.
//!
//! A snapshot is a list of [`AssetRecord`]s in one of three formats, picked
//! by file extension:
//!
//! - `.json`: a JSON array of records
//! - `.jsonl`: one JSON record per line; blank lines are skipped
//! - `.yaml` / `.yml`: a YAML sequence of records

use asset_selection::{AssetRecord, InMemoryAssetGraph};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Supported snapshot encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// JSON array
    Json,
    /// JSON lines
    JsonLines,
    /// YAML sequence
    Yaml,
}

impl SnapshotFormat {
    /// Pick the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::JsonLines),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Read the records in a snapshot file.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for unknown extensions,
/// [`Error::Io`] if the file cannot be read, and [`Error::Json`] or
/// [`Error::Yaml`] if it cannot be decoded. JSONL errors carry the 1-based
/// line number.
pub fn read_records(path: &Path) -> Result<Vec<AssetRecord>> {
    let format =
        SnapshotFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&content, format, path)?;
    tracing::debug!(path = %path.display(), records = records.len(), ?format, "Read snapshot");
    Ok(records)
}

/// Decode snapshot `content`; `path` is only used in errors.
///
/// # Errors
///
/// Returns [`Error::Json`] or [`Error::Yaml`] if the content cannot be decoded.
pub fn parse_records(content: &str, format: SnapshotFormat, path: &Path) -> Result<Vec<AssetRecord>> {
    let json_error = |line, source| Error::Json {
        path: path.to_path_buf(),
        line,
        source,
    };

    match format {
        SnapshotFormat::Json => serde_json::from_str(content).map_err(|e| json_error(None, e)),
        SnapshotFormat::JsonLines => {
            let mut records = Vec::new();
            for (index, line) in content.lines().enumerate() {
                let line_number = index + 1;
                if line.trim().is_empty() {
                    tracing::trace!(line_number, "Skipping blank line");
                    continue;
                }
                let record =
                    serde_json::from_str(line).map_err(|e| json_error(Some(line_number), e))?;
                records.push(record);
            }
            Ok(records)
        }
        SnapshotFormat::Yaml => serde_yaml::from_str(content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load a snapshot file into an in-memory graph.
///
/// # Errors
///
/// Returns any error from [`read_records`], or [`Error::Graph`] if the
/// records repeat a key or depend on a missing asset.
pub fn load_graph(path: &Path) -> Result<InMemoryAssetGraph> {
    let records = read_records(path)?;
    InMemoryAssetGraph::from_records(records).map_err(|source| Error::Graph {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use rstest::rstest;

    #[rstest]
    #[case::json("assets.json", Some(SnapshotFormat::Json))]
    #[case::jsonl("assets.jsonl", Some(SnapshotFormat::JsonLines))]
    #[case::yaml("assets.yaml", Some(SnapshotFormat::Yaml))]
    #[case::yml("dir/assets.yml", Some(SnapshotFormat::Yaml))]
    #[case::toml("assets.toml", None)]
    #[case::no_extension("assets", None)]
    fn detects_format(#[case] path: &str, #[case] expected: Option<SnapshotFormat>) {
        assert_eq!(SnapshotFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn jsonl_skips_blank_lines() {
        let content = indoc! {r#"
            {"key": "a"}

            {"key": "b", "deps": ["a"]}
        "#};
        let records = parse_records(content, SnapshotFormat::JsonLines, Path::new("x.jsonl")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].deps.len(), 1);
    }

    #[test]
    fn jsonl_reports_line_number() {
        let content = indoc! {r#"
            {"key": "a"}
            {"key": "b", "deps": ["a"]}
            {"key": "c",
        "#};
        let err = parse_records(content, SnapshotFormat::JsonLines, Path::new("x.jsonl")).unwrap_err();
        assert!(matches!(err, Error::Json { line: Some(3), .. }), "{err}");
    }

    #[test]
    fn yaml_accepts_segment_keys() {
        let content = indoc! {r"
            - key: [raw, orders]
              owners: [team_ingest]
            - key: staging/orders
              deps: [raw/orders]
              group: staging
        "};
        let records = parse_records(content, SnapshotFormat::Yaml, Path::new("x.yaml")).unwrap();
        assert_eq!(records[0].key, records[1].deps[0]);
        assert_eq!(records[1].group.as_deref(), Some("staging"));
    }
}
