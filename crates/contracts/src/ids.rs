//! Identifiers flowing through the pipeline
//!
//! `CollectionId` names a dataset, `Partition` is one output directory of the
//! upstream batch job, `PartFile` is one data file inside it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Collection identifier supplied on the command line.
///
/// # Examples
/// ```
/// use contracts::CollectionId;
///
/// let id: CollectionId = "foo".parse().unwrap();
/// assert_eq!(id.as_str(), "foo");
/// assert!("  ".parse::<CollectionId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    /// Create a collection id, rejecting blank input
    pub fn new(id: impl Into<String>) -> Result<Self, ContractError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ContractError::Other(
                "collection id cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CollectionId {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CollectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A partition directory chosen among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    /// Entry exactly as returned by the listing capability
    pub name: String,
    /// Location passed to the listing capability to enumerate the partition
    pub path: String,
}

impl Partition {
    /// Build a partition from a listing entry found under `root`.
    ///
    /// Remote listings (`hdfs dfs -ls -C`) and the local backend already
    /// return full paths; bare names are joined onto the root.
    pub fn from_entry(root: &str, entry: &str) -> Self {
        let path = if is_path_like(entry) {
            entry.to_string()
        } else {
            format!("{}/{}", root.trim_end_matches('/'), entry)
        };

        Self {
            name: entry.to_string(),
            path,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn is_path_like(entry: &str) -> bool {
    entry.starts_with('/') || entry.contains("://")
}

/// One data file inside a partition; the unit of work sent downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartFile(String);

impl PartFile {
    pub fn new(entry: impl Into<String>) -> Self {
        Self(entry.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment of the entry
    pub fn file_name(&self) -> &str {
        file_name(&self.0)
    }
}

impl AsRef<str> for PartFile {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PartFile {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for PartFile {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PartFile {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for PartFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final segment of a slash-separated path (the whole string if there is none)
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
