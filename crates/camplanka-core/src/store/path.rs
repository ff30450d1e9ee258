//! Collection and document paths

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult};

/// Slash-separated path to a collection, e.g. `users/u1/wishlist`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

/// Slash-separated path to a document, e.g. `users/u1/wishlist/site-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Path of the document `id` inside this collection.
    #[must_use]
    pub fn doc(&self, id: impl AsRef<str>) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject empty segments and paths that name a document instead.
    pub fn validate(&self) -> StoreResult<()> {
        let count = validated_segment_count(&self.0)?;
        if count % 2 == 1 {
            Ok(())
        } else {
            Err(StoreError::InvalidArgument(format!(
                "'{}' is not a collection path",
                self.0
            )))
        }
    }
}

impl DocumentPath {
    /// Parse a stored path, checking that it names a document.
    pub fn parse(raw: impl Into<String>) -> StoreResult<Self> {
        let path = Self(raw.into());
        path.validate()?;
        Ok(path)
    }

    /// Sub-collection `name` below this document.
    #[must_use]
    pub fn collection(&self, name: impl AsRef<str>) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name.as_ref()))
    }

    /// The final segment of the path.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The collection that contains this document.
    pub fn parent(&self) -> CollectionPath {
        let parent = self
            .0
            .rsplit_once('/')
            .map_or("", |(parent, _)| parent)
            .to_string();
        CollectionPath(parent)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject empty segments and paths that name a collection instead.
    pub fn validate(&self) -> StoreResult<()> {
        let count = validated_segment_count(&self.0)?;
        if count % 2 == 0 {
            Ok(())
        } else {
            Err(StoreError::InvalidArgument(format!(
                "'{}' is not a document path",
                self.0
            )))
        }
    }
}

fn validated_segment_count(path: &str) -> StoreResult<usize> {
    let mut count = 0;
    for segment in path.split('/') {
        if segment.trim().is_empty() {
            return Err(StoreError::InvalidArgument(format!(
                "path '{path}' contains an empty segment"
            )));
        }
        count += 1;
    }
    Ok(count)
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
