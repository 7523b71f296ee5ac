//! Storage-neutral asset locations.
//!
//! Every stored media object is addressed by an [`AssetLocation`], a
//! `<scheme>://<container>/<path>` handle that survives serialization into
//! the result store and round-trips back into the storage layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::generation::GenerationId;

/// Separator between the scheme and the container segment.
const SCHEME_SEPARATOR: &str = "://";

/// Error returned when a location string does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid asset location `{0}`: expected <scheme>://<container>/<path>")]
pub struct InvalidLocation(pub String);

/// A storage-neutral handle to a stored media object.
///
/// Locations are produced by the storage layer on upload and consumed by
/// whichever component needs the object back. All three segments are
/// guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetLocation {
    scheme: String,
    container: String,
    path: String,
}

impl AssetLocation {
    /// Create a location from its three segments.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLocation`] if any segment is empty or the scheme or
    /// container contain a separator character.
    pub fn new(
        scheme: impl Into<String>,
        container: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, InvalidLocation> {
        let scheme = scheme.into();
        let container = container.into();
        let path = path.into();
        if scheme.is_empty()
            || container.is_empty()
            || path.is_empty()
            || scheme.contains([':', '/'])
            || container.contains('/')
        {
            return Err(InvalidLocation(format!(
                "{scheme}{SCHEME_SEPARATOR}{container}/{path}"
            )));
        }
        Ok(Self {
            scheme,
            container,
            path,
        })
    }

    /// Parse a location from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLocation`] if the string is not of the form
    /// `<scheme>://<container>/<path>` with all segments non-empty.
    pub fn parse(input: &str) -> Result<Self, InvalidLocation> {
        let (scheme, rest) = input
            .split_once(SCHEME_SEPARATOR)
            .ok_or_else(|| InvalidLocation(input.to_owned()))?;
        let (container, path) = rest
            .split_once('/')
            .ok_or_else(|| InvalidLocation(input.to_owned()))?;
        Self::new(scheme, container, path).map_err(|_| InvalidLocation(input.to_owned()))
    }

    /// Storage scheme, e.g. `file` or `mem`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Container (bucket, directory tree, namespace) within the scheme.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Object path within the container.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SCHEME_SEPARATOR}{}/{}",
            self.scheme, self.container, self.path
        )
    }
}

impl FromStr for AssetLocation {
    type Err = InvalidLocation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssetLocation {
    type Error = InvalidLocation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetLocation> for String {
    fn from(location: AssetLocation) -> Self {
        location.to_string()
    }
}

/// Object path for the raw generated illustration of a generation.
#[must_use]
pub fn raw_image_path(id: &GenerationId) -> String {
    format!("raw/{id}.png")
}

/// Object path for the composed flashcard of a generation.
#[must_use]
pub fn composed_image_path(id: &GenerationId) -> String {
    format!("composed/{id}.png")
}

/// Object path for the narration audio of a generation.
#[must_use]
pub fn audio_path(id: &GenerationId) -> String {
    format!("audio/{id}.mp3")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parsing {
        use super::*;

        #[test]
        fn round_trips_through_display() {
            let location = AssetLocation::parse("file://wordcard-media/raw/g1.png").unwrap();
            assert_eq!(location.scheme(), "file");
            assert_eq!(location.container(), "wordcard-media");
            assert_eq!(location.path(), "raw/g1.png");
            assert_eq!(location.to_string(), "file://wordcard-media/raw/g1.png");
        }

        #[test]
        fn path_may_contain_slashes() {
            let location = AssetLocation::parse("mem://bucket/a/b/c.mp3").unwrap();
            assert_eq!(location.path(), "a/b/c.mp3");
        }

        #[test]
        fn rejects_missing_separator() {
            assert!(AssetLocation::parse("file:/bucket/a.png").is_err());
            assert!(AssetLocation::parse("bucket/a.png").is_err());
        }

        #[test]
        fn rejects_empty_segments() {
            assert!(AssetLocation::parse("://bucket/a.png").is_err());
            assert!(AssetLocation::parse("file:///a.png").is_err());
            assert!(AssetLocation::parse("file://bucket/").is_err());
        }

        #[test]
        fn new_rejects_separator_in_container() {
            assert!(AssetLocation::new("file", "a/b", "c.png").is_err());
        }
    }

    mod serde_form {
        use super::*;

        #[test]
        fn serializes_as_uri_string() {
            let location = AssetLocation::new("mem", "bucket", "audio/g1.mp3").unwrap();
            let json = serde_json::to_string(&location).unwrap();
            assert_eq!(json, "\"mem://bucket/audio/g1.mp3\"");
            let back: AssetLocation = serde_json::from_str(&json).unwrap();
            assert_eq!(back, location);
        }

        #[test]
        fn deserialize_rejects_malformed() {
            let result: Result<AssetLocation, _> = serde_json::from_str("\"not-a-location\"");
            assert!(result.is_err());
        }
    }

    mod object_paths {
        use super::*;

        #[test]
        fn paths_are_deterministic_per_id() {
            let id = GenerationId::from("g1");
            assert_eq!(raw_image_path(&id), "raw/g1.png");
            assert_eq!(composed_image_path(&id), "composed/g1.png");
            assert_eq!(audio_path(&id), "audio/g1.mp3");
        }
    }
}
