//! Module names, hierarchical paths and object names.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of a module as written by users (`Foo_bar`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased name, the base of every file derived from this module.
    pub fn lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Non-empty sequence of module names locating a module inside a wrapped
/// library namespace (`Lib.Sub.Leaf`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<ModuleName>", into = "Vec<ModuleName>")]
pub struct ModulePath(Vec<ModuleName>);

impl ModulePath {
    /// Path consisting of a single segment.
    pub fn singleton(name: ModuleName) -> Self {
        Self(vec![name])
    }

    /// Build a path from segments. Returns `None` for an empty sequence.
    pub fn new(segments: Vec<ModuleName>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    pub fn segments(&self) -> &[ModuleName] {
        &self.0
    }

    /// Last segment: the module's own name.
    pub fn leaf(&self) -> &ModuleName {
        // Non-empty by construction.
        &self.0[self.0.len() - 1]
    }
}

impl TryFrom<Vec<ModuleName>> for ModulePath {
    type Error = String;

    fn try_from(segments: Vec<ModuleName>) -> Result<Self, Self::Error> {
        Self::new(segments).ok_or_else(|| "module path must not be empty".to_string())
    }
}

impl From<ModulePath> for Vec<ModuleName> {
    fn from(path: ModulePath) -> Self {
        path.0
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(ModuleName::as_str).collect();
        f.write_str(&joined.join("."))
    }
}

/// Unique identity of a module inside a collection.
///
/// Artifact basenames are derived from it, so it must be stable across
/// rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjName(String);

impl ObjName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive an object name from a source path, assuming the basename
    /// needs no mangling: the file name up to its first `.`, lowercased.
    pub fn of_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let stem = file_name.split('.').next().unwrap_or_default();
        Self(stem.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
