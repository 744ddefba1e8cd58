//! Resolved library descriptors.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::variant::ConfigVariant;

/// Name of a library (`base`, `stdlib`, `foo.bar`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibName(String);

impl LibName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LibName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Where a library comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibOrigin {
    /// Built by this build, objects under `obj_dir`.
    Local { obj_dir: PathBuf },
    /// Already installed.
    Installed,
}

/// Compiled archives of a library, one list per object kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Archives {
    #[serde(default)]
    pub byte: Vec<PathBuf>,
    #[serde(default)]
    pub native: Vec<PathBuf>,
}

/// A library as handed out by a [`LibraryResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Library {
    pub name: LibName,
    pub origin: LibOrigin,
    pub src_dir: PathBuf,
    #[serde(default)]
    pub requires: Vec<LibName>,
    #[serde(default)]
    pub archives: Archives,
    /// JavaScript runtime support files.
    #[serde(default)]
    pub runtime_files: Vec<PathBuf>,
}

impl Library {
    pub fn is_local(&self) -> bool {
        matches!(self.origin, LibOrigin::Local { .. })
    }
}

/// Library resolution for one build context.
pub trait LibraryResolver: Send + Sync {
    /// Look up a library by name.
    fn find(&self, name: &LibName) -> Option<Library>;

    /// Look up an installed library by name. Local libraries yield `None`.
    fn find_installed(&self, name: &LibName) -> Option<Library> {
        self.find(name).filter(|lib| !lib.is_local())
    }

    /// Transitive closure of `requires`, each library after everything it
    /// depends on.
    ///
    /// # Errors
    /// [`crate::Error::LibraryNotFound`] for an unknown name and
    /// [`crate::Error::CyclicDependency`] for a dependency cycle.
    fn closure(&self, requires: &[LibName]) -> Result<Vec<Library>>;

    /// Variant selected by a compile flag list.
    fn variant_of_flags(&self, compile_flags: &[String]) -> ConfigVariant {
        ConfigVariant::of_flags(compile_flags)
    }
}
