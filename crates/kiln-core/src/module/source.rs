//! Source files of a module.
//!
//! A module has up to two files, one per [`Role`]. `Files` encodes the
//! "at least one" invariant in its shape, so a [`Source`] can never be empty.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::name::ModuleName;
use crate::error::{Error, Result};

/// Role of a source file within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Interface (signature) file.
    Intf,
    /// Implementation file.
    Impl,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Intf, Role::Impl];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Intf => "interface",
            Role::Impl => "implementation",
        }
    }

    /// Extension of the bytecode object the external compiler produces for
    /// this role.
    pub fn object_ext(self) -> &'static str {
        match self {
            Role::Intf => ".cmi",
            Role::Impl => ".cmo",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source language variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Plain syntax (`.ml` / `.mli`).
    #[default]
    Plain,
    /// Extended syntax (`.re` / `.rei`).
    Extended,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Plain, Dialect::Extended];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Plain => "plain",
            Dialect::Extended => "extended",
        }
    }

    /// File extension for a role, including the leading dot.
    pub fn extension(self, role: Role) -> &'static str {
        match (self, role) {
            (Dialect::Plain, Role::Intf) => ".mli",
            (Dialect::Plain, Role::Impl) => ".ml",
            (Dialect::Extended, Role::Intf) => ".rei",
            (Dialect::Extended, Role::Impl) => ".re",
        }
    }

    /// Recognize a source file by its extension.
    pub fn of_path(path: &Path) -> Option<(Dialect, Role)> {
        let ext = format!(".{}", path.extension()?.to_str()?);
        Self::ALL.into_iter().find_map(|dialect| {
            Role::ALL
                .into_iter()
                .find(|&role| dialect.extension(role) == ext)
                .map(|role| (dialect, role))
        })
    }
}

/// A file on disk together with its dialect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    #[serde(default)]
    pub dialect: Dialect,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, dialect: Dialect) -> Self {
        Self {
            path: path.into(),
            dialect,
        }
    }

    /// A plain-dialect file.
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Dialect::Plain)
    }
}

/// The files present for a module. At least one role is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Files {
    Intf(SourceFile),
    Impl(SourceFile),
    Both { intf: SourceFile, imp: SourceFile },
}

impl Files {
    fn get(&self, role: Role) -> Option<&SourceFile> {
        match (self, role) {
            (Files::Intf(f), Role::Intf) | (Files::Impl(f), Role::Impl) => Some(f),
            (Files::Both { intf, .. }, Role::Intf) => Some(intf),
            (Files::Both { imp, .. }, Role::Impl) => Some(imp),
            (Files::Intf(_), Role::Impl) | (Files::Impl(_), Role::Intf) => None,
        }
    }

    fn from_parts(intf: Option<SourceFile>, imp: Option<SourceFile>) -> Option<Self> {
        match (intf, imp) {
            (Some(intf), Some(imp)) => Some(Files::Both { intf, imp }),
            (Some(intf), None) => Some(Files::Intf(intf)),
            (None, Some(imp)) => Some(Files::Impl(imp)),
            (None, None) => None,
        }
    }

    fn into_parts(self) -> (Option<SourceFile>, Option<SourceFile>) {
        match self {
            Files::Intf(f) => (Some(f), None),
            Files::Impl(f) => (None, Some(f)),
            Files::Both { intf, imp } => (Some(intf), Some(imp)),
        }
    }
}

/// Name and files of one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Source {
    name: ModuleName,
    files: Files,
}

impl Source {
    /// Create a source from optional interface and implementation files.
    ///
    /// # Errors
    /// Returns [`Error::NoSourceFiles`] when both files are absent.
    pub fn new(
        name: ModuleName,
        intf: Option<SourceFile>,
        imp: Option<SourceFile>,
    ) -> Result<Self> {
        let files = Files::from_parts(intf, imp).ok_or_else(|| Error::NoSourceFiles {
            name: name.to_string(),
        })?;
        Ok(Self { name, files })
    }

    /// Source with a single file in the given role.
    pub fn single(name: ModuleName, role: Role, file: SourceFile) -> Self {
        let files = match role {
            Role::Intf => Files::Intf(file),
            Role::Impl => Files::Impl(file),
        };
        Self { name, files }
    }

    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    pub fn file(&self, role: Role) -> Option<&SourceFile> {
        self.files.get(role)
    }

    pub fn has(&self, role: Role) -> bool {
        self.file(role).is_some()
    }

    /// Add a file to an empty role.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateFile`] if the role already holds a file.
    pub fn add_file(self, role: Role, file: SourceFile) -> Result<Self> {
        if let Some(existing) = self.file(role) {
            return Err(Error::DuplicateFile {
                name: self.name.to_string(),
                role: role.as_str(),
                existing: existing.path.clone(),
            });
        }
        Ok(self.set_file(role, file))
    }

    /// Put a file in a role, replacing whatever was there.
    pub fn set_file(self, role: Role, file: SourceFile) -> Self {
        let files = match (role, self.files.into_parts()) {
            (Role::Intf, (_, Some(imp))) => Files::Both { intf: file, imp },
            (Role::Intf, (_, None)) => Files::Intf(file),
            (Role::Impl, (Some(intf), _)) => Files::Both { intf, imp: file },
            (Role::Impl, (None, _)) => Files::Impl(file),
        };
        Self {
            name: self.name,
            files,
        }
    }

    /// Keep only the implementation side, replacing it with `file`.
    pub(crate) fn with_impl_only(self, file: SourceFile) -> Self {
        Self {
            name: self.name,
            files: Files::Impl(file),
        }
    }

    /// Present files in role order (interface first).
    pub fn files(&self) -> impl Iterator<Item = (Role, &SourceFile)> {
        Role::ALL
            .into_iter()
            .filter_map(|role| self.file(role).map(|f| (role, f)))
    }

    /// Apply `f` to every present file.
    pub fn map_files(self, mut f: impl FnMut(Role, SourceFile) -> SourceFile) -> Self {
        let files = match self.files {
            Files::Intf(file) => Files::Intf(f(Role::Intf, file)),
            Files::Impl(file) => Files::Impl(f(Role::Impl, file)),
            Files::Both { intf, imp } => Files::Both {
                intf: f(Role::Intf, intf),
                imp: f(Role::Impl, imp),
            },
        };
        Self {
            name: self.name,
            files,
        }
    }

    /// The representative file: the interface if present, else the
    /// implementation.
    pub fn choose_file(&self) -> &SourceFile {
        match &self.files {
            Files::Intf(f) | Files::Impl(f) => f,
            Files::Both { intf, .. } => intf,
        }
    }

    /// Directory holding the module's files.
    pub fn src_dir(&self) -> &Path {
        self.choose_file()
            .path
            .parent()
            .unwrap_or_else(|| Path::new(""))
    }
}
