//! Module identity and source model.
//!
//! This module provides:
//! - [`Module`]: one compilation unit with its files, kind and visibility
//! - [`ModuleKind`] / [`Visibility`] and the tables restricting how they combine
//! - [`Modules`]: a collection keyed by [`ObjName`]
//! - the persisted record format (see [`record`])
//!
//! Modules are immutable values. Every update returns a new module; the ones
//! that can break the validity tables re-run them.

mod name;
pub mod record;
mod set;
mod source;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::ActionSpec;
use crate::error::{Error, Result};

pub use name::{ModuleName, ModulePath, ObjName};
pub use record::ModuleRecord;
pub use set::{ModuleDeps, Modules};
pub use source::{Dialect, Role, Source, SourceFile};

/// Reserved subdirectory holding generated compatibility shims.
pub const WRAPPED_COMPAT_DIR: &str = ".wrapped_compat";

/// Suffix of generated implementation sources.
pub const GENERATED_SUFFIX: &str = ".ml-gen";

/// Structural role of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Ordinary implementation.
    Impl,
    /// Interface without implementation.
    IntfOnly,
    /// Declared here, implemented later by a concrete library.
    Virtual,
    /// Re-export of a nested module of a wrapped library.
    Alias(ModulePath),
    /// Concrete implementation of a [`ModuleKind::Virtual`] declaration.
    ImplVmodule,
    /// Generated backward-compatibility shim.
    WrappedCompat,
    /// Synthetic top-level module of a wrapped library.
    Root,
}

impl ModuleKind {
    /// Whether `visibility` is allowed for this kind.
    pub fn allows_visibility(&self, visibility: Visibility) -> bool {
        match self {
            ModuleKind::Alias(_)
            | ModuleKind::ImplVmodule
            | ModuleKind::Virtual
            | ModuleKind::WrappedCompat => visibility == Visibility::Public,
            ModuleKind::Root => visibility == Visibility::Private,
            ModuleKind::Impl | ModuleKind::IntfOnly => true,
        }
    }

    /// Check which files this kind needs. The error is the reason to report.
    pub fn check_files(&self, has_intf: bool, has_impl: bool) -> std::result::Result<(), &'static str> {
        match self {
            ModuleKind::Alias(_) | ModuleKind::ImplVmodule | ModuleKind::WrappedCompat => {
                if !has_impl {
                    Err("an implementation file is required")
                } else if has_intf {
                    Err("interface and implementation files cannot both be present")
                } else {
                    Ok(())
                }
            }
            ModuleKind::Impl => {
                if has_impl {
                    Ok(())
                } else {
                    Err("an implementation file is required")
                }
            }
            ModuleKind::IntfOnly | ModuleKind::Virtual => {
                if !has_intf {
                    Err("an interface file is required")
                } else if has_impl {
                    Err("an implementation file is not allowed")
                } else {
                    Ok(())
                }
            }
            ModuleKind::Root => Ok(()),
        }
    }

    /// Whether modules of this kind compile to code.
    pub fn produces_code(&self) -> bool {
        match self {
            ModuleKind::IntfOnly | ModuleKind::Virtual => false,
            ModuleKind::Impl
            | ModuleKind::Alias(_)
            | ModuleKind::ImplVmodule
            | ModuleKind::WrappedCompat
            | ModuleKind::Root => true,
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKind::Impl => f.write_str("impl"),
            ModuleKind::IntfOnly => f.write_str("intf_only"),
            ModuleKind::Virtual => f.write_str("virtual"),
            ModuleKind::Alias(path) => write!(f, "alias({})", path),
            ModuleKind::ImplVmodule => f.write_str("impl_vmodule"),
            ModuleKind::WrappedCompat => f.write_str("wrapped_compat"),
            ModuleKind::Root => f.write_str("root"),
        }
    }
}

/// Whether a module is visible outside its library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Sandboxing requirement of a preprocessing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sandbox {
    #[default]
    Unspecified,
    Required,
    Disallowed,
}

/// Preprocessing attached to a module after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpSpec {
    pub action: ActionSpec,
    pub sandbox: Sandbox,
}

/// A compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    source: Source,
    obj_name: ObjName,
    path: ModulePath,
    kind: ModuleKind,
    visibility: Visibility,
    pp: Option<PpSpec>,
}

impl Module {
    /// Create a module, deriving its object name and path from the source.
    ///
    /// # Errors
    /// Returns [`Error::InvalidModule`] when the kind does not accept the
    /// visibility or the present files.
    pub fn new(source: Source, kind: ModuleKind, visibility: Visibility) -> Result<Self> {
        validate(&source, &kind, visibility)?;
        let obj_name = ObjName::of_path(&source.choose_file().path);
        let path = ModulePath::singleton(source.name().clone());
        Ok(Self {
            source,
            obj_name,
            path,
            kind,
            visibility,
            pp: None,
        })
    }

    /// A module whose only file is a generated implementation in `src_dir`.
    pub fn generated(
        name: ModuleName,
        kind: ModuleKind,
        visibility: Visibility,
        src_dir: &Path,
    ) -> Result<Self> {
        let file = SourceFile::plain(src_dir.join(format!("{}{}", name, GENERATED_SUFFIX)));
        let source = Source::single(name, Role::Impl, file);
        Self::new(source, kind, visibility)
    }

    pub fn name(&self) -> &ModuleName {
        self.source.name()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn obj_name(&self) -> &ObjName {
        &self.obj_name
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    pub fn kind(&self) -> &ModuleKind {
        &self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn pp(&self) -> Option<&PpSpec> {
        self.pp.as_ref()
    }

    pub fn has(&self, role: Role) -> bool {
        self.source.has(role)
    }

    pub fn file(&self, role: Role) -> Option<&SourceFile> {
        self.source.file(role)
    }

    pub fn src_dir(&self) -> &Path {
        self.source.src_dir()
    }

    /// Whether this module yields a compiled unit.
    pub fn produces_code(&self) -> bool {
        self.kind.produces_code() && self.has(Role::Impl)
    }

    /// Basename of the bytecode object for `role`, named after the object
    /// name (`lib__foo.cmo`).
    pub fn object_basename(&self, role: Role) -> String {
        format!("{}{}", self.obj_name, role.object_ext())
    }

    /// Basename of the JavaScript unit compiled from the implementation
    /// object (`foo.cmo.js`).
    pub fn compiled_unit_name(&self) -> String {
        format!("{}{}", self.object_basename(Role::Impl), crate::paths::JS_SUFFIX)
    }

    pub fn with_obj_name(self, obj_name: ObjName) -> Self {
        Self { obj_name, ..self }
    }

    pub fn with_path(self, path: ModulePath) -> Self {
        Self { path, ..self }
    }

    pub fn with_pp(self, pp: Option<PpSpec>) -> Self {
        Self { pp, ..self }
    }

    /// Replace the source, re-checking the validity tables.
    pub fn with_source(self, source: Source) -> Result<Self> {
        validate(&source, &self.kind, self.visibility)?;
        Ok(Self { source, ..self })
    }

    /// Add a file to an empty role.
    pub fn add_file(self, role: Role, file: SourceFile) -> Result<Self> {
        let source = self.source.clone().add_file(role, file)?;
        self.with_source(source)
    }

    /// Apply `f` to every present file. Roles are unchanged.
    pub fn map_files(self, f: impl FnMut(Role, SourceFile) -> SourceFile) -> Self {
        Self {
            source: self.source.map_files(f),
            ..self
        }
    }

    /// Move every file into `dir`, keeping file names.
    pub fn with_src_dir(self, dir: &Path) -> Self {
        self.map_files(|_, file| {
            let path = match file.path.file_name() {
                Some(file_name) => dir.join(file_name),
                None => dir.to_path_buf(),
            };
            SourceFile::new(path, file.dialect)
        })
    }

    /// Files after preprocessing: `foo.ml` becomes `foo.pp.ml` and the
    /// preprocessing spec is consumed.
    pub fn pped(self) -> Self {
        let pped = self.map_files(|_, file| SourceFile::new(pp_path(&file.path), file.dialect));
        Self { pp: None, ..pped }
    }

    /// Turn a public module into a generated backward-compatibility shim.
    ///
    /// The interface is dropped and the implementation becomes
    /// `<src_dir>/.wrapped_compat/<Name>.ml-gen`.
    pub fn wrapped_compat(&self) -> Result<Self> {
        if !self.is_public() {
            return Err(self.invalid(
                &ModuleKind::WrappedCompat,
                "only public modules have compatibility shims",
            ));
        }
        let file = self
            .src_dir()
            .join(WRAPPED_COMPAT_DIR)
            .join(format!("{}{}", self.name(), GENERATED_SUFFIX));
        let source = self.source.clone().with_impl_only(SourceFile::plain(file));
        Ok(Self {
            source,
            obj_name: self.obj_name.clone(),
            path: self.path.clone(),
            kind: ModuleKind::WrappedCompat,
            visibility: self.visibility,
            pp: None,
        })
    }

    fn invalid(&self, kind: &ModuleKind, reason: &'static str) -> Error {
        invalid_module(&self.source, kind, self.visibility, reason)
    }
}

fn validate(source: &Source, kind: &ModuleKind, visibility: Visibility) -> Result<()> {
    if !kind.allows_visibility(visibility) {
        return Err(invalid_module(
            source,
            kind,
            visibility,
            "visibility not allowed for this kind",
        ));
    }
    kind.check_files(source.has(Role::Intf), source.has(Role::Impl))
        .map_err(|reason| invalid_module(source, kind, visibility, reason))
}

fn invalid_module(
    source: &Source,
    kind: &ModuleKind,
    visibility: Visibility,
    reason: &'static str,
) -> Error {
    Error::InvalidModule {
        name: source.name().to_string(),
        kind: kind.to_string(),
        visibility: visibility.to_string(),
        has_intf: source.has(Role::Intf),
        has_impl: source.has(Role::Impl),
        reason,
    }
}

fn pp_path(path: &Path) -> PathBuf {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    let renamed = match file_name.rfind('.') {
        Some(dot) => format!("{}.pp{}", &file_name[..dot], &file_name[dot..]),
        None => format!("{}.pp", file_name),
    };
    path.with_file_name(renamed)
}
