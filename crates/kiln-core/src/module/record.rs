//! Persisted module records.
//!
//! A record stores a module's identity and which files it has, but not the
//! file paths: on decode they are rebuilt from the module name, the plain
//! dialect and the owning source directory.
//!
//! ```text
//! {"name":"Foo","obj_name":"foo","path":["Foo"],"visibility":"public","impl":true,"intf":false}
//! ```
//!
//! `kind` is only written when it cannot be inferred from `impl`: an
//! implementation-bearing `Impl` module and an implementation-less
//! `IntfOnly` module omit it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    Dialect, Module, ModuleKind, ModuleName, ModulePath, ObjName, Role, Source, SourceFile,
    Visibility,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: ModuleName,
    pub obj_name: ObjName,
    pub path: ModulePath,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ModuleKind>,
    #[serde(rename = "impl")]
    pub has_impl: bool,
    #[serde(rename = "intf")]
    pub has_intf: bool,
}

fn inferred_kind(has_impl: bool) -> ModuleKind {
    if has_impl {
        ModuleKind::Impl
    } else {
        ModuleKind::IntfOnly
    }
}

impl Module {
    /// Encode to a record, dropping the kind when it is redundant.
    pub fn to_record(&self) -> ModuleRecord {
        let has_impl = self.has(Role::Impl);
        let kind = if *self.kind() == inferred_kind(has_impl) {
            None
        } else {
            Some(self.kind().clone())
        };
        ModuleRecord {
            name: self.name().clone(),
            obj_name: self.obj_name().clone(),
            path: self.path().clone(),
            visibility: self.visibility(),
            kind,
            has_impl,
            has_intf: self.has(Role::Intf),
        }
    }

    /// Rebuild a module from a record found in `src_dir`.
    ///
    /// # Errors
    /// Fails like [`Module::new`] when the record describes an invalid module.
    pub fn from_record(record: ModuleRecord, src_dir: &Path) -> Result<Self> {
        let file = |present: bool, role: Role| {
            present.then(|| {
                let dialect = Dialect::Plain;
                let basename = format!("{}{}", record.name.lowercase(), dialect.extension(role));
                SourceFile::new(src_dir.join(basename), dialect)
            })
        };
        let intf = file(record.has_intf, Role::Intf);
        let imp = file(record.has_impl, Role::Impl);
        let kind = record.kind.unwrap_or_else(|| inferred_kind(record.has_impl));

        let source = Source::new(record.name, intf, imp)?;
        Ok(Module::new(source, kind, record.visibility)?
            .with_obj_name(record.obj_name)
            .with_path(record.path))
    }

    /// Serialize the record form to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_record()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parse the JSON record form, resolving files against `src_dir`.
    pub fn from_json(json: &str, src_dir: &Path) -> Result<Self> {
        let record: ModuleRecord =
            serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))?;
        Self::from_record(record, src_dir)
    }
}
