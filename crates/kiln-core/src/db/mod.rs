//! Salsa-based query database for kiln.
//!
//! This module provides memoized queries for:
//! - Library lookup and installed-library lookup
//! - Transitive library closures in dependency order
//! - The configuration variant selected by compile flags
//!
//! [`Workspace`] wraps the database behind the [`LibraryResolver`] trait so
//! rule construction does not depend on salsa directly.

mod inputs;
mod queries;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use salsa::Setter;

use crate::error::Result;
use crate::library::{LibName, Library, LibraryResolver};
use crate::variant::ConfigVariant;

pub use inputs::{FlagBundle, LibraryIndex};
pub use queries::{
    ClosureError, QueryResult, installed_library, library, library_closure, link_variant,
};

/// The concrete database implementation.
#[salsa::db]
#[derive(Default, Clone)]
pub struct KilnDatabase {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for KilnDatabase {}

impl KilnDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library index input.
    pub fn create_library_index(&self, libraries: impl IntoIterator<Item = Library>) -> LibraryIndex {
        LibraryIndex::new(self, Arc::new(by_name(libraries)))
    }

    /// Replace the libraries of an index, invalidating dependent queries.
    pub fn update_libraries(
        &mut self,
        index: LibraryIndex,
        libraries: impl IntoIterator<Item = Library>,
    ) {
        index.set_libraries(self).to(Arc::new(by_name(libraries)));
    }

    pub fn create_flags(&self, compile: Vec<String>) -> FlagBundle {
        FlagBundle::new(self, compile)
    }

    pub fn update_flags(&mut self, flags: FlagBundle, compile: Vec<String>) {
        flags.set_compile(self).to(compile);
    }

    pub fn get_link_variant(&self, flags: FlagBundle) -> ConfigVariant {
        link_variant(self, flags)
    }

    /// Closure of several roots, each library once and after its
    /// dependencies.
    pub fn get_closure(&self, index: LibraryIndex, requires: &[LibName]) -> Result<Vec<Library>> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for root in requires {
            let closure = library_closure(self, index, root.to_string()).into_result()?;
            for lib in closure {
                if seen.insert(lib.name.clone()) {
                    out.push(lib);
                }
            }
        }
        Ok(out)
    }
}

fn by_name(libraries: impl IntoIterator<Item = Library>) -> BTreeMap<LibName, Library> {
    libraries
        .into_iter()
        .map(|lib| (lib.name.clone(), lib))
        .collect()
}

/// A library set backed by the query database.
///
/// The compile flags input starts empty and follows whatever flag list the
/// variant is asked for, so unchanged flags reuse the memoized variant.
pub struct Workspace {
    db: Mutex<KilnDatabase>,
    index: LibraryIndex,
    flags: FlagBundle,
}

impl Workspace {
    pub fn new(libraries: impl IntoIterator<Item = Library>) -> Self {
        let db = KilnDatabase::new();
        let index = db.create_library_index(libraries);
        let flags = db.create_flags(Vec::new());
        Self {
            db: Mutex::new(db),
            index,
            flags,
        }
    }

    pub fn set_libraries(&mut self, libraries: impl IntoIterator<Item = Library>) {
        let index = self.index;
        self.db_mut().update_libraries(index, libraries);
    }

    fn db(&self) -> MutexGuard<'_, KilnDatabase> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn db_mut(&mut self) -> &mut KilnDatabase {
        self.db
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LibraryResolver for Workspace {
    fn find(&self, name: &LibName) -> Option<Library> {
        library(&*self.db(), self.index, name.to_string())
    }

    fn find_installed(&self, name: &LibName) -> Option<Library> {
        installed_library(&*self.db(), self.index, name.to_string())
    }

    fn closure(&self, requires: &[LibName]) -> Result<Vec<Library>> {
        self.db().get_closure(self.index, requires)
    }

    fn variant_of_flags(&self, compile_flags: &[String]) -> ConfigVariant {
        let mut db = self.db();
        if self.flags.compile(&*db).as_slice() != compile_flags {
            db.update_flags(self.flags, compile_flags.to_vec());
        }
        db.get_link_variant(self.flags)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::Error;
    use crate::library::{Archives, LibOrigin};

    fn lib(name: &str, requires: &[&str]) -> Library {
        Library {
            name: LibName::new(name),
            origin: LibOrigin::Installed,
            src_dir: PathBuf::from(format!("/opt/lib/{name}")),
            requires: requires.iter().map(|r| LibName::new(*r)).collect(),
            archives: Archives::default(),
            runtime_files: Vec::new(),
        }
    }

    fn names(libs: &[Library]) -> Vec<&str> {
        libs.iter().map(|l| l.name.as_str()).collect()
    }

    fn position(libs: &[Library], name: &str) -> usize {
        libs.iter().position(|l| l.name.as_str() == name).unwrap()
    }

    #[test]
    fn test_closure_dependency_order() {
        let ws = Workspace::new(
            [
                lib("app", &["json", "base"]),
                lib("json", &["base"]),
                lib("base", &[]),
                lib("unused", &[]),
            ],
        );
        let closure = ws.closure(&[LibName::new("app")]).unwrap();
        assert_eq!(closure.len(), 3);
        assert!(position(&closure, "base") < position(&closure, "json"));
        assert!(position(&closure, "json") < position(&closure, "app"));
    }

    #[test]
    fn test_closure_merges_roots() {
        let ws = Workspace::new([lib("a", &["base"]), lib("b", &["base"]), lib("base", &[])]);
        let closure = ws
            .closure(&[LibName::new("a"), LibName::new("b")])
            .unwrap();
        assert_eq!(names(&closure), vec!["base", "a", "b"]);
    }

    #[test]
    fn test_closure_errors() {
        let ws = Workspace::new([lib("a", &["missing"]), lib("x", &["y"]), lib("y", &["x"])]);
        assert!(matches!(
            ws.closure(&[LibName::new("a")]),
            Err(Error::LibraryNotFound(name)) if name == "missing"
        ));
        assert!(matches!(
            ws.closure(&[LibName::new("x")]),
            Err(Error::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_installed_lookup_skips_local() {
        let mut local = lib("mine", &[]);
        local.origin = LibOrigin::Local {
            obj_dir: PathBuf::from("_build/default/mine/.mine.objs"),
        };
        let ws = Workspace::new([local, lib("base", &[])]);
        assert!(ws.find_installed(&LibName::new("base")).is_some());
        assert!(ws.find_installed(&LibName::new("mine")).is_none());
        assert!(ws.find(&LibName::new("mine")).is_some());
    }

    #[test]
    fn test_updates_invalidate() {
        let mut ws = Workspace::new([lib("a", &[])]);
        let effects = vec!["--enable".to_string(), "effects".to_string()];
        assert_eq!(ws.variant_of_flags(&effects).effects, Some(true));
        assert!(ws.find(&LibName::new("b")).is_none());

        ws.set_libraries([lib("a", &["b"]), lib("b", &[])]);
        assert!(ws.variant_of_flags(&[]).is_default());
        assert_eq!(ws.variant_of_flags(&effects).effects, Some(true));
        assert_eq!(
            names(&ws.closure(&[LibName::new("a")]).unwrap()),
            vec!["b", "a"]
        );
    }
}
