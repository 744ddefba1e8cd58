//! Project description files.
//!
//! A project is a JSON document naming the build context, the libraries
//! visible to it and the executables to plan:
//!
//! ```json
//! {
//!   "context": { "build_dir": "_build/default", "mode": "separate_compilation" },
//!   "libraries": [
//!     { "name": "base", "origin": { "type": "installed" }, "src_dir": "/opt/lib/base",
//!       "archives": { "byte": ["/opt/lib/base/base.cma"] } }
//!   ],
//!   "executables": [
//!     { "name": "main", "dir": "_build/default/bin", "obj_dir": "_build/default/bin/.main.eobjs",
//!       "src_dir": "bin", "requires": ["base"],
//!       "modules": [{ "name": "Main", "obj_name": "main", "path": ["Main"],
//!                     "visibility": "private", "impl": true, "intf": false }] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use kiln_core::{
    Executable, JsContext, LibName, Library, Module, ModuleDeps, ModuleRecord, Modules,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub context: JsContext,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub executables: Vec<ExecutableSpec>,
}

/// An executable as written in the project file.
#[derive(Debug, Deserialize)]
pub struct ExecutableSpec {
    pub name: String,
    pub dir: PathBuf,
    pub obj_dir: PathBuf,
    /// Directory module files are rebuilt against.
    pub src_dir: PathBuf,
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
    #[serde(default)]
    pub deps: ModuleDeps,
    #[serde(default)]
    pub requires: Vec<LibName>,
    #[serde(default)]
    pub js_files: Vec<PathBuf>,
    #[serde(default)]
    pub linktime_units: Vec<PathBuf>,
    #[serde(default)]
    pub promote: bool,
}

impl Project {
    /// Load a project file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse project file {}", path.display()))
    }
}

impl ExecutableSpec {
    pub fn to_executable(&self) -> kiln_core::Result<Executable> {
        let modules = self
            .modules
            .iter()
            .map(|record| Module::from_record(record.clone(), &self.src_dir))
            .collect::<kiln_core::Result<Vec<_>>>()?;
        Ok(Executable {
            modules: Modules::from_modules(modules)?,
            module_deps: self.deps.clone(),
            requires: self.requires.clone(),
            js_files: self.js_files.clone(),
            linktime_units: self.linktime_units.clone(),
            promote: self.promote,
            ..Executable::new(&self.name, &self.dir, &self.obj_dir)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_project() {
        let project: Project = serde_json::from_str(r#"{"libraries": []}"#).unwrap();
        assert!(project.executables.is_empty());
        assert_eq!(project.context, JsContext::default());
    }

    #[test]
    fn test_executable_from_records() {
        let spec: ExecutableSpec = serde_json::from_str(
            r#"{"name": "main", "dir": "out", "obj_dir": "out/.main.eobjs", "src_dir": "bin",
                "modules": [
                  {"name": "Main", "obj_name": "main", "path": ["Main"], "visibility": "private",
                   "impl": true, "intf": false},
                  {"name": "Util", "obj_name": "util", "path": ["Util"], "visibility": "private",
                   "impl": true, "intf": true}
                ],
                "deps": {"main": ["util"]}}"#,
        )
        .unwrap();
        let exe = spec.to_executable().unwrap();
        assert_eq!(exe.modules.len(), 2);
        let order: Vec<_> = exe
            .modules
            .topological(&exe.module_deps)
            .unwrap()
            .into_iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(order, vec!["Util", "Main"]);
    }

    #[test]
    fn test_duplicate_obj_names_rejected() {
        let spec: ExecutableSpec = serde_json::from_str(
            r#"{"name": "main", "dir": "out", "obj_dir": "out/.main.eobjs", "src_dir": "bin",
                "modules": [
                  {"name": "Main", "obj_name": "main", "path": ["Main"], "visibility": "private",
                   "impl": true, "intf": false},
                  {"name": "Other", "obj_name": "main", "path": ["Other"], "visibility": "private",
                   "impl": true, "intf": false}
                ]}"#,
        )
        .unwrap();
        assert!(matches!(
            spec.to_executable(),
            Err(kiln_core::Error::DuplicateObjName { .. })
        ));
    }
}
