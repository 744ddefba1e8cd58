//! Executable rules: runtime, link and whole-program compilation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use super::JsRules;
use crate::config::{CompilationMode, Stdlib};
use crate::engine::{Arg, Deferred, RuleMode};
use crate::error::Result;
use crate::library::LibName;
use crate::module::{ModuleDeps, Modules};
use crate::paths;
use crate::variant::ConfigVariant;

const RUNTIME_SUFFIX: &str = ".bc.runtime.js";
const JS_EXE_SUFFIX: &str = ".bc.js";
const BYTECODE_SUFFIX: &str = ".bc";

/// An executable to turn into JavaScript.
#[derive(Debug, Clone)]
pub struct Executable {
    pub name: String,
    /// Directory the outputs go to.
    pub dir: PathBuf,
    pub obj_dir: PathBuf,
    pub modules: Modules,
    pub module_deps: ModuleDeps,
    pub requires: Vec<LibName>,
    /// Extra JavaScript files for the runtime.
    pub js_files: Vec<PathBuf>,
    /// Bytecode units generated at link time.
    pub linktime_units: Vec<PathBuf>,
    pub promote: bool,
}

impl Executable {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, obj_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            obj_dir: obj_dir.into(),
            modules: Modules::new(),
            module_deps: ModuleDeps::new(),
            requires: Vec::new(),
            js_files: Vec::new(),
            linktime_units: Vec::new(),
            promote: false,
        }
    }

    /// `<dir>/<name>.bc`
    pub fn bytecode(&self) -> PathBuf {
        self.output(BYTECODE_SUFFIX)
    }

    /// `<dir>/<name>.bc.runtime.js`
    pub fn runtime_target(&self) -> PathBuf {
        self.output(RUNTIME_SUFFIX)
    }

    /// `<dir>/<name>.bc.js`
    pub fn js_target(&self) -> PathBuf {
        self.output(JS_EXE_SUFFIX)
    }

    fn output(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }

    fn mode(&self) -> RuleMode {
        if self.promote {
            RuleMode::Promote
        } else {
            RuleMode::Standard
        }
    }
}

impl JsRules<'_> {
    /// Register every rule an executable needs and return its final JS
    /// target.
    pub fn build_exe(&self, exe: &Executable) -> Result<PathBuf> {
        match self.ctx.mode {
            CompilationMode::WholeProgram => self.whole_program(exe),
            CompilationMode::SeparateCompilation => {
                let variant = self.variant();
                let units = exe
                    .modules
                    .topological(&exe.module_deps)?
                    .into_par_iter()
                    .map(|module| self.compile_module_for(&exe.obj_dir, &variant, module))
                    .collect::<Result<Vec<_>>>()?;
                let runtime = self.build_runtime(exe)?;
                let target = self.link(exe, &runtime)?;
                tracing::info!(
                    "Planned {} with {} compiled unit(s) for variant {}",
                    target.display(),
                    units.iter().flatten().count(),
                    variant
                );
                Ok(target)
            }
        }
    }

    /// Build the standalone runtime of an executable.
    ///
    /// Runtime files of the required libraries are looked up when the action
    /// is resolved.
    pub fn build_runtime(&self, exe: &Executable) -> Result<PathBuf> {
        let target = exe.runtime_target();
        let action = self
            .compiler()?
            .text("build-runtime")
            .texts(self.ctx.flags.build_runtime.iter().cloned())
            .texts(self.variant().to_flags())
            .text("-o")
            .target(target.clone())
            .arg(Arg::Deferred(self.runtime_files(exe)));
        self.add_rule(action, target.clone(), RuleMode::Standard)?;
        Ok(target)
    }

    /// Link an executable against `runtime`.
    ///
    /// Inputs are passed in this order: the runtime, the stdlib archive,
    /// link-time units, library archives in dependency order, program
    /// modules in dependency order, then the stdlib exit stub. The runtime
    /// and the exit stub must bracket everything else.
    pub fn link(&self, exe: &Executable, runtime: &Path) -> Result<PathBuf> {
        let variant = self.variant();
        let linktime = exe
            .linktime_units
            .iter()
            .map(|unit| self.compile_linktime_unit(exe, &variant, unit))
            .collect::<Result<Vec<_>>>()?;

        let modules: Vec<PathBuf> = exe
            .modules
            .topological(&exe.module_deps)?
            .into_iter()
            .filter(|module| module.produces_code())
            .map(|module| paths::module_js_unit(&exe.obj_dir, &variant, module))
            .collect();

        let libs = Arc::clone(&self.libs);
        let requires = exe.requires.clone();
        let build_dir = self.ctx.build_dir.clone();
        let stdlib = self.ctx.stdlib.clone();
        let target = exe.js_target();
        let action = self
            .compiler()?
            .text("link")
            .texts(self.ctx.flags.link.iter().cloned())
            .text("-o")
            .target(target.clone())
            .dep(runtime)
            .deferred(move || {
                let mut deps = vec![stdlib_unit(&build_dir, &variant, &stdlib, &stdlib.archive)?];
                deps.extend(linktime.iter().cloned());
                for lib in libs.closure(&requires)? {
                    if lib.name == stdlib.name {
                        continue;
                    }
                    for archive in &lib.archives.byte {
                        deps.push(paths::compiled_archive_path(&build_dir, &variant, &lib, archive)?);
                    }
                }
                deps.extend(modules.iter().cloned());
                deps.push(stdlib_unit(&build_dir, &variant, &stdlib, &stdlib.exit_stub)?);
                Ok(vec![Arg::Deps(deps)])
            });
        self.add_rule(action, target.clone(), exe.mode())?;
        Ok(target)
    }

    /// Compile the bytecode executable in one step.
    pub fn whole_program(&self, exe: &Executable) -> Result<PathBuf> {
        let target = exe.js_target();
        let action = self
            .compiler()?
            .text("compile")
            .texts(self.ctx.flags.compile.iter().cloned())
            .text("-o")
            .target(target.clone())
            .arg(Arg::Deferred(self.runtime_files(exe)))
            .dep(exe.bytecode());
        self.add_rule(action, target.clone(), exe.mode())?;
        tracing::info!("Planned whole-program compilation of {}", target.display());
        Ok(target)
    }

    /// Runtime files of every required library, then the executable's own
    /// JS files.
    fn runtime_files(&self, exe: &Executable) -> Deferred {
        let libs = Arc::clone(&self.libs);
        let requires = exe.requires.clone();
        let js_files = exe.js_files.clone();
        Deferred::new(move || {
            let files = libs
                .closure(&requires)?
                .into_iter()
                .flat_map(|lib| lib.runtime_files)
                .chain(js_files.iter().cloned())
                .collect();
            Ok(vec![Arg::Deps(files)])
        })
    }

    fn compile_linktime_unit(
        &self,
        exe: &Executable,
        variant: &ConfigVariant,
        unit: &Path,
    ) -> Result<PathBuf> {
        let target = paths::module_js_dir(&exe.obj_dir, variant).join(paths::js_basename(unit)?);
        self.compile_unit(variant, &self.ctx.flags.compile, unit.to_path_buf(), target)
    }
}

/// Compiled path of a file only the stdlib provides.
fn stdlib_unit(
    build_dir: &Path,
    variant: &ConfigVariant,
    stdlib: &Stdlib,
    file: &Path,
) -> Result<PathBuf> {
    Ok(paths::installed_js_dir(build_dir, variant, &stdlib.name).join(paths::js_basename(file)?))
}
