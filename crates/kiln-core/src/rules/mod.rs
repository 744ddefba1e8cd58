//! JavaScript rule construction.
//!
//! [`JsRules`] turns modules, libraries and executables into rules for a
//! [`BuildEngine`]. It never runs the compiler: every operation registers
//! declarative actions and returns the targets they produce, so callers can
//! wire producers to consumers through paths.
//!
//! # Compilation modes
//!
//! - Separate compilation: each unit and library archive is compiled on its
//!   own, a runtime is built per executable, and a final link joins them.
//! - Whole program: the bytecode executable is compiled in a single action.

mod exe;
mod installed;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::JsContext;
use crate::engine::{ActionSpec, BuildEngine, Rule, RuleMode};
use crate::error::Result;
use crate::library::{LibOrigin, Library, LibraryResolver};
use crate::module::Module;
use crate::paths;
use crate::toolchain::ToolLocator;
use crate::variant::ConfigVariant;

pub use exe::Executable;

/// Registers JavaScript rules for one build context.
///
/// The library resolver is shared with deferred action parts, which look up
/// library closures only when the engine resolves them.
pub struct JsRules<'a> {
    ctx: &'a JsContext,
    engine: &'a dyn BuildEngine,
    libs: Arc<dyn LibraryResolver>,
    tools: &'a dyn ToolLocator,
}

impl<'a> JsRules<'a> {
    pub fn new(
        ctx: &'a JsContext,
        engine: &'a dyn BuildEngine,
        libs: Arc<dyn LibraryResolver>,
        tools: &'a dyn ToolLocator,
    ) -> Self {
        Self {
            ctx,
            engine,
            libs,
            tools,
        }
    }

    /// Variant selected by the context's compile flags.
    ///
    /// Every separately compiled artifact of the context is keyed by it.
    pub fn variant(&self) -> ConfigVariant {
        self.libs.variant_of_flags(&self.ctx.flags.compile)
    }

    /// Compile one program-local module to a JS unit.
    ///
    /// Returns `None` for modules that produce no code (interface-only and
    /// virtual modules, or modules without an implementation file).
    pub fn compile_module(&self, obj_dir: &Path, module: &Module) -> Result<Option<PathBuf>> {
        self.compile_module_for(obj_dir, &self.variant(), module)
    }

    fn compile_module_for(
        &self,
        obj_dir: &Path,
        variant: &ConfigVariant,
        module: &Module,
    ) -> Result<Option<PathBuf>> {
        if !module.produces_code() {
            tracing::debug!("Module {} has no code to compile", module.name());
            return Ok(None);
        }
        let target = paths::module_js_unit(obj_dir, variant, module);
        let input = paths::byte_object(obj_dir, module);
        self.compile_unit(variant, &self.ctx.flags.compile, input, target)
            .map(Some)
    }

    /// Compile the byte archives of a local library for the context's
    /// variant.
    ///
    /// Installed libraries are precompiled separately (see
    /// [`JsRules::precompile_installed`]) and register nothing here. A local
    /// library without archives registers nothing either.
    pub fn build_library(&self, lib: &Library) -> Result<Vec<PathBuf>> {
        if matches!(lib.origin, LibOrigin::Installed) {
            tracing::debug!("Skipping installed library {}", lib.name);
            return Ok(Vec::new());
        }
        if lib.archives.byte.is_empty() {
            tracing::debug!("Library {} has no byte archives", lib.name);
            return Ok(Vec::new());
        }
        let variant = self.variant();
        let targets = lib
            .archives
            .byte
            .par_iter()
            .map(|archive| {
                self.compile_archive(lib, &variant, &self.ctx.flags.compile, archive)
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(
            "Planned {} archive(s) of {} for variant {}",
            targets.len(),
            lib.name,
            variant
        );
        Ok(targets)
    }

    fn compile_archive(
        &self,
        lib: &Library,
        variant: &ConfigVariant,
        flags: &[String],
        archive: &Path,
    ) -> Result<PathBuf> {
        let target = paths::compiled_archive_path(&self.ctx.build_dir, variant, lib, archive)?;
        self.compile_unit(variant, flags, archive.to_path_buf(), target)
    }

    /// Register `compile <flags> <variant flags> -o <target> <input>`.
    fn compile_unit(
        &self,
        variant: &ConfigVariant,
        flags: &[String],
        input: PathBuf,
        target: PathBuf,
    ) -> Result<PathBuf> {
        let action = self
            .compiler()?
            .text("compile")
            .texts(flags.iter().cloned())
            .texts(variant.to_flags())
            .text("-o")
            .target(target.clone())
            .dep(input);
        self.add_rule(action, target.clone(), RuleMode::Standard)?;
        Ok(target)
    }

    fn compiler(&self) -> Result<ActionSpec> {
        Ok(ActionSpec::new(self.tools.locate(&self.ctx.compiler)?))
    }

    fn add_rule(&self, action: ActionSpec, target: PathBuf, mode: RuleMode) -> Result<()> {
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::debug!("Adding {:?} rule for {}", mode, target.display());
        self.engine.add_rule(Rule {
            dir,
            action,
            target,
            mode,
        })
    }
}
