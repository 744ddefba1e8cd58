//! Build context configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::library::LibName;
use crate::toolchain::CompilerTool;

/// How executables are turned into JavaScript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationMode {
    /// Compile every unit on its own and link against a shared runtime.
    #[default]
    SeparateCompilation,
    /// Compile the whole bytecode executable in one step.
    WholeProgram,
}

/// Extra compiler flags per sub-mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct JsFlags {
    pub compile: Vec<String>,
    pub link: Vec<String>,
    pub build_runtime: Vec<String>,
}

/// The standard library and the two files only it provides.
///
/// The stdlib is not described by ordinary library metadata, so its archive
/// and exit stub are configured explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stdlib {
    pub name: LibName,
    pub archive: PathBuf,
    pub exit_stub: PathBuf,
}

impl Default for Stdlib {
    fn default() -> Self {
        Self {
            name: LibName::new("stdlib"),
            archive: PathBuf::from("stdlib.cma"),
            exit_stub: PathBuf::from("std_exit.cmo"),
        }
    }
}

/// Everything rule construction needs to know about the build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsContext {
    /// Build directory of the context (`_build/default`).
    pub build_dir: PathBuf,
    pub mode: CompilationMode,
    pub compiler: CompilerTool,
    pub stdlib: Stdlib,
    pub flags: JsFlags,
}

impl Default for JsContext {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("_build/default"),
            mode: CompilationMode::default(),
            compiler: CompilerTool::default(),
            stdlib: Stdlib::default(),
            flags: JsFlags::default(),
        }
    }
}

impl JsContext {
    /// Context for fast incremental development builds.
    pub fn development() -> Self {
        Self {
            flags: JsFlags {
                compile: vec!["--pretty".to_string(), "--source-map-inline".to_string()],
                link: vec!["--source-map".to_string()],
                build_runtime: vec!["--pretty".to_string()],
            },
            ..Default::default()
        }
    }

    /// Context compiling each executable as a whole.
    pub fn whole_program() -> Self {
        Self {
            mode: CompilationMode::WholeProgram,
            ..Default::default()
        }
    }
}
