//! Locating the external JavaScript compiler.

use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An external program together with how to install it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilerTool {
    pub program: String,
    pub install_hint: String,
}

impl Default for CompilerTool {
    fn default() -> Self {
        Self {
            program: "js_of_ocaml".to_string(),
            install_hint: "opam install js_of_ocaml-compiler".to_string(),
        }
    }
}

impl CompilerTool {
    fn not_found(&self) -> Error {
        Error::ToolNotFound {
            program: self.program.clone(),
            hint: self.install_hint.clone(),
        }
    }
}

/// Resolves a tool to an invocable path.
pub trait ToolLocator: Send + Sync {
    /// # Errors
    /// Returns [`Error::ToolNotFound`] carrying the tool's install hint.
    fn locate(&self, tool: &CompilerTool) -> Result<PathBuf>;
}

/// Looks tools up in `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLocator;

impl ToolLocator for PathLocator {
    fn locate(&self, tool: &CompilerTool) -> Result<PathBuf> {
        which::which(&tool.program).map_err(|e| {
            tracing::debug!("{} not in PATH: {}", tool.program, e);
            tool.not_found()
        })
    }
}

/// A fixed program table, for tests and planning without a toolchain.
#[derive(Debug, Clone, Default)]
pub struct FixedLocator {
    programs: FxHashMap<String, PathBuf>,
}

impl FixedLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, program: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.programs.insert(program.into(), path.into());
        self
    }
}

impl ToolLocator for FixedLocator {
    fn locate(&self, tool: &CompilerTool) -> Result<PathBuf> {
        self.programs
            .get(&tool.program)
            .cloned()
            .ok_or_else(|| tool.not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_locator() {
        let tool = CompilerTool::default();
        let locator = FixedLocator::new().with("js_of_ocaml", "/opt/bin/js_of_ocaml");
        assert_eq!(
            locator.locate(&tool).unwrap(),
            PathBuf::from("/opt/bin/js_of_ocaml")
        );
    }

    #[test]
    fn test_missing_tool_carries_hint() {
        let err = FixedLocator::new()
            .locate(&CompilerTool::default())
            .unwrap_err();
        match err {
            Error::ToolNotFound { program, hint } => {
                assert_eq!(program, "js_of_ocaml");
                assert_eq!(hint, "opam install js_of_ocaml-compiler");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_path_locator_missing_program() {
        let tool = CompilerTool {
            program: "kiln-definitely-not-installed".to_string(),
            install_hint: "nothing to install".to_string(),
        };
        assert!(matches!(
            PathLocator.locate(&tool),
            Err(Error::ToolNotFound { .. })
        ));
    }
}
