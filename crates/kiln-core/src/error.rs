//! Error types for kiln-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for kiln-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in kiln-core.
///
/// Most variants are invariant faults: they mean a caller assembled the build
/// graph from inconsistent pieces. They carry enough context (module name,
/// kind, offending values) to find the caller. [`Error::ToolNotFound`] is the
/// only variant intended for end users.
#[derive(Debug, Error)]
pub enum Error {
    /// A module source was built without any file.
    #[error("module {name} has neither an interface nor an implementation file")]
    NoSourceFiles { name: String },

    /// A file was added to a role that already holds one.
    #[error("module {name} already has an {role} file: {existing}")]
    DuplicateFile {
        name: String,
        role: &'static str,
        existing: PathBuf,
    },

    /// Kind, visibility and file presence do not agree.
    #[error(
        "invalid module {name}: kind {kind}, visibility {visibility}, \
         intf {has_intf}, impl {has_impl}: {reason}"
    )]
    InvalidModule {
        name: String,
        kind: String,
        visibility: String,
        has_intf: bool,
        has_impl: bool,
        reason: &'static str,
    },

    /// Two modules in one collection share an object name.
    #[error("duplicate object name {obj_name} (modules {first} and {second})")]
    DuplicateObjName {
        obj_name: String,
        first: String,
        second: String,
    },

    /// A module referenced by name is not in the collection.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// An archive with an extension the backend cannot compile.
    #[error("unexpected archive {}: expected a .cmo or .cma file", path.display())]
    UnexpectedArchive { path: PathBuf },

    /// A configuration variant string that does not parse.
    #[error("invalid configuration variant: {0}")]
    InvalidVariant(String),

    /// The external compiler could not be located.
    #[error("program {program} not found")]
    ToolNotFound { program: String, hint: String },

    /// A required library is unknown to the resolver.
    #[error("library not found: {0}")]
    LibraryNotFound(String),

    /// Cycle in the library or module dependency graph.
    #[error("cyclic dependency detected: {0}")]
    CyclicDependency(String),

    /// Two rules were registered for the same target.
    #[error("multiple rules generated for {}", .0.display())]
    DuplicateTarget(PathBuf),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Render the error together with its recovery hint, if it has one.
    pub fn with_hint(&self) -> String {
        match self {
            Error::ToolNotFound { hint, .. } => format!("{}\nHint: {}", self, hint),
            Error::CyclicDependency(_) => {
                format!("{}\nHint: break the cycle by removing one of the dependencies", self)
            }
            _ => self.to_string(),
        }
    }
}
