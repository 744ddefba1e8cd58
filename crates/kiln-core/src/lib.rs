//! Core of the kiln JavaScript build rules.
//!
//! This crate provides:
//! - The module model: sources, kinds, visibility and object names
//! - Configuration variants of the JavaScript backend
//! - Artifact path resolution for local and installed libraries
//! - Rule construction for separate and whole-program compilation
//! - Salsa-based library resolution

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod library;
pub mod module;
pub mod paths;
pub mod rules;
pub mod toolchain;
pub mod variant;

pub use config::{CompilationMode, JsContext, JsFlags, Stdlib};
pub use db::{KilnDatabase, QueryResult, Workspace};
pub use engine::{
    ActionGraph, ActionSpec, Arg, BuildEngine, ResolvedAction, Rule, RuleMode, ScheduledRule,
};
pub use error::{Error, Result};
pub use library::{Archives, LibName, LibOrigin, Library, LibraryResolver};
pub use module::{
    Dialect, Module, ModuleDeps, ModuleKind, ModuleName, ModulePath, ModuleRecord, Modules,
    ObjName, Role, Source, SourceFile, Visibility,
};
pub use rules::{Executable, JsRules};
pub use toolchain::{CompilerTool, FixedLocator, PathLocator, ToolLocator};
pub use variant::{ConfigVariant, Feature};
