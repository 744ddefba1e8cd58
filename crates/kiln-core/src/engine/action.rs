//! Declarative action specifications.
//!
//! An [`ActionSpec`] describes a command without running it. Arguments are
//! kept structured so the engine can tell inputs from outputs, and parts that
//! are expensive or fallible to compute can be [`Deferred`] until the action
//! is actually resolved.

use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;

type DeferredFn = dyn Fn() -> Result<Vec<Arg>> + Send + Sync;

/// Arguments computed when the action is resolved.
#[derive(Clone)]
pub struct Deferred(Arc<DeferredFn>);

impl Deferred {
    pub fn new(f: impl Fn() -> Result<Vec<Arg>> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn expand(&self) -> Result<Vec<Arg>> {
        (self.0)()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Deferred {}

/// One part of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Literal token.
    Text(String),
    /// Path that is not tracked as an input.
    Path(PathBuf),
    /// Input file, passed on the command line.
    Dep(PathBuf),
    /// Input files, passed on the command line in order.
    Deps(Vec<PathBuf>),
    /// Inputs the command reads without naming them.
    Hidden(Vec<PathBuf>),
    /// Output file.
    Target(PathBuf),
    Deferred(Deferred),
}

/// A command to run, in terms of its program and structured arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    program: PathBuf,
    args: Vec<Arg>,
}

impl ActionSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn text(self, token: impl Into<String>) -> Self {
        self.arg(Arg::Text(token.into()))
    }

    pub fn texts<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.args.extend(tokens.into_iter().map(|t| Arg::Text(t.into())));
        self
    }

    pub fn path(self, path: impl Into<PathBuf>) -> Self {
        self.arg(Arg::Path(path.into()))
    }

    pub fn dep(self, path: impl Into<PathBuf>) -> Self {
        self.arg(Arg::Dep(path.into()))
    }

    pub fn deps(self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.arg(Arg::Deps(paths.into_iter().collect()))
    }

    pub fn hidden(self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.arg(Arg::Hidden(paths.into_iter().collect()))
    }

    pub fn target(self, path: impl Into<PathBuf>) -> Self {
        self.arg(Arg::Target(path.into()))
    }

    pub fn deferred(self, f: impl Fn() -> Result<Vec<Arg>> + Send + Sync + 'static) -> Self {
        self.arg(Arg::Deferred(Deferred::new(f)))
    }

    /// Expand deferred parts and flatten the command.
    ///
    /// # Errors
    /// Propagates the first error raised by a deferred part.
    pub fn resolve(&self) -> Result<ResolvedAction> {
        let mut resolved = ResolvedAction {
            argv: vec![self.program.display().to_string()],
            inputs: Vec::new(),
            hidden: Vec::new(),
            targets: Vec::new(),
        };
        resolve_args(&self.args, &mut resolved)?;
        Ok(resolved)
    }
}

fn resolve_args(args: &[Arg], out: &mut ResolvedAction) -> Result<()> {
    for arg in args {
        match arg {
            Arg::Text(token) => out.argv.push(token.clone()),
            Arg::Path(path) => out.argv.push(path.display().to_string()),
            Arg::Dep(path) => {
                out.argv.push(path.display().to_string());
                out.inputs.push(path.clone());
            }
            Arg::Deps(paths) => {
                for path in paths {
                    out.argv.push(path.display().to_string());
                    out.inputs.push(path.clone());
                }
            }
            Arg::Hidden(paths) => out.hidden.extend(paths.iter().cloned()),
            Arg::Target(path) => {
                out.argv.push(path.display().to_string());
                out.targets.push(path.clone());
            }
            Arg::Deferred(deferred) => resolve_args(&deferred.expand()?, out)?,
        }
    }
    Ok(())
}

/// A fully expanded action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedAction {
    pub argv: Vec<String>,
    /// Inputs named on the command line, in command-line order.
    pub inputs: Vec<PathBuf>,
    pub hidden: Vec<PathBuf>,
    pub targets: Vec<PathBuf>,
}

impl ResolvedAction {
    /// Every input, named or hidden.
    pub fn deps(&self) -> BTreeSet<&PathBuf> {
        self.inputs.iter().chain(&self.hidden).collect()
    }

    /// Cache key over the command, the dependency set and the targets.
    pub fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.argv.hash(&mut hasher);
        self.deps().hash(&mut hasher);
        self.targets.hash(&mut hasher);
        hasher.finish()
    }
}
