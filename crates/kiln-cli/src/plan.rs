//! Plan and precompile commands.
//!
//! Both load a project, register rules into an in-memory action graph and
//! print them in execution order. Nothing is executed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_core::{
    ActionGraph, CompilationMode, FixedLocator, JsRules, PathLocator, ToolLocator, Workspace,
};

use crate::colors;
use crate::output;
use crate::project::Project;

/// Options shared by the planning commands.
pub struct PlanOptions<'a> {
    pub mode: Option<CompilationMode>,
    /// Use this compiler path instead of searching `PATH`.
    pub compiler: Option<&'a Path>,
    pub json: bool,
}

/// Plan rules for every local library and executable of a project.
pub fn execute(project_path: &Path, opts: &PlanOptions<'_>) -> anyhow::Result<()> {
    let mut project = Project::load(project_path)?;
    if let Some(mode) = opts.mode {
        project.context.mode = mode;
    }

    let workspace = Arc::new(Workspace::new(project.libraries.iter().cloned()));
    let graph = ActionGraph::new();
    let tools = locator(&project, opts.compiler);
    let rules = JsRules::new(&project.context, &graph, workspace, tools.as_ref());

    if project.context.mode == CompilationMode::SeparateCompilation {
        for lib in project.libraries.iter().filter(|lib| lib.is_local()) {
            rules.build_library(lib)?;
        }
    }
    for spec in &project.executables {
        let exe = spec.to_executable()?;
        let target = rules.build_exe(&exe)?;
        tracing::info!("Executable {} builds {}", exe.name, target.display());
    }

    report(&graph, opts.json)
}

/// Plan precompilation of an installed library from `<variant>/<lib>` path
/// components.
pub fn precompile(
    project_path: &Path,
    components: &[String],
    opts: &PlanOptions<'_>,
) -> anyhow::Result<()> {
    let project = Project::load(project_path)?;
    let workspace = Arc::new(Workspace::new(project.libraries.iter().cloned()));
    let graph = ActionGraph::new();
    let tools = locator(&project, opts.compiler);
    let rules = JsRules::new(&project.context, &graph, workspace, tools.as_ref());

    if rules.precompile_installed(components)? == 0 && !opts.json {
        println!(
            "{}Nothing to precompile for {}{}",
            colors::YELLOW,
            components.join("/"),
            colors::RESET
        );
        return Ok(());
    }
    report(&graph, opts.json)
}

fn locator(project: &Project, compiler: Option<&Path>) -> Box<dyn ToolLocator> {
    match compiler {
        Some(path) => Box::new(
            FixedLocator::new().with(project.context.compiler.program.clone(), PathBuf::from(path)),
        ),
        None => Box::new(PathLocator),
    }
}

fn report(graph: &ActionGraph, json: bool) -> anyhow::Result<()> {
    let scheduled = graph.execution_order()?;
    if json {
        output::print_plan_json(&scheduled)?;
    } else {
        output::print_plan(&scheduled);
        output::print_summary(scheduled.len());
    }
    Ok(())
}
