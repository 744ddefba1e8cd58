//! Integration tests for JavaScript rule construction.
//!
//! Each test plans rules into an in-memory [`ActionGraph`] and inspects what
//! was registered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_core::{
    ActionGraph, Archives, CompilationMode, Error, Executable, FixedLocator, JsContext, JsRules,
    LibName, LibOrigin, Library, Module, ModuleDeps, ModuleKind, ModuleName, Modules, ObjName,
    Role, Source, SourceFile, Visibility, Workspace,
};

// =============================================================================
// Test Helpers
// =============================================================================

const BUILD_DIR: &str = "_build/default";

fn installed(name: &str, requires: &[&str], archives: &[&str], runtime: &[&str]) -> Library {
    Library {
        name: LibName::new(name),
        origin: LibOrigin::Installed,
        src_dir: PathBuf::from(format!("/opt/lib/{name}")),
        requires: requires.iter().map(|r| LibName::new(*r)).collect(),
        archives: Archives {
            byte: archives.iter().map(PathBuf::from).collect(),
            native: Vec::new(),
        },
        runtime_files: runtime.iter().map(PathBuf::from).collect(),
    }
}

fn local(name: &str, requires: &[&str], archives: &[&str]) -> Library {
    Library {
        origin: LibOrigin::Local {
            obj_dir: PathBuf::from(format!("{BUILD_DIR}/{name}/.{name}.objs")),
        },
        src_dir: PathBuf::from(name),
        ..installed(name, requires, archives, &[])
    }
}

fn libraries() -> Vec<Library> {
    vec![
        installed(
            "stdlib",
            &[],
            &["/opt/lib/stdlib/stdlib.cma"],
            &["/opt/lib/stdlib/runtime.js"],
        ),
        installed("base", &[], &["/opt/lib/base/base.cma"], &["/opt/lib/base/base_stubs.js"]),
        local("mylib", &["base"], &["_build/default/mylib/mylib.cma"]),
    ]
}

fn module(name: &str) -> Module {
    let source = Source::single(
        ModuleName::new(name),
        Role::Impl,
        SourceFile::plain(format!("bin/{}.ml", name.to_lowercase())),
    );
    Module::new(source, ModuleKind::Impl, Visibility::Private).expect("valid module")
}

fn executable() -> Executable {
    let modules = Modules::from_modules([module("Main"), module("Util")]).expect("unique modules");
    let mut deps = ModuleDeps::new();
    deps.add(ObjName::new("main"), ObjName::new("util"));

    Executable {
        modules,
        module_deps: deps,
        requires: vec![LibName::new("mylib")],
        js_files: vec![PathBuf::from("bin/extra.js")],
        ..Executable::new("main", "_build/default/bin", "_build/default/bin/.main.eobjs")
    }
}

/// Planner state shared by a test.
struct Fixture {
    ctx: JsContext,
    graph: ActionGraph,
    workspace: Arc<Workspace>,
    tools: FixedLocator,
}

impl Fixture {
    fn new(ctx: JsContext, compile_flags: &[&str]) -> Self {
        let ctx = JsContext {
            flags: kiln_core::JsFlags {
                compile: compile_flags.iter().map(|f| f.to_string()).collect(),
                ..ctx.flags
            },
            ..ctx
        };
        Self {
            ctx,
            graph: ActionGraph::new(),
            workspace: Arc::new(Workspace::new(libraries())),
            tools: FixedLocator::new().with("js_of_ocaml", "/usr/bin/js_of_ocaml"),
        }
    }

    fn separate() -> Self {
        Self::new(JsContext::default(), &[])
    }

    fn rules(&self) -> JsRules<'_> {
        JsRules::new(&self.ctx, &self.graph, self.workspace.clone(), &self.tools)
    }

    fn targets(&self) -> Vec<PathBuf> {
        self.graph.rules().into_iter().map(|r| r.target).collect()
    }
}

fn position(paths: &[PathBuf], path: &str) -> usize {
    paths
        .iter()
        .position(|p| p == Path::new(path))
        .unwrap_or_else(|| panic!("{path} not in {paths:?}"))
}

// =============================================================================
// Separate compilation
// =============================================================================

#[test]
fn test_separate_compilation_registers_runtime_then_link() {
    let fx = Fixture::separate();
    let target = fx.rules().build_exe(&executable()).expect("planning succeeds");
    assert_eq!(target, PathBuf::from("_build/default/bin/main.bc.js"));

    let targets = fx.targets();
    assert_eq!(targets.len(), 4, "{targets:?}");
    let runtime = position(&targets, "_build/default/bin/main.bc.runtime.js");
    let link = position(&targets, "_build/default/bin/main.bc.js");
    assert!(runtime < link);
    assert_eq!(link, targets.len() - 1);

    let order: Vec<PathBuf> = fx
        .graph
        .execution_order()
        .expect("acyclic")
        .into_iter()
        .map(|r| r.target)
        .collect();
    assert!(
        position(&order, "_build/default/bin/main.bc.runtime.js")
            < position(&order, "_build/default/bin/main.bc.js")
    );
}

#[test]
fn test_link_input_order() {
    let fx = Fixture::separate();
    fx.rules().build_exe(&executable()).expect("planning succeeds");

    let link = fx
        .graph
        .producer(Path::new("_build/default/bin/main.bc.js"))
        .expect("link rule");
    let inputs = link.action.resolve().expect("resolves").inputs;

    assert_eq!(inputs[0], PathBuf::from("_build/default/bin/main.bc.runtime.js"));
    assert_eq!(
        inputs[1],
        PathBuf::from("_build/default/.js/default/stdlib/stdlib.cma.js")
    );
    assert_eq!(
        inputs.last(),
        Some(&PathBuf::from("_build/default/.js/default/stdlib/std_exit.cmo.js"))
    );

    let base = position(&inputs, "_build/default/.js/default/base/base.cma.js");
    let mylib = position(&inputs, "_build/default/mylib/.mylib.objs/js/mylib.cma.js");
    let util = position(&inputs, "_build/default/bin/.main.eobjs/js/util.cmo.js");
    let main = position(&inputs, "_build/default/bin/.main.eobjs/js/main.cmo.js");
    assert!(base < mylib);
    assert!(mylib < util);
    assert!(util < main);
    assert_eq!(main, inputs.len() - 2);

    // The stdlib is linked through its well-known files only.
    assert_eq!(
        inputs.iter().filter(|p| p.ends_with("stdlib.cma.js")).count(),
        1
    );
}

#[test]
fn test_runtime_inputs() {
    let fx = Fixture::separate();
    fx.rules().build_exe(&executable()).expect("planning succeeds");

    let runtime = fx
        .graph
        .producer(Path::new("_build/default/bin/main.bc.runtime.js"))
        .expect("runtime rule");
    let resolved = runtime.action.resolve().expect("resolves");
    assert_eq!(resolved.argv[1], "build-runtime");
    assert_eq!(
        resolved.inputs,
        vec![
            PathBuf::from("/opt/lib/base/base_stubs.js"),
            PathBuf::from("bin/extra.js")
        ]
    );
}

#[test]
fn test_variant_follows_compile_flags() {
    let fx = Fixture::new(JsContext::default(), &["--enable", "effects", "--pretty"]);
    fx.rules().build_exe(&executable()).expect("planning succeeds");

    let targets = fx.targets();
    position(&targets, "_build/default/bin/.main.eobjs/js/effects/main.cmo.js");

    let link = fx
        .graph
        .producer(Path::new("_build/default/bin/main.bc.js"))
        .expect("link rule");
    let inputs = link.action.resolve().expect("resolves").inputs;
    assert_eq!(
        inputs[1],
        PathBuf::from("_build/default/.js/effects/stdlib/stdlib.cma.js")
    );
    position(&inputs, "_build/default/mylib/.mylib.objs/js/effects/mylib.cma.js");
}

#[test]
fn test_linktime_units_are_compiled() {
    let fx = Fixture::separate();
    let exe = Executable {
        linktime_units: vec![PathBuf::from("_build/default/bin/.main.eobjs/byte/link_info.cmo")],
        ..executable()
    };
    fx.rules().build_exe(&exe).expect("planning succeeds");

    let unit = "_build/default/bin/.main.eobjs/js/link_info.cmo.js";
    position(&fx.targets(), unit);
    let link = fx
        .graph
        .producer(Path::new("_build/default/bin/main.bc.js"))
        .expect("link rule");
    let inputs = link.action.resolve().expect("resolves").inputs;
    assert_eq!(position(&inputs, unit), 2);
}

#[test]
fn test_unexpected_archive_surfaces_at_resolution() {
    let fx = Fixture::separate();
    let mut libs = libraries();
    libs.push(local("broken", &[], &["broken.cmxa"]));
    let rules = JsRules::new(&fx.ctx, &fx.graph, Arc::new(Workspace::new(libs)), &fx.tools);

    let exe = Executable {
        requires: vec![LibName::new("broken")],
        ..executable()
    };
    rules.build_exe(&exe).expect("planning succeeds");
    assert!(matches!(
        fx.graph.execution_order(),
        Err(Error::UnexpectedArchive { .. })
    ));
}

#[test]
fn test_unknown_library_surfaces_at_resolution() {
    let fx = Fixture::separate();
    let exe = Executable {
        requires: vec![LibName::new("missing")],
        ..executable()
    };
    fx.rules().build_exe(&exe).expect("planning succeeds");

    let link = fx
        .graph
        .producer(Path::new("_build/default/bin/main.bc.js"))
        .expect("link rule");
    assert!(matches!(
        link.action.resolve(),
        Err(Error::LibraryNotFound(name)) if name == "missing"
    ));
    let runtime = fx
        .graph
        .producer(Path::new("_build/default/bin/main.bc.runtime.js"))
        .expect("runtime rule");
    assert!(runtime.action.resolve().is_err());
}

#[test]
fn test_same_name_modules_with_distinct_obj_names() {
    let fx = Fixture::separate();
    let source = Source::single(ModuleName::new("Foo"), Role::Impl, SourceFile::plain("lib/foo.ml"))
        .add_file(Role::Intf, SourceFile::plain("lib/foo.mli"))
        .expect("empty interface role");
    let real = Module::new(source, ModuleKind::Impl, Visibility::Public)
        .expect("valid module")
        .with_obj_name(ObjName::new("lib__foo"));
    let compat = real
        .wrapped_compat()
        .expect("public module")
        .with_obj_name(ObjName::new("foo"));
    let exe = Executable {
        modules: Modules::from_modules([real, compat]).expect("unique object names"),
        module_deps: ModuleDeps::new(),
        ..executable()
    };
    fx.rules().build_exe(&exe).expect("no colliding targets");

    let targets = fx.targets();
    position(&targets, "_build/default/bin/.main.eobjs/js/lib__foo.cmo.js");
    position(&targets, "_build/default/bin/.main.eobjs/js/foo.cmo.js");

    let real_unit = fx
        .graph
        .producer(Path::new("_build/default/bin/.main.eobjs/js/lib__foo.cmo.js"))
        .expect("compile rule");
    assert_eq!(
        real_unit.action.resolve().expect("resolves").inputs,
        vec![PathBuf::from("_build/default/bin/.main.eobjs/byte/lib__foo.cmo")]
    );
}

#[test]
fn test_planning_twice_is_rejected() {
    let fx = Fixture::separate();
    fx.rules().build_exe(&executable()).expect("planning succeeds");
    assert!(matches!(
        fx.rules().build_exe(&executable()),
        Err(Error::DuplicateTarget(_))
    ));
}

#[test]
fn test_missing_compiler() {
    let fx = Fixture::separate();
    let no_tools = FixedLocator::new();
    let rules = JsRules::new(&fx.ctx, &fx.graph, fx.workspace.clone(), &no_tools);
    let err = rules.build_exe(&executable()).unwrap_err();
    assert!(matches!(err, Error::ToolNotFound { .. }));
    assert!(err.with_hint().contains("opam install js_of_ocaml-compiler"));
}

// =============================================================================
// Whole program
// =============================================================================

#[test]
fn test_whole_program_registers_one_rule() {
    let fx = Fixture::new(JsContext::whole_program(), &[]);
    assert_eq!(fx.ctx.mode, CompilationMode::WholeProgram);
    fx.rules().build_exe(&executable()).expect("planning succeeds");

    let rules = fx.graph.rules();
    assert_eq!(rules.len(), 1);
    let resolved = rules[0].action.resolve().expect("resolves");
    assert_eq!(resolved.argv[1], "compile");
    assert_eq!(
        resolved.inputs,
        vec![
            PathBuf::from("/opt/lib/base/base_stubs.js"),
            PathBuf::from("bin/extra.js"),
            PathBuf::from("_build/default/bin/main.bc"),
        ]
    );
    assert_eq!(resolved.targets, vec![PathBuf::from("_build/default/bin/main.bc.js")]);
}

// =============================================================================
// Installed precompilation
// =============================================================================

#[test]
fn test_precompile_unknown_library_is_noop() {
    let fx = Fixture::separate();
    assert_eq!(fx.rules().precompile_installed(&["default", "somepkg"]).unwrap(), 0);
    assert!(fx.graph.is_empty());
}

#[test]
fn test_precompile_wrong_arity_is_noop() {
    let fx = Fixture::separate();
    let rules = fx.rules();
    let empty: [&str; 0] = [];
    assert_eq!(rules.precompile_installed(&empty).unwrap(), 0);
    assert_eq!(rules.precompile_installed(&["default"]).unwrap(), 0);
    assert_eq!(rules.precompile_installed(&["default", "base", "extra"]).unwrap(), 0);
    assert!(fx.graph.is_empty());
}

#[test]
fn test_precompile_ignores_bad_variant_and_local_library() {
    let fx = Fixture::separate();
    let rules = fx.rules();
    assert_eq!(rules.precompile_installed(&["fast", "base"]).unwrap(), 0);
    assert_eq!(rules.precompile_installed(&["default", "mylib"]).unwrap(), 0);
    assert!(fx.graph.is_empty());
}

#[test]
fn test_precompile_installed_library() {
    let fx = Fixture::separate();
    let count = fx
        .rules()
        .precompile_installed(&["!use-js-string", "base"])
        .unwrap();
    assert_eq!(count, 1);

    let rule = fx
        .graph
        .producer(Path::new("_build/default/.js/!use-js-string/base/base.cma.js"))
        .expect("archive rule");
    let resolved = rule.action.resolve().expect("resolves");
    assert_eq!(resolved.inputs, vec![PathBuf::from("/opt/lib/base/base.cma")]);
    assert!(
        resolved
            .argv
            .windows(2)
            .any(|w| w == ["--disable", "use-js-string"])
    );
}

#[test]
fn test_precompile_stdlib_adds_exit_stub() {
    let fx = Fixture::separate();
    let count = fx.rules().precompile_installed(&["default", "stdlib"]).unwrap();
    assert_eq!(count, 2);

    let mut targets = fx.targets();
    targets.sort();
    assert_eq!(
        targets,
        vec![
            PathBuf::from("_build/default/.js/default/stdlib/std_exit.cmo.js"),
            PathBuf::from("_build/default/.js/default/stdlib/stdlib.cma.js"),
        ]
    );
}

#[test]
fn test_precompile_every_variant() {
    let fx = Fixture::separate();
    let rules = fx.rules();
    for variant in kiln_core::ConfigVariant::all() {
        let variant = variant.to_string();
        assert_eq!(rules.precompile_installed(&[variant.as_str(), "base"]).unwrap(), 1);
    }
    assert_eq!(fx.graph.len(), 9);
}
