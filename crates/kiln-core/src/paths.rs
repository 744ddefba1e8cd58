//! Artifact paths of the JavaScript backend.
//!
//! Every path here is a pure function of its inputs, so the same library,
//! variant and archive always map to the same cache location:
//!
//! ```text
//! <obj_dir>/
//! ├── byte/foo.cmo              # bytecode object of a program module
//! └── js/                       # default variant
//!     ├── foo.cmo.js
//!     └── !effects/             # any other variant
//!         └── foo.cmo.js
//! <build_dir>/.js/<variant>/<lib>/
//!     └── lib.cma.js            # installed library archives
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::library::{LibName, LibOrigin, Library};
use crate::module::{Module, Role};
use crate::variant::ConfigVariant;

/// Suffix appended to a bytecode object or archive once compiled to JS.
pub const JS_SUFFIX: &str = ".js";

/// Directory of installed library artifacts, relative to the build dir.
pub const INSTALLED_JS_DIR: &str = ".js";

const LOCAL_JS_DIR: &str = "js";
const BYTE_DIR: &str = "byte";

/// JS directory for program-local objects under `obj_dir`.
///
/// The variant segment is only added for non-default variants.
pub fn module_js_dir(obj_dir: &Path, variant: &ConfigVariant) -> PathBuf {
    let dir = obj_dir.join(LOCAL_JS_DIR);
    if variant.is_default() {
        dir
    } else {
        dir.join(variant.to_string())
    }
}

/// Directory holding the compiled JS artifacts of `lib` for `variant`.
pub fn js_dir(build_dir: &Path, variant: &ConfigVariant, lib: &Library) -> PathBuf {
    match &lib.origin {
        LibOrigin::Local { obj_dir } => module_js_dir(obj_dir, variant),
        LibOrigin::Installed => installed_js_dir(build_dir, variant, &lib.name),
    }
}

/// Directory of an installed library's compiled JS artifacts.
pub fn installed_js_dir(build_dir: &Path, variant: &ConfigVariant, name: &LibName) -> PathBuf {
    build_dir
        .join(INSTALLED_JS_DIR)
        .join(variant.to_string())
        .join(name.as_str())
}

/// Compiled JS path of one of `lib`'s archives.
///
/// # Errors
/// Returns [`Error::UnexpectedArchive`] when `archive` is neither a `.cmo`
/// nor a `.cma` file.
pub fn compiled_archive_path(
    build_dir: &Path,
    variant: &ConfigVariant,
    lib: &Library,
    archive: &Path,
) -> Result<PathBuf> {
    Ok(js_dir(build_dir, variant, lib).join(js_basename(archive)?))
}

/// Rewrite an archive basename to its compiled form (`foo.cma` to
/// `foo.cma.js`).
pub fn js_basename(archive: &Path) -> Result<String> {
    let unexpected = || Error::UnexpectedArchive {
        path: archive.to_path_buf(),
    };
    let file_name = archive
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(unexpected)?;
    match archive.extension().and_then(|ext| ext.to_str()) {
        Some("cmo" | "cma") => Ok(format!("{}{}", file_name, JS_SUFFIX)),
        _ => Err(unexpected()),
    }
}

/// Bytecode object of a program-local module.
pub fn byte_object(obj_dir: &Path, module: &Module) -> PathBuf {
    obj_dir.join(BYTE_DIR).join(module.object_basename(Role::Impl))
}

/// Compiled JS unit of a program-local module.
pub fn module_js_unit(obj_dir: &Path, variant: &ConfigVariant, module: &Module) -> PathBuf {
    module_js_dir(obj_dir, variant).join(module.compiled_unit_name())
}
