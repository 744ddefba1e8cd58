//! Precompilation of installed libraries.
//!
//! Installed library archives are compiled on demand into
//! `<build_dir>/.js/<variant>/<lib>/`. Requests arrive as the path components
//! below `.js`, so anything that does not name a variant and an installed
//! library is simply not ours to build.

use std::path::PathBuf;

use rayon::prelude::*;

use super::JsRules;
use crate::error::Result;
use crate::library::LibName;
use crate::variant::ConfigVariant;

impl JsRules<'_> {
    /// Register compile rules for every archive of an installed library.
    ///
    /// `components` must be exactly `[variant, library]`. Any other shape, an
    /// unparsable variant, an unknown library or a local library registers
    /// nothing and returns `Ok(0)`. Otherwise returns the number of rules
    /// registered.
    pub fn precompile_installed<S: AsRef<str>>(&self, components: &[S]) -> Result<usize> {
        let [variant, name] = components else {
            tracing::debug!("Ignoring {} path component(s)", components.len());
            return Ok(0);
        };
        let Ok(variant) = variant.as_ref().parse::<ConfigVariant>() else {
            tracing::debug!("Ignoring unknown variant {}", variant.as_ref());
            return Ok(0);
        };
        let name = LibName::new(name.as_ref());
        let Some(lib) = self.libs.find_installed(&name) else {
            tracing::debug!("Library {} is not installed, nothing to precompile", name);
            return Ok(0);
        };

        let stdlib = &self.ctx.stdlib;
        let mut archives: Vec<PathBuf> = Vec::new();
        if lib.name == stdlib.name {
            archives.push(lib.src_dir.join(&stdlib.archive));
            archives.push(lib.src_dir.join(&stdlib.exit_stub));
        }
        for archive in &lib.archives.byte {
            if !archives.contains(archive) {
                archives.push(archive.clone());
            }
        }

        // Only the variant flags apply: the artifacts are shared by every
        // consumer of the variant.
        let count = archives
            .par_iter()
            .map(|archive| self.compile_archive(&lib, &variant, &[], archive))
            .collect::<Result<Vec<_>>>()?
            .len();
        tracing::info!("Planned {} archive(s) of {} for variant {}", count, lib.name, variant);
        Ok(count)
    }
}
