//! Salsa input types.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::library::{LibName, Library};

/// Input: every library known to the build context, by name.
///
/// Replacing the map invalidates closures and lookups computed from it.
#[salsa::input]
pub struct LibraryIndex {
    pub libraries: Arc<BTreeMap<LibName, Library>>,
}

/// Input: compile flags of a build context.
///
/// The link variant is derived from these, so flags that do not change the
/// variant do not invalidate anything downstream of it.
#[salsa::input]
pub struct FlagBundle {
    pub compile: Vec<String>,
}
