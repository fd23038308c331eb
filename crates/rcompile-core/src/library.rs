//! Lookup of bare specifiers in configured library roots.

use rcompile_runtime::resolve::{self, ModuleId, DEFAULT_EXTENSION, INDEX_FILE, MODULE_EXTENSIONS};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::fs::FileSystem;

#[derive(Debug, Clone)]
pub struct LibraryLocator {
    base_dir: PathBuf,
    /// Roots as id prefixes relative to `base_dir`, in declaration order
    roots: Vec<String>,
}

impl LibraryLocator {
    /// `roots` may be relative to `base_dir` or absolute.
    pub fn new(base_dir: &Path, roots: &[PathBuf]) -> Self {
        let roots = roots
            .iter()
            .filter_map(|root| {
                let relative = if root.is_absolute() {
                    pathdiff::diff_paths(root, base_dir)
                } else {
                    Some(root.clone())
                };
                if relative.is_none() {
                    warn!("Ignoring library root {:?}: not reachable from {:?}", root, base_dir);
                }
                relative.map(|path| resolve::normalize(&to_slash(&path)))
            })
            .collect();

        Self {
            base_dir: base_dir.to_path_buf(),
            roots,
        }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Finds `name` in the library roots, last-declared root first.
    ///
    /// Per root the candidates are `<name>/index.js`, `<name>.js`, `<name>.json`
    /// and finally `<name>` itself when it already carries a module extension.
    pub fn locate(&self, name: &str, fs: &dyn FileSystem) -> Option<ModuleId> {
        for root in self.roots.iter().rev() {
            let prefix = if root.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", root, name)
            };

            let mut candidates = vec![
                format!("{}/{}", prefix, INDEX_FILE),
                format!("{}{}", prefix, DEFAULT_EXTENSION),
                format!("{}.json", prefix),
            ];
            if MODULE_EXTENSIONS.iter().any(|ext| prefix.ends_with(ext)) {
                candidates.push(prefix.clone());
            }

            for candidate in candidates {
                let id = resolve::normalize(&candidate);
                if fs.is_file(&self.base_dir.join(&id)) {
                    debug!("Library hit: {} -> {}", name, id);
                    return Some(ModuleId::new(id));
                }
            }
        }

        None
    }
}

/// Slash separated form of a relative path.
pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
