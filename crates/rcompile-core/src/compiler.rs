//! Module graph discovery.
//!
//! [`Compiler`] starts at an entry file, follows every literal `require` call
//! depth first and hands the discovered modules to the [`Combiner`].

use indexmap::IndexMap;
use path_clean::PathClean;
use rcompile_runtime::resolve::{self, ModuleId, ResolveError};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::combiner::Combiner;
use crate::config::CompilerOptions;
use crate::errors::{CompilationError, Result};
use crate::fs::FileSystem;
use crate::library::{to_slash, LibraryLocator};
use crate::scanner::scan_requires;

pub struct Compiler {
    options: CompilerOptions,
    file_system: Arc<dyn FileSystem>,
    combiner: Combiner,
    base_dir: PathBuf,
    library: LibraryLocator,
    entry_module: Option<ModuleId>,
    /// Every id ever queued for fetching
    cached_ids: FxHashSet<ModuleId>,
    /// Discovery order
    module_ids: Vec<ModuleId>,
    /// Specifiers resolved through a library root
    module_aliases: IndexMap<String, ModuleId>,
    sources: FxHashMap<ModuleId, String>,
    /// Directory of each module currently being scanned
    path_stack: Vec<String>,
    result_code: String,
}

impl Compiler {
    pub fn new(options: CompilerOptions, file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            options,
            file_system,
            combiner: Combiner::new(),
            base_dir: PathBuf::new(),
            library: LibraryLocator::new(Path::new(""), &[]),
            entry_module: None,
            cached_ids: FxHashSet::default(),
            module_ids: Vec::new(),
            module_aliases: IndexMap::new(),
            sources: FxHashMap::default(),
            path_stack: Vec::new(),
            result_code: String::new(),
        }
    }

    /// Discovers every module reachable from `entry_file` and bundles them.
    ///
    /// `entry_file` is taken relative to the configured base directory, or to the
    /// working directory when no base is configured (the base then defaults to
    /// the entry file's directory). Any unreadable module aborts the compile.
    pub fn compile(&mut self, entry_file: impl AsRef<Path>) -> Result<&mut Self> {
        self.reset();

        let entry_file = entry_file.as_ref();
        let (base_dir, entry_path) = self.locate_entry(entry_file)?;
        self.base_dir = base_dir;
        self.library = LibraryLocator::new(&self.base_dir, &self.options.library);

        let entry_module = self.entry_id(entry_file, &entry_path)?;
        info!("Compiling {} (base {})", entry_module, self.base_dir.display());

        self.entry_module = Some(entry_module.clone());
        self.cached_ids.insert(entry_module.clone());
        self.module_ids.push(entry_module.clone());
        self.fetch_module(&entry_module)?;

        self.combine(&entry_module);
        info!(
            "Bundled {} module(s), {} alias(es)",
            self.module_ids.len(),
            self.module_aliases.len()
        );

        Ok(self)
    }

    /// Modules in the order they were first discovered, entry first.
    pub fn module_list(&self) -> &[ModuleId] {
        &self.module_ids
    }

    /// The bundle text; empty until [`Compiler::compile`] succeeds.
    pub fn result_code(&self) -> &str {
        &self.result_code
    }

    pub fn aliases(&self) -> &IndexMap<String, ModuleId> {
        &self.module_aliases
    }

    pub fn entry_module(&self) -> Option<&ModuleId> {
        self.entry_module.as_ref()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn source(&self, id: &ModuleId) -> Option<&str> {
        self.sources.get(id).map(String::as_str)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    fn reset(&mut self) {
        self.entry_module = None;
        self.cached_ids.clear();
        self.module_ids.clear();
        self.module_aliases.clear();
        self.sources.clear();
        self.path_stack.clear();
        self.result_code.clear();
    }

    /// Absolute base directory and absolute entry path.
    fn locate_entry(&self, entry_file: &Path) -> Result<(PathBuf, PathBuf)> {
        match self.options.base {
            Some(ref base) => {
                let base_dir = make_absolute(base)?;
                let entry_path = base_dir.join(entry_file).clean();
                Ok((base_dir, entry_path))
            }
            None => {
                let entry_path = make_absolute(entry_file)?;
                let base_dir = entry_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("/"));
                Ok((base_dir, entry_path))
            }
        }
    }

    /// The entry is affixed as written: `./app/main` names `app/main.js`, while
    /// `app/main` and `app/` name `app/main/index.js` and `app/index.js`.
    fn entry_id(&self, entry_file: &Path, entry_path: &Path) -> Result<ModuleId> {
        let relative = pathdiff::diff_paths(entry_path, &self.base_dir).ok_or_else(|| {
            CompilationError::ConfigError(format!(
                "entry {} cannot be expressed relative to {}",
                entry_path.display(),
                self.base_dir.display()
            ))
        })?;

        // The path comes from the filesystem, the affix from the entry as typed
        let written = entry_file
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");
        if written.is_empty() {
            return Err(CompilationError::Resolve {
                module: ModuleId::new(written),
                source: ResolveError::EmptySpecifier,
            });
        }

        let path = resolve::normalize(&to_slash(&relative));
        Ok(ModuleId::new(resolve::affix(&path, &written)))
    }

    fn fetch_module(&mut self, module_id: &ModuleId) -> Result<()> {
        let path = self.base_dir.join(module_id.as_str()).clean();
        debug!("Fetching {} from {:?}", module_id, path);

        let source = self
            .file_system
            .read_file(&path)
            .map_err(|source| CompilationError::Io { path, source })?;

        self.path_stack.push(module_id.dirname().to_string());
        let scanned = if module_id.is_json() {
            Ok(())
        } else {
            self.scan_module(module_id, &source)
        };
        self.path_stack.pop();

        self.sources.insert(module_id.clone(), source);
        scanned
    }

    fn scan_module(&mut self, module_id: &ModuleId, source: &str) -> Result<()> {
        for specifier in scan_requires(source) {
            self.require_module(module_id, specifier)?;
        }
        Ok(())
    }

    fn require_module(&mut self, parent: &ModuleId, specifier: &str) -> Result<()> {
        let module_id = match self.locate_library(specifier) {
            Some(library_id) => {
                self.module_aliases
                    .insert(specifier.to_string(), library_id.clone());
                library_id
            }
            None => {
                let context = self.path_stack.last().map(String::as_str).unwrap_or("");
                resolve::resolve(specifier, context).map_err(|source| {
                    CompilationError::Resolve {
                        module: parent.clone(),
                        source,
                    }
                })?
            }
        };

        if !self.cached_ids.insert(module_id.clone()) {
            trace!("{} already discovered ({:?} in {})", module_id, specifier, parent);
            return Ok(());
        }

        debug!("{} requires {:?} -> {}", parent, specifier, module_id);
        self.module_ids.push(module_id.clone());
        self.fetch_module(&module_id)
    }

    fn locate_library(&self, specifier: &str) -> Option<ModuleId> {
        if !resolve::is_bare(specifier) {
            return None;
        }
        self.library.locate(specifier, self.file_system.as_ref())
    }

    fn combine(&mut self, entry_module: &ModuleId) {
        let modules = self.module_ids.iter().map(|id| {
            let source = self.sources.get(id).map(String::as_str).unwrap_or_default();
            (id, source)
        });
        self.result_code = self
            .combiner
            .combine(&self.module_aliases, modules, entry_module);
    }
}

fn make_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.clean());
    }
    let cwd = std::env::current_dir().map_err(|source| CompilationError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(cwd.join(path).clean())
}
