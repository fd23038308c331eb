//! In-process module loader.
//!
//! [`Loader`] is the Rust counterpart of the JavaScript loader in
//! [`crate::prelude`]: one explicitly constructed context holding aliases,
//! module factories, memoized instances and the path context stack. Factories
//! are plain closures, which makes it usable as an execution harness for
//! bundles and for checking that compiler output resolves at load time.

use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::resolve::{self, ModuleId, ResolveError};

/// Nesting limit for module instantiation.
///
/// Circular requires re-enter a module factory; past this depth the loader
/// reports [`LoaderError::DepthExceeded`] rather than exhausting the stack.
pub const MAX_REQUIRE_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// The bundle has no definition for an id the loader resolved. This means
    /// the compiler and the loader disagree on resolution.
    #[error("undefined module: {0}")]
    UndefinedModule(ModuleId),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("module {id} failed: {message}")]
    Factory { id: ModuleId, message: String },

    #[error("require depth exceeded {limit} while loading {id}")]
    DepthExceeded { id: ModuleId, limit: usize },
}

pub type Result<T> = std::result::Result<T, LoaderError>;

/// Values a module can export.
pub trait ModuleValue: Clone {
    /// Fresh `exports` object handed to each factory.
    fn empty_exports() -> Self;

    /// Whether [`Loader::run`] should invoke this value.
    fn is_invocable(&self) -> bool {
        false
    }

    fn invoke(&self) -> Result<()> {
        Ok(())
    }
}

/// The `module` argument of a factory.
#[derive(Debug, Clone)]
pub struct ModuleContext<V> {
    pub id: ModuleId,
    pub exports: V,
}

impl<V> ModuleContext<V> {
    pub fn fail(&self, message: impl Into<String>) -> LoaderError {
        LoaderError::Factory {
            id: self.id.clone(),
            message: message.into(),
        }
    }
}

/// The `require` argument of a factory, bound to the loader running it.
pub struct Require<'a, V> {
    loader: &'a mut Loader<V>,
}

impl<V: ModuleValue> Require<'_, V> {
    pub fn require(&mut self, specifier: &str) -> Result<V> {
        self.loader.require(specifier)
    }
}

/// A module definition. Returning `Some` exports that value, `None` exports
/// whatever `module.exports` holds when the factory returns.
pub type Factory<V> = Rc<dyn Fn(&mut Require<'_, V>, &mut ModuleContext<V>) -> Result<Option<V>>>;

pub struct Loader<V> {
    aliases: HashMap<String, ModuleId>,
    definitions: HashMap<ModuleId, Factory<V>>,
    instances: HashMap<ModuleId, V>,
    contexts: Vec<String>,
}

impl<V: ModuleValue> Default for Loader<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ModuleValue> Loader<V> {
    pub fn new() -> Self {
        Self {
            aliases: HashMap::new(),
            definitions: HashMap::new(),
            instances: HashMap::new(),
            contexts: vec![String::new()],
        }
    }

    /// Registers a specifier resolved at compile time through a library root.
    pub fn alias(&mut self, specifier: impl Into<String>, id: ModuleId) {
        self.aliases.insert(specifier.into(), id);
    }

    /// Registers the factory for `id`.
    pub fn set<F>(&mut self, id: ModuleId, factory: F)
    where
        F: Fn(&mut Require<'_, V>, &mut ModuleContext<V>) -> Result<Option<V>> + 'static,
    {
        self.definitions.insert(id, Rc::new(factory));
    }

    pub fn is_instantiated(&self, id: &ModuleId) -> bool {
        self.instances.contains_key(id)
    }

    /// Directory of the innermost module being instantiated.
    pub fn context(&self) -> &str {
        self.contexts.last().map(String::as_str).unwrap_or("")
    }

    /// The id `specifier` names from the current context.
    pub fn resolve(&self, specifier: &str) -> Result<ModuleId> {
        match self.aliases.get(specifier) {
            Some(id) => Ok(id.clone()),
            None => Ok(resolve::resolve(specifier, self.context())?),
        }
    }

    pub fn require(&mut self, specifier: &str) -> Result<V> {
        let id = self.resolve(specifier)?;
        self.get(&id)
    }

    /// Returns the memoized value for `id`, instantiating the module on first use.
    pub fn get(&mut self, id: &ModuleId) -> Result<V> {
        if let Some(value) = self.instances.get(id) {
            return Ok(value.clone());
        }

        let factory = match self.definitions.get(id) {
            Some(factory) => Rc::clone(factory),
            None => return Err(LoaderError::UndefinedModule(id.clone())),
        };

        if self.contexts.len() > MAX_REQUIRE_DEPTH {
            return Err(LoaderError::DepthExceeded {
                id: id.clone(),
                limit: MAX_REQUIRE_DEPTH,
            });
        }

        let mut module = ModuleContext {
            id: id.clone(),
            exports: V::empty_exports(),
        };

        self.contexts.push(id.dirname().to_string());
        let returned = factory(&mut Require { loader: self }, &mut module);
        self.contexts.pop();

        let value = returned?.unwrap_or(module.exports);
        self.instances.insert(id.clone(), value.clone());
        Ok(value)
    }

    /// Boots the entry module. Invocable values are called with no arguments.
    pub fn run(&mut self, id: &ModuleId) -> Result<V> {
        let value = self.get(id)?;
        if value.is_invocable() {
            value.invoke()?;
        }
        Ok(value)
    }
}
