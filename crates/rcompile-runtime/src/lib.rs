//! Runtime support for RCompile bundles.
//!
//! Holds the specifier resolver shared by the compiler and the loader, the
//! JavaScript loader prelude embedded into every bundle, and an in-process
//! [`Loader`] implementing the same loading rules.

pub mod loader;
pub mod prelude;
pub mod resolve;

pub use loader::{Loader, LoaderError, ModuleContext, ModuleValue, Require, MAX_REQUIRE_DEPTH};
pub use prelude::{LOADER_FACTORY, LOADER_HANDLE, LOADER_PRELUDE};
pub use resolve::{resolve, ModuleId, ResolveError};
