pub mod combiner;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod fs;
pub mod library;
pub mod scanner;

pub use combiner::Combiner;
pub use compiler::Compiler;
pub use config::{CliOverrides, CompilerConfig, CompilerOptions, CONFIG_FILE_NAME};
pub use errors::CompilationError;
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use library::LibraryLocator;
pub use scanner::scan_requires;

pub use rcompile_runtime::{ModuleId, ResolveError};
