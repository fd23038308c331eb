use rcompile_runtime::{ModuleId, ResolveError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid specifier in {module}: {source}")]
    Resolve {
        module: ModuleId,
        #[source]
        source: ResolveError,
    },

    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, CompilationError>;
