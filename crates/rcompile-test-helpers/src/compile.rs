//! Compilation helpers for RCompile tests

use rcompile_core::config::CompilerOptions;
use rcompile_core::fs::{FileSystem, RealFileSystem};
use rcompile_core::Compiler;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options rooted at `base` with the given library roots
pub fn options(base: &Path, library: &[&str]) -> CompilerOptions {
    CompilerOptions {
        base: Some(base.to_path_buf()),
        library: library.iter().map(PathBuf::from).collect(),
        ..Default::default()
    }
}

/// Compile `entry` from files on disk
///
/// # Returns
/// The finished compiler, or the error message
pub fn compile_dir(base: &Path, entry: &str, library: &[&str]) -> Result<Compiler, String> {
    compile_with(Arc::new(RealFileSystem::new()), base, entry, library)
}

/// Compile `entry` against any file system
pub fn compile_with(
    fs: Arc<dyn FileSystem>,
    base: &Path,
    entry: &str,
    library: &[&str],
) -> Result<Compiler, String> {
    let mut compiler = Compiler::new(options(base, library), fs);
    compiler.compile(entry).map_err(|e| e.to_string())?;
    Ok(compiler)
}

/// Compile `entry` from files on disk and return the bundle text
pub fn bundle_dir(base: &Path, entry: &str, library: &[&str]) -> Result<String, String> {
    compile_dir(base, entry, library).map(|compiler| compiler.result_code().to_string())
}
