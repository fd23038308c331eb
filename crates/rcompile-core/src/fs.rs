//! File system access used by the compiler.
//!
//! The compiler only ever reads module sources and checks whether library
//! candidates exist, so that is all the trait covers.

use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};

pub trait FileSystem: Send + Sync {
    fn read_file(&self, path: &Path) -> io::Result<String>;

    fn is_file(&self, path: &Path) -> bool;
}

/// Reads from the real disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory file tree for tests. Paths are compared after lexical cleaning.
#[derive(Debug, Default, Clone)]
pub struct MockFileSystem {
    files: FxHashMap<PathBuf, String>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(path.as_ref().clean(), content.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.add_file(path, content);
        self
    }
}

impl FileSystem for MockFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.files.get(&path.clean()).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )
        })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&path.clean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_paths_are_cleaned() {
        let fs = MockFileSystem::new().with_file("/project/lib/a.js", "a");

        assert!(fs.is_file(Path::new("/project/./lib/../lib/a.js")));
        assert_eq!(
            fs.read_file(Path::new("/project/src/../lib/a.js")).unwrap(),
            "a"
        );
    }

    #[test]
    fn test_mock_missing_file_is_not_found() {
        let fs = MockFileSystem::new();
        let err = fs.read_file(Path::new("/nope.js")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!fs.is_file(Path::new("/nope.js")));
    }
}
