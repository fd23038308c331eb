//! Mock implementations for testing

use rcompile_core::fs::{FileSystem, MockFileSystem};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A mock file system that counts reads per path
#[derive(Debug, Default)]
pub struct CountingFileSystem {
    inner: MockFileSystem,
    reads: Mutex<HashMap<PathBuf, usize>>,
}

impl CountingFileSystem {
    pub fn new(inner: MockFileSystem) -> Self {
        Self {
            inner,
            reads: Mutex::new(HashMap::new()),
        }
    }

    pub fn reads(&self, path: impl AsRef<Path>) -> usize {
        self.reads
            .lock()
            .unwrap()
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }
}

impl FileSystem for CountingFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        *self
            .reads
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_insert(0) += 1;
        self.inner.read_file(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }
}
