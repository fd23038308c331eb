//! Test fixtures - module graphs on disk for testing

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project directory, removed when dropped.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Adds a file, creating parent directories as needed.
    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture directory");
        }
        std::fs::write(&path, content).expect("failed to write fixture");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Two modules sharing one dependency.
pub fn diamond_project() -> Project {
    Project::new()
        .file(
            "main.js",
            "exports.left = require(\"./left\").name;\nexports.right = require(\"./right\").name;\n",
        )
        .file("left.js", "exports.name = require(\"./shared\").value;\n")
        .file("right.js", "exports.name = require(\"./shared\").value;\n")
        .file("shared.js", "exports.value = \"shared\";\n")
}

/// Two modules requiring each other.
pub fn cycle_project() -> Project {
    Project::new()
        .file("a.js", "exports.name = \"a\";\nrequire(\"./b\");\n")
        .file("b.js", "exports.name = \"b\";\nrequire(\"./a\");\n")
}

/// A program using one library module from `vendor` and one from `lib`.
pub fn library_project() -> Project {
    Project::new()
        .file(
            "app/main.js",
            "exports.format = require(\"format\").name;\nexports.config = require(\"./config.json\");\n",
        )
        .file("app/config.json", "{ \"debug\": false }\n")
        .file("vendor/format.js", "exports.name = \"vendor-format\";\n")
        .file("lib/format/index.js", "exports.name = \"lib-format\";\n")
        .file("lib/format/helper.js", "exports.name = \"helper\";\n")
}

/// Nested directories with `..` and directory requires.
pub fn nested_project() -> Project {
    Project::new()
        .file(
            "main.js",
            "exports.widget = require(\"./ui/widget\").label;\nexports.root = require(\"./ui/\").name;\n",
        )
        .file("ui/index.js", "exports.name = \"ui\";\n")
        .file(
            "ui/widget.js",
            "exports.label = require(\"../text/labels\").widget;\n",
        )
        .file("text/labels.js", "exports.widget = \"Widget\";\n")
}
