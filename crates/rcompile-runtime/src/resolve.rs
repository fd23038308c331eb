//! Specifier resolution.
//!
//! This is the single resolution algorithm used by the compiler while it walks
//! the module graph and by the loader while a bundle executes. The JavaScript
//! loader in [`crate::prelude`] mirrors these functions statement for statement;
//! any change here has to be carried over there.

use std::fmt;
use thiserror::Error;

/// Extension appended to relative specifiers that name a file.
pub const DEFAULT_EXTENSION: &str = ".js";

/// File loaded for specifiers that name a directory.
pub const INDEX_FILE: &str = "index.js";

/// Extensions a module id may already carry.
pub const MODULE_EXTENSIONS: [&str; 2] = [".js", ".json"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("empty module specifier")]
    EmptySpecifier,
}

/// Canonical identity of a module inside one compilation.
///
/// A normalized, slash separated path relative to the compile base directory.
/// Two ids name the same module iff their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Wraps an already canonical id. Use [`resolve`] to build one from a specifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path context modules inside this one resolve against.
    pub fn dirname(&self) -> &str {
        dirname(&self.0)
    }

    pub fn is_json(&self) -> bool {
        self.0.ends_with(".json")
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `./x`, `../x`, `.`, `..`
pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.')
}

/// `/x`. Rooted at the compile base directory, not at the filesystem root.
pub fn is_absolute(specifier: &str) -> bool {
    specifier.starts_with('/')
}

/// Neither relative nor absolute; candidates for library lookup. When no library
/// root has them they resolve against the context like relative specifiers.
pub fn is_bare(specifier: &str) -> bool {
    !is_relative(specifier) && !is_absolute(specifier)
}

/// Resolves `specifier` against the directory `context` (itself a module id prefix,
/// `""` for the base root).
///
/// Relative and bare specifiers join the context. Absolute specifiers are rooted at
/// the base directory. Only the specifier's own form decides between `.js` and
/// `index.js`, so a bare `util` still names a directory.
pub fn resolve(specifier: &str, context: &str) -> Result<ModuleId, ResolveError> {
    if specifier.is_empty() {
        return Err(ResolveError::EmptySpecifier);
    }

    let joined = if !is_absolute(specifier) && !context.is_empty() {
        format!("{}/{}", context, specifier)
    } else {
        specifier.to_string()
    };

    Ok(ModuleId(affix(&normalize(&joined), specifier)))
}

/// Lexically normalizes a slash separated path.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment. A `..`
/// with nothing left to remove is kept, so paths may climb out of the base root.
/// A trailing slash survives normalization.
pub fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match stack.last() {
                Some(&last) if last != ".." => {
                    stack.pop();
                }
                _ => stack.push(".."),
            },
            _ => stack.push(segment),
        }
    }

    let mut normalized = stack.join("/");
    if path.ends_with('/') && !normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Appends the default extension or index file to a resolved path.
///
/// `specifier` is the text as written at the call site; it decides whether the
/// path names a file (`./a` -> `a.js`) or a directory (`./a/`, `util` -> `index.js`).
pub fn affix(path: &str, specifier: &str) -> String {
    if has_module_extension(path) {
        return path.to_string();
    }

    let mut affixed = path.to_string();
    if is_relative(specifier) && !names_directory(specifier) {
        affixed.push_str(DEFAULT_EXTENSION);
    } else {
        if !affixed.is_empty() && !affixed.ends_with('/') {
            affixed.push('/');
        }
        affixed.push_str(INDEX_FILE);
    }
    affixed
}

/// Directory part of a module id, `""` for ids at the base root.
pub fn dirname(id: &str) -> &str {
    match id.rfind('/') {
        Some(index) => &id[..index],
        None => "",
    }
}

fn has_module_extension(path: &str) -> bool {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    MODULE_EXTENSIONS
        .iter()
        .any(|extension| file_name.ends_with(extension))
}

fn names_directory(specifier: &str) -> bool {
    let last = specifier.rsplit('/').next().unwrap_or(specifier);
    matches!(last, "" | "." | "..")
}
