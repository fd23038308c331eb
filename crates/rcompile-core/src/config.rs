use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CompilationError;

/// Default configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "rcompile.json";

/// Options that control module resolution and bundle output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Base directory module ids are relative to (default: entry file's directory)
    #[serde(default)]
    pub base: Option<PathBuf>,

    /// Library roots searched for bare specifiers; later roots take priority
    #[serde(default)]
    pub library: Vec<PathBuf>,

    /// Compress the bundle before writing it (default: false)
    #[serde(default)]
    pub compress: bool,

    /// Output file (default: stdout)
    #[serde(default)]
    pub out_file: Option<String>,
}

/// Main compiler configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Compiler options
    #[serde(default)]
    pub compiler_options: CompilerOptions,

    /// Entry files compiled when none are given on the command line
    #[serde(default)]
    pub entries: Vec<String>,
}

/// Values given on the command line, applied over the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base: Option<PathBuf>,
    pub library: Option<Vec<PathBuf>>,
    pub compress: Option<bool>,
    pub out_file: Option<String>,
}

impl CompilerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, CompilationError> {
        let content = std::fs::read_to_string(path).map_err(|source| CompilationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| CompilationError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), CompilationError> {
        let config = CompilerConfig::default();
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| CompilationError::ConfigError(e.to_string()))?;
        std::fs::write(path, json).map_err(|source| CompilationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        let options = &mut self.compiler_options;

        if let Some(ref base) = overrides.base {
            options.base = Some(base.clone());
        }
        if let Some(ref library) = overrides.library {
            if !library.is_empty() {
                options.library = library.clone();
            }
        }
        if let Some(compress) = overrides.compress {
            options.compress = compress;
        }
        if let Some(ref out_file) = overrides.out_file {
            options.out_file = Some(out_file.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompilerConfig::default();
        assert!(config.compiler_options.base.is_none());
        assert!(config.compiler_options.library.is_empty());
        assert!(!config.compiler_options.compress);
        assert!(config.entries.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = CompilerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("compilerOptions"));
        assert!(json.contains("outFile"));
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "compilerOptions": {
                "base": "src",
                "library": ["vendor", "lib"],
                "compress": true
            },
            "entries": ["main.js"]
        }"#;
        let config: CompilerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.compiler_options.base, Some(PathBuf::from("src")));
        assert_eq!(
            config.compiler_options.library,
            vec![PathBuf::from("vendor"), PathBuf::from("lib")]
        );
        assert!(config.compiler_options.compress);
        assert_eq!(config.entries, vec!["main.js".to_string()]);
    }

    #[test]
    fn test_merge_prefers_cli_values() {
        let mut config = CompilerConfig::default();
        config.compiler_options.library = vec![PathBuf::from("lib")];
        config.compiler_options.out_file = Some("dist/a.js".to_string());

        config.merge(&CliOverrides {
            base: Some(PathBuf::from("app")),
            library: Some(vec![]),
            compress: Some(true),
            out_file: None,
        });

        assert_eq!(config.compiler_options.base, Some(PathBuf::from("app")));
        assert_eq!(config.compiler_options.library, vec![PathBuf::from("lib")]);
        assert!(config.compiler_options.compress);
        assert_eq!(config.compiler_options.out_file.as_deref(), Some("dist/a.js"));
    }

    #[test]
    fn test_from_file_reports_bad_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let err = CompilerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CompilationError::ConfigError(_)));
    }

    #[test]
    fn test_init_file_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        CompilerConfig::init_file(&path).unwrap();
        assert_eq!(
            CompilerConfig::from_file(&path).unwrap(),
            CompilerConfig::default()
        );
    }
}
