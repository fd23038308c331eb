use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use rcompile_core::config::{CliOverrides, CompilerConfig, CompilerOptions, CONFIG_FILE_NAME};
use rcompile_core::fs::RealFileSystem;
use rcompile_core::Compiler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod compress;

/// RCompile - bundle require()-style JavaScript modules into a single file
#[derive(Parser, Debug, Clone)]
#[command(name = "rcompile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Entry files to bundle
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Base directory module ids are relative to (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    base: Option<PathBuf>,

    /// Library root for bare specifiers (repeatable or comma-separated, last wins)
    #[arg(short, long, value_name = "DIR", value_delimiter = ',')]
    library: Vec<PathBuf>,

    /// Compress the bundle
    #[arg(short, long)]
    compress: bool,

    /// Write the bundle to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to rcompile.json configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Write a default rcompile.json to the current directory
    #[arg(long)]
    init: bool,

    /// Print the discovered modules as JSON instead of the bundle
    #[arg(long)]
    list: bool,

    /// Log compiler progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the bundle, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.init {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        CompilerConfig::init_file(&path)?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let (config, files) = load_config_and_files(&cli)?;

    if files.is_empty() {
        eprintln!("Error: No input files. Use --help for usage information.");
        std::process::exit(1);
    }

    let options = resolve_options(config.compiler_options)?;
    info!("Input files: {} file(s)", files.len());
    debug!("Options: {:?}", options);

    let compilers = compile_all(&files, &options)?;

    let output = if cli.list {
        manifest(&compilers)?
    } else {
        let code = compilers
            .iter()
            .map(Compiler::result_code)
            .collect::<Vec<_>>()
            .join("\n\n");
        if options.compress {
            compress::compress(&code)
        } else {
            code
        }
    };

    match options.out_file {
        Some(ref out_file) => write_output(Path::new(out_file), &output)?,
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file (if specified) and resolve input files
fn load_config_and_files(cli: &Cli) -> anyhow::Result<(CompilerConfig, Vec<PathBuf>)> {
    let mut config = if let Some(ref project_path) = cli.project {
        CompilerConfig::from_file(project_path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        let default_path = PathBuf::from(CONFIG_FILE_NAME);
        if default_path.exists() {
            CompilerConfig::from_file(&default_path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", CONFIG_FILE_NAME, e))?
        } else {
            CompilerConfig::default()
        }
    };

    let overrides = CliOverrides {
        base: cli.base.clone(),
        library: Some(cli.library.clone()),
        compress: cli.compress.then_some(true),
        out_file: cli
            .output
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
    };
    config.merge(&overrides);

    let files = if !cli.files.is_empty() {
        cli.files.clone()
    } else {
        config.entries.iter().map(PathBuf::from).collect()
    };

    Ok((config, files))
}

/// The command line roots module ids at the working directory by default.
fn resolve_options(mut options: CompilerOptions) -> anyhow::Result<CompilerOptions> {
    if options.base.is_none() {
        let cwd = std::env::current_dir().context("Failed to read the working directory")?;
        options.base = Some(cwd);
    }
    Ok(options)
}

/// Compile every entry independently, keeping the input order
fn compile_all(files: &[PathBuf], options: &CompilerOptions) -> anyhow::Result<Vec<Compiler>> {
    let file_system = Arc::new(RealFileSystem::new());

    files
        .par_iter()
        .map(|file| {
            let mut compiler = Compiler::new(options.clone(), file_system.clone());
            compiler
                .compile(file)
                .with_context(|| format!("Failed to compile {}", file.display()))?;
            Ok(compiler)
        })
        .collect()
}

fn manifest(compilers: &[Compiler]) -> anyhow::Result<String> {
    let entries: Vec<serde_json::Value> = compilers
        .iter()
        .map(|compiler| {
            serde_json::json!({
                "entry": compiler.entry_module().map(|id| id.as_str()),
                "modules": compiler
                    .module_list()
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>(),
                "aliases": compiler
                    .aliases()
                    .iter()
                    .map(|(specifier, id)| (specifier.clone(), serde_json::Value::from(id.as_str())))
                    .collect::<serde_json::Map<_, _>>(),
            })
        })
        .collect();

    let mut text = serde_json::to_string_pretty(&entries)?;
    text.push('\n');
    Ok(text)
}

fn write_output(path: &Path, output: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, output).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
