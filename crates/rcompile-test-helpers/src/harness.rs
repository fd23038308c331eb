//! Executes bundles without a JavaScript engine.
//!
//! Module bodies used in tests are restricted to a handful of statement
//! shapes, one per line:
//!
//! ```text
//! exports.FIELD = <expr>;
//! module.exports = <expr>;
//! return <expr>;
//! require("NAME");
//! ```
//!
//! where `<expr>` is a JSON literal or `require("NAME")` optionally followed by
//! `.FIELD`. Every other line is ignored. [`run_bundle`] loads the factories of a
//! bundle into a [`Loader`]; [`run_unbundled`] evaluates the same sources
//! straight from disk, resolving each `require` when it runs.

use once_cell::sync::Lazy;
use rcompile_core::{LibraryLocator, RealFileSystem};
use rcompile_runtime::resolve::{self, is_bare, ModuleId};
use rcompile_runtime::{Loader, LoaderError, ModuleValue, MAX_REQUIRE_DEPTH};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const QUOTED: &str = r#""(?:[^"\\]|\\.)*""#;

static ALIAS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^__rcompile\.alias\(({q}), ({q})\);$", q = QUOTED))
        .expect("alias pattern")
});

static SET_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^__rcompile\.set\(({q}), function \(require, exports, module\) \{{\n",
        q = QUOTED
    ))
    .expect("set pattern")
});

pub(crate) static RUN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^__rcompile\.run\(({q})\);$", q = QUOTED)).expect("run pattern")
});

static REQUIRE_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^require\(\s*["']([^"']+)["']\s*\)(?:\.(\w+))?$"#).expect("require pattern")
});

/// Exported value of a harness module.
#[derive(Debug, Clone, PartialEq)]
pub struct Exported(pub Value);

impl ModuleValue for Exported {
    fn empty_exports() -> Self {
        Exported(Value::Object(Map::new()))
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Require {
        specifier: String,
        field: Option<String>,
    },
}

#[derive(Debug, Clone)]
enum Statement {
    SetExport(String, Expr),
    ReplaceExports(Expr),
    Return(Expr),
    Evaluate(Expr),
}

fn parse_expr(text: &str) -> Option<Expr> {
    let text = text.trim();
    if let Some(captures) = REQUIRE_EXPR.captures(text) {
        return Some(Expr::Require {
            specifier: captures[1].to_string(),
            field: captures.get(2).map(|m| m.as_str().to_string()),
        });
    }
    serde_json::from_str(text).ok().map(Expr::Literal)
}

fn parse_statements(source: &str) -> Vec<Statement> {
    source
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let line = line.strip_suffix(';').unwrap_or(line);

            if let Some(rest) = line.strip_prefix("module.exports") {
                let rest = rest.trim_start().strip_prefix('=')?;
                return parse_expr(rest).map(Statement::ReplaceExports);
            }
            if let Some(rest) = line.strip_prefix("exports.") {
                let (name, rest) = rest.split_once('=')?;
                return parse_expr(rest).map(|e| Statement::SetExport(name.trim().to_string(), e));
            }
            if let Some(rest) = line.strip_prefix("return ") {
                return parse_expr(rest).map(Statement::Return);
            }
            if line.starts_with("require(") {
                return parse_expr(line).map(Statement::Evaluate);
            }
            None
        })
        .collect()
}

fn parse_json_module(source: &str) -> Option<Value> {
    let body = source.trim();
    let body = body
        .strip_prefix("return (")
        .and_then(|b| b.strip_suffix(");"))
        .unwrap_or(body);
    serde_json::from_str(body).ok()
}

fn evaluate<E>(
    expr: &Expr,
    require: &mut dyn FnMut(&str) -> Result<Exported, E>,
) -> Result<Exported, E> {
    match expr {
        Expr::Literal(value) => Ok(Exported(value.clone())),
        Expr::Require { specifier, field } => {
            let value = require(specifier.as_str())?;
            Ok(match field {
                Some(field) => Exported(value.0.get(field).cloned().unwrap_or(Value::Null)),
                None => value,
            })
        }
    }
}

fn execute<E>(
    statements: &[Statement],
    exports: &mut Exported,
    require: &mut dyn FnMut(&str) -> Result<Exported, E>,
    fail: &dyn Fn(String) -> E,
) -> Result<Option<Exported>, E> {
    for statement in statements {
        match statement {
            Statement::SetExport(name, expr) => {
                let value = evaluate(expr, require)?;
                match exports.0.as_object_mut() {
                    Some(object) => {
                        object.insert(name.clone(), value.0);
                    }
                    None => return Err(fail(format!("cannot set {} on non-object exports", name))),
                }
            }
            Statement::ReplaceExports(expr) => *exports = evaluate(expr, require)?,
            Statement::Return(expr) => return evaluate(expr, require).map(Some),
            Statement::Evaluate(expr) => {
                evaluate(expr, require)?;
            }
        }
    }
    Ok(None)
}

fn parse_quoted(text: &str) -> Result<String, String> {
    serde_json::from_str(text).map_err(|e| format!("bad string literal {}: {}", text, e))
}

/// A bundle split back into its parts.
#[derive(Debug, Clone, Default)]
pub struct ParsedBundle {
    pub aliases: Vec<(String, ModuleId)>,
    pub modules: Vec<(ModuleId, String)>,
    pub entry: Option<ModuleId>,
}

pub fn parse_bundle(bundle: &str) -> Result<ParsedBundle, String> {
    let mut parsed = ParsedBundle::default();

    for captures in ALIAS_LINE.captures_iter(bundle) {
        parsed.aliases.push((
            parse_quoted(&captures[1])?,
            ModuleId::new(parse_quoted(&captures[2])?),
        ));
    }

    let run = RUN_LINE
        .captures(bundle)
        .ok_or_else(|| "bundle has no run statement".to_string())?;
    let run_start = run.get(0).map(|m| m.start()).unwrap_or(bundle.len());
    parsed.entry = Some(ModuleId::new(parse_quoted(&run[1])?));

    let headers: Vec<_> = SET_HEADER.captures_iter(bundle).collect();
    for (index, header) in headers.iter().enumerate() {
        let whole = header.get(0).ok_or("empty match")?;
        let end = headers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(run_start);
        let body = &bundle[whole.end()..end];
        let body = body.strip_suffix("\n});\n\n").unwrap_or(body);
        parsed
            .modules
            .push((ModuleId::new(parse_quoted(&header[1])?), body.to_string()));
    }

    Ok(parsed)
}

/// Loads every factory of `bundle` into a fresh loader.
pub fn load_bundle(bundle: &str) -> Result<(Loader<Exported>, ModuleId), String> {
    let parsed = parse_bundle(bundle)?;
    let mut loader = Loader::new();

    for (specifier, id) in parsed.aliases {
        loader.alias(specifier, id);
    }

    for (id, body) in parsed.modules {
        if id.is_json() {
            let value = parse_json_module(&body)
                .ok_or_else(|| format!("{} does not hold valid JSON", id))?;
            loader.set(id, move |_, _| Ok(Some(Exported(value.clone()))));
        } else {
            let statements = parse_statements(&body);
            loader.set(id, move |require, module| {
                let mut exports = module.exports.clone();
                let failed_id = module.id.clone();
                let result = execute(
                    &statements,
                    &mut exports,
                    &mut |specifier: &str| require.require(specifier),
                    &|message: String| LoaderError::Factory {
                        id: failed_id.clone(),
                        message,
                    },
                );
                module.exports = exports;
                result
            });
        }
    }

    let entry = parsed
        .entry
        .ok_or_else(|| "bundle has no entry".to_string())?;
    Ok((loader, entry))
}

/// Runs a bundle and returns the entry module's exports.
pub fn run_bundle(bundle: &str) -> Result<Value, LoaderError> {
    let (mut loader, entry) = load_bundle(bundle).map_err(|message| LoaderError::Factory {
        id: ModuleId::new("<bundle>"),
        message,
    })?;
    loader.run(&entry).map(|exported| exported.0)
}

struct Unbundled {
    base_dir: PathBuf,
    library: LibraryLocator,
    instances: HashMap<ModuleId, Exported>,
    contexts: Vec<String>,
}

impl Unbundled {
    fn require(&mut self, specifier: &str) -> Result<Exported, String> {
        let context = self.contexts.last().map(String::as_str).unwrap_or("");
        let library_id = if is_bare(specifier) {
            self.library.locate(specifier, &RealFileSystem)
        } else {
            None
        };
        let id = match library_id {
            Some(id) => id,
            None => resolve::resolve(specifier, context).map_err(|e| e.to_string())?,
        };
        self.get(&id)
    }

    fn get(&mut self, id: &ModuleId) -> Result<Exported, String> {
        if let Some(value) = self.instances.get(id) {
            return Ok(value.clone());
        }
        if self.contexts.len() > MAX_REQUIRE_DEPTH {
            return Err(format!("require depth exceeded while loading {}", id));
        }

        let source = std::fs::read_to_string(self.base_dir.join(id.as_str()))
            .map_err(|_| format!("undefined module: {}", id))?;

        let value = if id.is_json() {
            Exported(serde_json::from_str(&source).map_err(|e| format!("{}: {}", id, e))?)
        } else {
            let statements = parse_statements(&source);
            let mut exports = Exported::empty_exports();
            self.contexts.push(id.dirname().to_string());
            let returned = execute(
                &statements,
                &mut exports,
                &mut |specifier: &str| self.require(specifier),
                &|message: String| message,
            );
            self.contexts.pop();
            returned?.unwrap_or(exports)
        };

        self.instances.insert(id.clone(), value.clone());
        Ok(value)
    }
}

/// Evaluates `entry` from the files under `base_dir` without bundling.
pub fn run_unbundled(base_dir: &Path, entry: &str, library: &[PathBuf]) -> Result<Value, String> {
    let mut unbundled = Unbundled {
        base_dir: base_dir.to_path_buf(),
        library: LibraryLocator::new(base_dir, library),
        instances: HashMap::new(),
        contexts: vec![String::new()],
    };
    let entry = resolve::resolve(entry, "").map_err(|e| e.to_string())?;
    unbundled.get(&entry).map(|exported| exported.0)
}
