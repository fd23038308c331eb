//! Runs generated JavaScript under a `node` executable, when one is installed.
//!
//! Tests that need a real engine call [`node_available`] first and return
//! early without it.

use crate::harness::RUN_LINE;
use rcompile_runtime::{LOADER_FACTORY, LOADER_PRELUDE};
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};

pub fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Feeds `script` to `node` on stdin and returns what it printed.
pub fn run_node(script: &str) -> Result<String, String> {
    let mut child = Command::new("node")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to start node: {}", e))?;

    child
        .stdin
        .take()
        .ok_or("node stdin is closed")?
        .write_all(script.as_bytes())
        .map_err(|e| format!("failed to write script: {}", e))?;

    let output = child
        .wait_with_output()
        .map_err(|e| format!("node did not finish: {}", e))?;
    if !output.status.success() {
        return Err(format!(
            "node exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    String::from_utf8(output.stdout).map_err(|e| e.to_string())
}

/// Resolves each `(specifier, context)` pair with the loader prelude's own
/// `resolve`. Failures come back as `error: <message>`.
pub fn prelude_resolve(cases: &[(String, String)]) -> Result<Vec<String>, String> {
    let cases = serde_json::to_string(cases).map_err(|e| e.to_string())?;
    let script = format!(
        "{prelude}\n\
         var loader = {factory}(this);\n\
         var results = {cases}.map(function (c) {{\n\
         \x20   try {{ return loader.resolve(c[0], c[1]); }}\n\
         \x20   catch (e) {{ return 'error: ' + e.message; }}\n\
         }});\n\
         process.stdout.write(JSON.stringify(results));\n",
        prelude = LOADER_PRELUDE,
        factory = LOADER_FACTORY,
        cases = cases,
    );

    let output = run_node(&script)?;
    serde_json::from_str(&output).map_err(|e| format!("bad node output {:?}: {}", output, e))
}

/// Executes a whole bundle and returns the entry module's exports as JSON.
pub fn run_bundle(bundle: &str) -> Result<Value, String> {
    if !RUN_LINE.is_match(bundle) {
        return Err("bundle has no run statement".to_string());
    }
    let mut script = RUN_LINE
        .replace(bundle, "globalThis.__rcompileEntry = $0")
        .into_owned();
    script.push_str("process.stdout.write(JSON.stringify(globalThis.__rcompileEntry));\n");

    let output = run_node(&script)?;
    serde_json::from_str(&output).map_err(|e| format!("bad node output {:?}: {}", output, e))
}
