//! Bundle assembly.
//!
//! The artifact is one self-invoking function holding the loader prelude, the
//! alias table, one factory per module and a final `run` of the entry module.
//! Module sources are embedded verbatim.

use indexmap::IndexMap;
use rcompile_runtime::{ModuleId, LOADER_FACTORY, LOADER_HANDLE, LOADER_PRELUDE};

#[derive(Debug, Clone)]
pub struct Combiner {
    prelude: String,
}

impl Default for Combiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Combiner {
    pub fn new() -> Self {
        Self::with_prelude(LOADER_PRELUDE)
    }

    /// The prelude must define `__rcompileLoader(host)`.
    pub fn with_prelude(prelude: impl Into<String>) -> Self {
        Self {
            prelude: prelude.into(),
        }
    }

    pub fn combine<'a>(
        &self,
        aliases: &IndexMap<String, ModuleId>,
        modules: impl IntoIterator<Item = (&'a ModuleId, &'a str)>,
        entry: &ModuleId,
    ) -> String {
        let mut out = String::with_capacity(self.prelude.len() + 256);

        out.push_str("(function () {\n");
        out.push_str(&self.prelude);
        if !self.prelude.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&format!(
            "var {} = {}(this);\n\n",
            LOADER_HANDLE, LOADER_FACTORY
        ));

        for (specifier, id) in aliases {
            out.push_str(&format!(
                "{}.alias({}, {});\n",
                LOADER_HANDLE,
                js_string(specifier),
                js_string(id.as_str())
            ));
        }
        if !aliases.is_empty() {
            out.push('\n');
        }

        for (id, source) in modules {
            out.push_str(&format!(
                "{}.set({}, function (require, exports, module) {{\n",
                LOADER_HANDLE,
                js_string(id.as_str())
            ));
            if id.is_json() {
                out.push_str("return (\n");
                out.push_str(source);
                out.push_str("\n);\n");
            } else {
                out.push_str(source);
                out.push('\n');
            }
            out.push_str("});\n\n");
        }

        out.push_str(&format!(
            "{}.run({});\n",
            LOADER_HANDLE,
            js_string(entry.as_str())
        ));
        out.push_str("}).call(this);\n");
        out
    }
}

/// Double-quoted JavaScript string literal.
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(text: &str) -> ModuleId {
        ModuleId::new(text)
    }

    #[test]
    fn test_bundle_layout() {
        let main = id("main.js");
        let util = id("lib/util.js");
        let mut aliases = IndexMap::new();
        aliases.insert("util".to_string(), util.clone());

        let modules = vec![
            (&main, "var util = require(\"util\");\nexports.ok = util.ok;"),
            (&util, "exports.ok = true;"),
        ];

        let bundle = Combiner::with_prelude("// loader\n").combine(&aliases, modules, &main);

        insta::assert_snapshot!(bundle.trim_end(), @r###"
(function () {
// loader

var __rcompile = __rcompileLoader(this);

__rcompile.alias("util", "lib/util.js");

__rcompile.set("main.js", function (require, exports, module) {
var util = require("util");
exports.ok = util.ok;
});

__rcompile.set("lib/util.js", function (require, exports, module) {
exports.ok = true;
});

__rcompile.run("main.js");
}).call(this);
"###);
    }

    #[test]
    fn test_json_modules_return_their_value() {
        let main = id("main.js");
        let data = id("data.json");
        let modules = vec![(&main, "module.exports = require('./data.json');"), (&data, "{\"a\": 1}")];

        let bundle = Combiner::with_prelude("").combine(&IndexMap::new(), modules, &main);

        assert!(bundle.contains(
            "__rcompile.set(\"data.json\", function (require, exports, module) {\nreturn (\n{\"a\": 1}\n);\n});"
        ));
        assert!(!bundle.contains("__rcompile.alias("));
    }

    #[test]
    fn test_ids_are_escaped() {
        let odd = id("we\"ird\\name.js");
        let bundle = Combiner::with_prelude("").combine(&IndexMap::new(), vec![(&odd, "")], &odd);

        assert!(bundle.contains(r#"__rcompile.run("we\"ird\\name.js");"#));
    }

    #[test]
    fn test_default_prelude_is_embedded() {
        let main = id("main.js");
        let bundle = Combiner::new().combine(&IndexMap::new(), vec![(&main, "")], &main);

        assert!(bundle.starts_with("(function () {\n"));
        assert!(bundle.contains(LOADER_PRELUDE));
        assert!(bundle.ends_with("__rcompile.run(\"main.js\");\n}).call(this);\n"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = id("a.js");
        let b = id("b.js");
        let mut aliases = IndexMap::new();
        aliases.insert("z".to_string(), b.clone());
        aliases.insert("y".to_string(), a.clone());

        let combiner = Combiner::new();
        let first = combiner.combine(&aliases, vec![(&a, "x"), (&b, "y")], &a);
        let second = combiner.combine(&aliases, vec![(&a, "x"), (&b, "y")], &a);

        assert_eq!(first, second);
        let z = first.find("alias(\"z\"").unwrap();
        let y = first.find("alias(\"y\"").unwrap();
        assert!(z < y);
    }
}
