//! Module loader runtime for bundled output.
//!
//! `LOADER_PRELUDE` is copied verbatim to the top of every bundle. It declares
//! `__rcompileLoader(host)`, which builds one loader context and returns its
//! handle. `normalize`, `affix`, `resolve` and `dirname` mirror
//! [`crate::resolve`]; keep both in step.

/// Name of the function declared by [`LOADER_PRELUDE`].
pub const LOADER_FACTORY: &str = "__rcompileLoader";

/// Local variable the bundle binds the loader handle to.
pub const LOADER_HANDLE: &str = "__rcompile";

pub const LOADER_PRELUDE: &str = r#"// RCompile module loader
function __rcompileLoader(host) {
    'use strict';

    var hasOwn = Object.prototype.hasOwnProperty,
        aliases = Object.create(null),
        definitions = Object.create(null),
        instances = Object.create(null),
        contexts = [ '' ];

    function normalize(path) {
        var segments = path.split('/'),
            stack = [],
            normalized,
            segment,
            i;

        for (i = 0; i < segments.length; i++) {
            segment = segments[i];

            if (segment === '' || segment === '.') {
                continue;
            } else if (segment === '..') {
                if (stack.length > 0 && stack[stack.length - 1] !== '..') {
                    stack.pop();
                } else {
                    stack.push('..');
                }
            } else {
                stack.push(segment);
            }
        }

        normalized = stack.join('/');
        if (path.charAt(path.length - 1) === '/' && normalized !== '') {
            normalized += '/';
        }
        return normalized;
    }

    function lastSegment(path) {
        return path.substr(path.lastIndexOf('/') + 1);
    }

    function hasModuleExtension(path) {
        var fileName = lastSegment(path);

        return /\.js$/.test(fileName) || /\.json$/.test(fileName);
    }

    function namesDirectory(specifier) {
        var last = lastSegment(specifier);

        return last === '' || last === '.' || last === '..';
    }

    function affix(path, specifier) {
        if (hasModuleExtension(path)) {
            return path;
        }

        if (specifier.charAt(0) === '.' && !namesDirectory(specifier)) {
            return path + '.js';
        }

        if (path !== '' && path.charAt(path.length - 1) !== '/') {
            path += '/';
        }
        return path + 'index.js';
    }

    function resolve(specifier, context) {
        var joined = specifier;

        if (specifier === '') {
            throw new Error('empty module specifier');
        }
        if (specifier.charAt(0) !== '/' && context !== '') {
            joined = context + '/' + specifier;
        }
        return affix(normalize(joined), specifier);
    }

    function dirname(id) {
        var index = id.lastIndexOf('/');

        return index === -1 ? '' : id.substr(0, index);
    }

    function get(id) {
        var definition, module, result;

        if (hasOwn.call(instances, id)) {
            return instances[id];
        }
        if (!hasOwn.call(definitions, id)) {
            throw new Error('undefined module: ' + id);
        }

        definition = definitions[id];
        module = { exports: {} };

        contexts.push(dirname(id));
        try {
            result = definition.call(host, require, module.exports, module);
        } finally {
            contexts.pop();
        }

        instances[id] = typeof result !== 'undefined' ? result : module.exports;
        return instances[id];
    }

    function require(specifier) {
        var id = hasOwn.call(aliases, specifier) ?
            aliases[specifier] :
            resolve(specifier, contexts[contexts.length - 1]);

        return get(id);
    }

    function alias(specifier, id) {
        aliases[specifier] = id;
    }

    function set(id, definition) {
        definitions[id] = definition;
    }

    function run(id) {
        var value = get(id);

        if (typeof value === 'function') {
            value();
        }
        return value;
    }

    return {
        alias: alias,
        set: set,
        get: get,
        run: run,
        require: require,
        resolve: resolve
    };
}
"#;
