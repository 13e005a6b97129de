//! Integration coverage for the require capability (spec.md §4.4, §8
//! scenarios 3-5): circular requires through the module cache, ESM source
//! reached via `require()` going through the same CJS-interop path a static
//! `import` would, and JSON/relative requires.

use std::sync::Arc;

use viper::runtime::{Runtime, RuntimeConfig};
use viper::vfs::{MemoryFs, SharedVfs};

fn runtime_over(vfs: SharedVfs, base_path: &str) -> Runtime {
    let config = RuntimeConfig { base_path: base_path.into(), vfs: Some(vfs), use_event_loop: false, ..Default::default() };
    Runtime::with_config(config).expect("runtime construction")
}

#[test]
fn circular_require_observes_partial_exports() {
    let vfs = MemoryFs::new();
    vfs.seed_file(
        "/project/a.js",
        br#"
        exports.name = 'a';
        const b = require('./b');
        exports.bNameSeenFromA = b.name;
        "#,
    );
    vfs.seed_file(
        "/project/b.js",
        br#"
        exports.name = 'b';
        const a = require('./a');
        exports.aNameSeenFromB = a.name;
        "#,
    );
    let vfs: SharedVfs = Arc::new(vfs);
    let mut runtime = runtime_over(vfs, "/project");

    let result = runtime
        .eval("const a = require('./a'); JSON.stringify({a: a.name, b: a.bNameSeenFromA})", "entry.js")
        .expect("entry script runs");
    let out = runtime.value_to_string(&result);
    assert!(out.contains("\"a\":\"a\""));
    assert!(out.contains("\"b\":\"b\""));
}

#[test]
fn circular_require_sees_field_set_before_reentry() {
    // spec.md §8 scenario 4: B, required from inside A's body, must observe
    // a field A set before calling require('./b').
    let vfs = MemoryFs::new();
    vfs.seed_file(
        "/project/a.js",
        br#"
        module.exports.ready = true;
        const b = require('./b');
        module.exports.sawReadyInB = b.sawReady;
        "#,
    );
    vfs.seed_file(
        "/project/b.js",
        br#"
        const a = require('./a');
        module.exports.sawReady = a.ready === true;
        "#,
    );
    let vfs: SharedVfs = Arc::new(vfs);
    let mut runtime = runtime_over(vfs, "/project");

    let result = runtime.eval("JSON.stringify(require('./a'))", "entry.js").expect("entry script runs");
    let out = runtime.value_to_string(&result);
    assert!(out.contains("\"sawReadyInB\":true"));
}

#[test]
fn esm_module_required_by_cjs_caller_exposes_named_and_default() {
    // spec.md §8 scenario 5: a CJS requirer reads both the named export and
    // `.default` off a transformed ESM source, and it carries the ESM marker.
    let vfs = MemoryFs::new();
    vfs.seed_file(
        "/project/lib.js",
        br#"
        export const bar = 41 + 1;
        export default bar;
        "#,
    );
    let vfs: SharedVfs = Arc::new(vfs);
    let mut runtime = runtime_over(vfs, "/project");

    let result = runtime
        .eval(
            "const lib = require('./lib'); JSON.stringify({bar: lib.bar, def: lib.default, esm: lib.__esModule})",
            "entry.js",
        )
        .expect("entry script runs");
    let out = runtime.value_to_string(&result);
    assert!(out.contains("\"bar\":42"));
    assert!(out.contains("\"def\":42"));
    assert!(out.contains("\"esm\":true"));
}

#[test]
fn json_and_relative_requires_resolve_through_vfs() {
    let vfs = MemoryFs::new();
    vfs.seed_file("/project/data.json", br#"{"count": 3}"#);
    vfs.seed_file("/project/lib/helper.js", b"module.exports.double = (n) => n * 2;");
    let vfs: SharedVfs = Arc::new(vfs);
    let mut runtime = runtime_over(vfs, "/project");

    let result = runtime
        .eval(
            "const data = require('./data.json'); const helper = require('./lib/helper'); JSON.stringify({count: data.count, doubled: helper.double(data.count)})",
            "entry.js",
        )
        .expect("entry script runs");
    let out = runtime.value_to_string(&result);
    assert!(out.contains("\"count\":3"));
    assert!(out.contains("\"doubled\":6"));
}

#[test]
fn require_resolve_reports_missing_module() {
    let vfs: SharedVfs = Arc::new(MemoryFs::new());
    let mut runtime = runtime_over(vfs, "/project");

    let result = runtime.eval("require.resolve('./missing')", "entry.js");
    assert!(result.is_err());
}
