//! Require capability (spec.md §4.4) and the CJS wrapper bindings it feeds
//! modules (spec.md §4.3: `exports`/`require`/`module`/`__filename`/
//! `__dirname`/`import_meta`/`__dynamicImport`).
//!
//! Every `require(specifier)` call — whether it came from a top-level
//! script, from inside another CommonJS module, or from a CJS-detected file
//! the ESM loader (`super::TypeScriptModuleLoader`) is pulling in — goes
//! through [`RequireCapability::require_from`]. Source is always read via
//! the [`SharedVfs`], never `std::fs`; a module tagged ESM is rewritten to
//! CommonJS by [`crate::transformer::Transformer`] first, the same pass
//! [`super::TypeScriptModuleLoader`] would use for a static `import`.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use boa_engine::object::builtins::JsPromise;
use boa_engine::{js_string, Context, JsArgs, JsError, JsObject, JsResult, JsValue, NativeFunction, Source};

use crate::resolver::{ModuleResolver, Resolved};
use crate::transformer::Transformer;
use crate::transpiler::Transpiler;
use crate::vfs::{SharedVfs, VirtualFs};

use super::interop::InteropRegistry;
use super::is_commonjs;
use super::module_record::ModuleCache;

fn js_error(message: impl Into<String>) -> JsError {
    JsError::from_opaque(JsValue::from(js_string!(message.into())))
}

/// Everything a `require()` call needs: where to look (`resolver`,
/// `vfs`), how to turn source into a runnable wrapper body (`transpiler`,
/// `transformer`), and where loaded modules live (`cache`, `interop`).
pub struct RequireCapability {
    vfs: SharedVfs,
    resolver: Rc<ModuleResolver>,
    transformer: Rc<Transformer>,
    transpiler: Transpiler,
    cache: Rc<ModuleCache>,
    interop: Rc<InteropRegistry>,
    cache_object: RefCell<Option<JsObject>>,
}

impl RequireCapability {
    pub fn new(vfs: SharedVfs, resolver: Rc<ModuleResolver>, transformer: Rc<Transformer>, cache: Rc<ModuleCache>, interop: Rc<InteropRegistry>) -> Self {
        Self { vfs, resolver, transformer, transpiler: Transpiler::new(), cache, interop, cache_object: RefCell::new(None) }
    }

    /// Installs `globalThis.require` (bound to `entry_dir`) and
    /// `globalThis.__dynamicImport` (spec.md §4.5).
    pub fn install(self: &Rc<Self>, context: &mut Context, entry_dir: PathBuf) -> JsResult<()> {
        *self.cache_object.borrow_mut() = Some(JsObject::with_null_proto());

        let require_fn = self.make_require_function(entry_dir.clone(), context)?;
        context.global_object().set(js_string!("require"), require_fn, false, context)?;

        let dynamic_import_fn = self.make_dynamic_import_function(entry_dir, context)?;
        context.global_object().set(js_string!("__dynamicImport"), dynamic_import_fn, false, context)?;

        Ok(())
    }

    /// Build a `require` function object bound to `from_dir`, the way
    /// Node's `createRequire(dir)` does: `.resolve` and `.cache` live on
    /// the callable itself.
    fn make_require_function(self: &Rc<Self>, from_dir: PathBuf, context: &mut Context) -> JsResult<JsValue> {
        let call_cap = Rc::clone(self);
        let call_dir = from_dir.clone();
        let call_fn = NativeFunction::from_closure(move |_this, args, context| {
            let specifier = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
            call_cap.require_from(&specifier, &call_dir, context)
        });
        let require_obj = call_fn.to_js_function(context.realm());

        let resolve_cap = Rc::clone(self);
        let resolve_dir = from_dir;
        let resolve_fn = NativeFunction::from_closure(move |_this, args, context| {
            let specifier = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
            let resolved = resolve_cap.resolve_specifier(&specifier, &resolve_dir)?;
            Ok(JsValue::from(js_string!(resolved)))
        });
        require_obj.set(js_string!("resolve"), resolve_fn.to_js_function(context.realm()), false, context)?;

        let cache_obj = self
            .cache_object
            .borrow()
            .clone()
            .expect("install() sets cache_object before any require function is built");
        require_obj.set(js_string!("cache"), cache_obj, false, context)?;

        Ok(JsValue::from(require_obj))
    }

    /// `__dynamicImport(specifier)`: the sentinel [`crate::transformer`]
    /// rewrites bare `import(...)` calls to. Always returns a Promise
    /// resolving to `{default, ...namedExports}` regardless of whether the
    /// target turned out to be CJS or ESM-shaped (spec.md §4.5).
    fn make_dynamic_import_function(self: &Rc<Self>, from_dir: PathBuf, context: &mut Context) -> JsResult<JsValue> {
        let cap = Rc::clone(self);
        let dynamic_fn = NativeFunction::from_closure(move |_this, args, context| {
            let specifier = args.get_or_undefined(0).to_string(context)?.to_std_string_escaped();
            match cap.require_from(&specifier, &from_dir, context) {
                Ok(exports) => {
                    let namespace = cap.to_namespace_object(exports, context)?;
                    Ok(JsValue::from(JsPromise::resolve(namespace, context)))
                }
                Err(err) => {
                    let reason = err.to_opaque(context);
                    Ok(JsValue::from(JsPromise::reject(reason, context)))
                }
            }
        });
        Ok(JsValue::from(dynamic_fn.to_js_function(context.realm())))
    }

    /// `{default, ...exports}` (spec.md §4.5): if `exports` already carries
    /// a `default` (the `__esModule` convention `transformer` produces),
    /// reuse it; otherwise `default` is the whole exports object, Node's
    /// `createRequire`-via-`import()` behavior for CJS targets.
    fn to_namespace_object(&self, exports: JsValue, context: &mut Context) -> JsResult<JsValue> {
        let namespace = JsObject::with_null_proto();
        if let Some(obj) = exports.as_object() {
            for key in obj.own_property_keys(context)? {
                if let Some(name) = key.as_string() {
                    if name.to_std_string_escaped() == "default" {
                        continue;
                    }
                }
                let value = obj.get(key.clone(), context)?;
                namespace.set(key, value, false, context)?;
            }
            let default_value = if obj.has_property(js_string!("default"), context)? {
                obj.get(js_string!("default"), context)?
            } else {
                exports.clone()
            };
            namespace.set(js_string!("default"), default_value, false, context)?;
        } else {
            namespace.set(js_string!("default"), exports, false, context)?;
        }
        Ok(JsValue::from(namespace))
    }

    /// `require.resolve(specifier)` (spec.md §4.4).
    pub fn resolve_specifier(&self, specifier: &str, from_dir: &Path) -> JsResult<String> {
        match self.resolver.resolve_from_dir(specifier, from_dir) {
            Ok(Resolved::Platform(name)) => Ok(name),
            Ok(Resolved::Path(path)) => Ok(path.to_string_lossy().into_owned()),
            Err(e) => Err(js_error(format!("Cannot find module '{specifier}': {e}"))),
        }
    }

    /// Resolve `specifier` from `from_dir` and load it, platform route or
    /// VFS path alike.
    pub fn require_from(&self, specifier: &str, from_dir: &Path, context: &mut Context) -> JsResult<JsValue> {
        match self.resolver.resolve_from_dir(specifier, from_dir) {
            Ok(Resolved::Platform(name)) => self.require_platform(&name, context),
            Ok(Resolved::Path(path)) => self.load_commonjs(specifier, &path, context),
            Err(e) => Err(js_error(format!("Cannot find module '{specifier}' from '{}': {e}", from_dir.display()))),
        }
    }

    fn require_platform(&self, canonical_name: &str, context: &mut Context) -> JsResult<JsValue> {
        let global = context.global_object();
        if canonical_name == "fs/promises" {
            let fs = global.get(js_string!("fs"), context)?;
            let fs = fs.as_object().ok_or_else(|| js_error("platform module 'fs' is not registered"))?;
            return fs.get(js_string!("promises"), context);
        }
        let value = global.get(js_string!(canonical_name), context)?;
        if value.is_undefined() {
            return Err(js_error(format!("platform module '{canonical_name}' is not registered")));
        }
        Ok(value)
    }

    /// Load (or return the cached/circular-in-progress exports of) the CJS
    /// module at `path`. `specifier` is only used to key the interop
    /// registry, not for resolution — the caller has already resolved it.
    pub fn load_commonjs(&self, specifier: &str, path: &Path, context: &mut Context) -> JsResult<JsValue> {
        let key = path.to_path_buf();
        if let Some(record) = self.cache.get(&key) {
            return Ok(record.exports);
        }

        let raw = self
            .vfs
            .read_to_string(path)
            .map_err(|e| js_error(format!("Cannot read module '{}': {e}", path.display())))?;

        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let parsed = context.eval(Source::from_bytes(format!("({raw})").as_bytes()))?;
            self.cache.insert_loading(key.clone(), parsed.clone());
            self.cache.mark_loaded(&key, parsed.clone());
            return Ok(parsed);
        }

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("module.js");
        let is_typescript = matches!(path.extension().and_then(|e| e.to_str()), Some("ts" | "tsx" | "mts" | "cts"));
        let transpiled = if is_typescript {
            self.transpiler.transpile(&raw, filename).map_err(|e| js_error(e.to_string()))?
        } else {
            raw
        };

        // ESM-shaped source reaching `require` (a `.js` file with `import`/
        // `export` that lacks an explicit CJS marker) gets the same
        // ESM-to-CJS rewrite the static `import` path would apply.
        let body = if is_commonjs(&transpiled) { transpiled } else { self.transformer.transform(path, &transpiled) };

        let module_obj = JsObject::with_null_proto();
        let exports_obj = JsObject::with_null_proto();
        module_obj.set(js_string!("exports"), exports_obj.clone(), false, context)?;
        let id_str = path.to_string_lossy().into_owned();
        module_obj.set(js_string!("id"), js_string!(id_str.clone()), false, context)?;
        module_obj.set(js_string!("filename"), js_string!(id_str.clone()), false, context)?;

        self.cache.insert_loading(key.clone(), JsValue::from(exports_obj.clone()));
        if let Some(cache_obj) = self.cache_object.borrow().as_ref() {
            cache_obj.set(js_string!(id_str.clone()), module_obj.clone(), false, context)?;
        }

        let dir = path.parent().unwrap_or(path).to_path_buf();
        let dirname = dir.to_string_lossy().into_owned();

        let import_meta = JsObject::with_null_proto();
        import_meta.set(js_string!("url"), js_string!(format!("file://{id_str}")), false, context)?;
        import_meta.set(js_string!("dirname"), js_string!(dirname.clone()), false, context)?;
        import_meta.set(js_string!("filename"), js_string!(id_str.clone()), false, context)?;

        let result = (|| -> JsResult<()> {
            // Lazily built so a module that never calls `require`/`import()`
            // doesn't pay for a fresh closure on every load.
            let require_for_module = self.make_require_function(dir.clone(), context)?;
            let dynamic_import_for_module = self.make_dynamic_import_function(dir, context)?;

            let wrapper_src = format!(
                "(function(exports, require, module, __filename, __dirname, import_meta, __dynamicImport) {{\n{body}\n}})"
            );
            let wrapper_value = context.eval(Source::from_bytes(wrapper_src.as_bytes()))?;
            let wrapper_fn =
                wrapper_value.as_object().cloned().ok_or_else(|| js_error("module wrapper did not evaluate to a function"))?;

            let call_args = [
                JsValue::from(exports_obj.clone()),
                require_for_module,
                JsValue::from(module_obj.clone()),
                JsValue::from(js_string!(id_str.clone())),
                JsValue::from(js_string!(dirname)),
                JsValue::from(import_meta),
                dynamic_import_for_module,
            ];
            wrapper_fn.call(&JsValue::undefined(), &call_args, context)?;
            Ok(())
        })();

        if let Err(err) = result {
            self.cache.remove(&key);
            if let Some(cache_obj) = self.cache_object.borrow().as_ref() {
                let _ = cache_obj.delete_property_or_throw(js_string!(id_str), context);
            }
            return Err(err);
        }

        let final_exports = module_obj.get(js_string!("exports"), context)?;
        let patched = self.interop.apply(specifier, final_exports, context)?;
        self.cache.mark_loaded(&key, patched.clone());
        Ok(patched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::interop::InteropRegistry;
    use crate::runtime::module_record::ModuleCache;
    use crate::vfs::MemoryFs;
    use std::sync::Arc;

    fn capability(vfs: SharedVfs, base: &Path) -> Rc<RequireCapability> {
        let resolver = Rc::new(ModuleResolver::new(vfs.clone(), base));
        Rc::new(RequireCapability::new(
            vfs,
            resolver,
            Rc::new(Transformer::new()),
            Rc::new(ModuleCache::new()),
            Rc::new(InteropRegistry::new()),
        ))
    }

    #[test]
    fn resolve_specifier_surfaces_missing_modules() {
        let vfs: SharedVfs = Arc::new(MemoryFs::new());
        let cap = capability(vfs, Path::new("/project"));
        let err = cap.resolve_specifier("./missing.js", Path::new("/project")).unwrap_err();
        assert!(format!("{err}").contains("Cannot find module"));
    }
}
