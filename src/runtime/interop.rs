//! Per-package interop-patch registry (spec.md §4.6).
//!
//! Most modules need no help here: a module [`crate::transformer`] rewrote
//! from ESM already carries `__esModule` and a `default` export next to its
//! named ones, and a plain CommonJS module's `module.exports` is used
//! as-is by [`super::require::RequireCapability`]. This registry only
//! intervenes for packages the platform registry force-intercepts
//! (`crate::platform::is_forced_intercept`) because their real
//! implementation can't run in this process.

use boa_engine::{js_string, Context, JsObject, JsResult, JsValue};

use crate::platform;

/// Reshapes (or replaces) `exports` for a handful of known-awkward
/// packages before handing them back to a `require` caller.
pub struct InteropRegistry;

impl InteropRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Apply whatever patch `specifier` needs. Anything not force-
    /// intercepted passes through untouched.
    pub fn apply(&self, specifier: &str, exports: JsValue, context: &mut Context) -> JsResult<JsValue> {
        if platform::is_forced_intercept(specifier) {
            return Ok(JsValue::from(Self::forced_intercept_stub(specifier, context)?));
        }
        Ok(exports)
    }

    /// A forced-intercept package still has to return *something* from
    /// `require`, or the first property access throws a confusing
    /// "Cannot read properties of undefined" instead of naming the
    /// package that isn't supported.
    fn forced_intercept_stub(specifier: &str, context: &mut Context) -> JsResult<JsObject> {
        let stub = JsObject::with_null_proto();
        let message = format!(
            "'{specifier}' is intercepted by the platform registry and has no in-process implementation"
        );
        stub.set(js_string!("__viperForcedIntercept"), JsValue::from(js_string!(message)), false, context)?;
        Ok(stub)
    }
}

impl Default for InteropRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_package_passes_through() {
        let _registry = InteropRegistry::new();
        assert!(!platform::is_forced_intercept("left-pad"));
        // `apply` is exercised against a live Context in runtime integration
        // tests; here we only check the routing predicate it defers to.
    }

    #[test]
    fn forced_intercepts_match_platform_registry() {
        assert!(platform::is_forced_intercept("esbuild"));
        assert!(platform::is_forced_intercept("prettier"));
    }
}
