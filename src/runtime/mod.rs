//! JavaScript runtime powered by Boa engine
//!
//! This module provides the JavaScript execution environment using
//! the Boa JS engine with WebAPI support from boa_runtime.
//!
//! Features provided:
//! - Console API (console.log, console.error, etc.)
//! - Timers (setTimeout, setInterval, clearTimeout, clearInterval)
//! - URL API (URL, URLSearchParams)
//! - Text encoding (TextEncoder, TextDecoder)
//! - structuredClone
//! - queueMicrotask
//! - Promise/async-await support
//! - ES Modules with TypeScript transpilation

use boa_engine::{
    Context, JsError, JsResult, JsString, JsValue, Source,
    builtins::promise::PromiseState,
    context::ContextBuilder,
    js_string,
    module::{Module, ModuleLoader, Referrer},
};
use boa_gc::{Finalize, Trace};
use boa_runtime::{
    ConsoleState, Logger,
    extensions::{
        ConsoleExtension, EncodingExtension, FetchExtension, MicrotaskExtension,
        StructuredCloneExtension, TimeoutExtension, UrlExtension,
    },
    fetch::BlockingReqwestFetcher,
    register_extensions,
};
use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};
use thiserror::Error;

/// Global counter for pending timers (setTimeout/setInterval)
/// This allows the event loop to know when to keep running
static PENDING_TIMER_COUNT: AtomicU32 = AtomicU32::new(0);

/// Increment pending timer count
pub fn increment_pending_timers() {
    PENDING_TIMER_COUNT.fetch_add(1, Ordering::SeqCst);
}

/// Decrement pending timer count
pub fn decrement_pending_timers() {
    PENDING_TIMER_COUNT.fetch_sub(1, Ordering::SeqCst);
}

/// Check if there are pending timers
pub fn has_pending_timers() -> bool {
    PENDING_TIMER_COUNT.load(Ordering::SeqCst) > 0
}

/// Reset pending timer count (for new runtime instances)
fn reset_pending_timers() {
    PENDING_TIMER_COUNT.store(0, Ordering::SeqCst);
}

mod assert;
mod buffer;
mod crypto;
mod event_loop;
mod events;
mod http;
pub mod interop;
pub mod module_record;
mod net;
mod os;
mod path;
mod process;
mod querystring;
pub mod require;
mod server_api;
mod spawn;
mod stream;
mod string_decoder;
mod tty;
mod url;
mod util;
mod websocket;
pub mod worker;
mod zlib;

use crate::fs;
use crate::resolver::{ModuleResolver, Resolved};
use crate::transpiler::{Transpiler, TranspilerConfig};
use crate::vfs::{NativeFs, SharedVfs, VirtualFs};
use event_loop::ViperEventLoop;
use interop::InteropRegistry;
use module_record::ModuleCache;
use require::RequireCapability;

/// Check if code is CommonJS (has module.exports or require())
pub(crate) fn is_commonjs(code: &str) -> bool {
    for line in code.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with("*") {
            continue;
        }
        if trimmed.contains("module.exports")
            || trimmed.contains("exports.")
            || (trimmed.contains("require(") && !trimmed.contains("import"))
        {
            return true;
        }
        if trimmed.starts_with("import ") || trimmed.starts_with("export ") {
            return false;
        }
    }
    false
}

/// Errors that can occur during runtime execution
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("Transpilation error: {0}")]
    TranspileError(#[from] crate::transpiler::TranspileError),

    #[allow(dead_code)]
    #[error("Module load error: {0}")]
    ModuleError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("filesystem error: {0}")]
    VfsError(#[from] crate::vfs::VfsError),
}

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Custom logger that prints to stdout/stderr
#[derive(Debug, Clone, Default, Trace, Finalize)]
pub struct ViperLogger;

impl Logger for ViperLogger {
    fn log(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        println!("{}", msg);
        Ok(())
    }

    fn info(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        println!("[INFO] {}", msg);
        Ok(())
    }

    fn warn(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        eprintln!("[WARN] {}", msg);
        Ok(())
    }

    fn error(&self, msg: String, _state: &ConsoleState, _context: &mut Context) -> JsResult<()> {
        eprintln!("[ERROR] {}", msg);
        Ok(())
    }
}

/// TypeScript module loader that transpiles .ts files on-the-fly
/// Uses oxc_resolver for Node.js/Bun-compatible module resolution
pub struct TypeScriptModuleLoader {
    base_path: PathBuf,
    transpiler: Transpiler,
    vfs: SharedVfs,
    resolver: Rc<ModuleResolver>,
    require: Rc<RequireCapability>,
}

impl TypeScriptModuleLoader {
    pub fn new(vfs: SharedVfs, resolver: Rc<ModuleResolver>, require: Rc<RequireCapability>, base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            transpiler: Transpiler::new(),
            vfs,
            resolver,
            require,
        }
    }

    /// Get built-in module code for Node.js compatible modules
    fn get_builtin_module(specifier: &str) -> Option<String> {
        match specifier {
            "path" | "node:path" => Some(
                r#"
                const p = globalThis.path;
                export default p;
                export const {
                    sep, delimiter, join, resolve, normalize, dirname,
                    basename, extname, isAbsolute, relative, parse,
                    format, toNamespacedPath, matchesGlob, posix, win32
                } = p;
                "#
                .to_string(),
            ),
            "http" | "node:http" => Some(
                r#"
                const h = globalThis.http;
                export default h;
                export const {
                    Server, Agent, ClientRequest, IncomingMessage, ServerResponse,
                    OutgoingMessage, METHODS, STATUS_CODES, createServer, request,
                    get, globalAgent, maxHeaderSize
                } = h;
                "#
                .to_string(),
            ),
            "events" | "node:events" => Some(
                r#"
                const e = globalThis.events;
                export default e.EventEmitter;
                export const EventEmitter = e.EventEmitter;
                export const once = e.once;
                export const on = e.on;
                export const getEventListeners = e.getEventListeners;
                export const getMaxListeners = e.getMaxListeners;
                export const setMaxListeners = e.setMaxListeners;
                export const listenerCount = e.listenerCount;
                export const addAbortListener = e.addAbortListener;
                export const errorMonitor = e.errorMonitor;
                export const captureRejectionSymbol = e.captureRejectionSymbol;
                export const captureRejections = e.captureRejections;
                export const defaultMaxListeners = e.defaultMaxListeners;
                "#
                .to_string(),
            ),
            "buffer" | "node:buffer" => Some(
                r#"
                const b = globalThis.buffer;
                export default b;
                export const Buffer = globalThis.Buffer;
                export const constants = b.constants;
                export const kMaxLength = b.kMaxLength;
                export const INSPECT_MAX_BYTES = b.INSPECT_MAX_BYTES;
                export const SlowBuffer = globalThis.Buffer;
                export const Blob = globalThis.Blob;
                export const File = globalThis.File;
                export const atob = globalThis.atob;
                export const btoa = globalThis.btoa;
                export const transcode = function(source, fromEnc, toEnc) {
                    return Buffer.from(source.toString(fromEnc), toEnc);
                };
                export const isUtf8 = function(input) {
                    try {
                        const str = input.toString('utf8');
                        return Buffer.from(str, 'utf8').equals(input);
                    } catch { return false; }
                };
                export const isAscii = function(input) {
                    for (let i = 0; i < input.length; i++) {
                        if (input[i] > 127) return false;
                    }
                    return true;
                };
                "#
                .to_string(),
            ),
            "stream" | "node:stream" => Some(
                r#"
                const s = globalThis.stream;
                export default s;
                export const Stream = s.Stream;
                export const Readable = s.Readable;
                export const Writable = s.Writable;
                export const Duplex = s.Duplex;
                export const Transform = s.Transform;
                export const PassThrough = s.PassThrough;
                export const pipeline = s.pipeline;
                export const finished = s.finished;
                export const addAbortSignal = s.addAbortSignal;
                export const promises = s.promises;
                "#
                .to_string(),
            ),
            "fs" | "node:fs" => Some(
                r#"
                const f = globalThis.fs;
                export default f;
                export const readFileSync = f.readFileSync;
                export const writeFileSync = f.writeFileSync;
                export const appendFileSync = f.appendFileSync;
                export const existsSync = f.existsSync;
                export const statSync = f.statSync;
                export const lstatSync = f.lstatSync;
                export const readdirSync = f.readdirSync;
                export const mkdirSync = f.mkdirSync;
                export const rmdirSync = f.rmdirSync;
                export const rmSync = f.rmSync;
                export const unlinkSync = f.unlinkSync;
                export const renameSync = f.renameSync;
                export const copyFileSync = f.copyFileSync;
                export const chmodSync = f.chmodSync;
                export const realpathSync = f.realpathSync;
                export const accessSync = f.accessSync;
                export const truncateSync = f.truncateSync;
                export const openSync = f.openSync;
                export const closeSync = f.closeSync;
                export const readSync = f.readSync;
                export const writeSync = f.writeSync;
                export const readFile = f.readFile;
                export const writeFile = f.writeFile;
                export const appendFile = f.appendFile;
                export const exists = f.exists;
                export const stat = f.stat;
                export const lstat = f.lstat;
                export const readdir = f.readdir;
                export const mkdir = f.mkdir;
                export const rmdir = f.rmdir;
                export const rm = f.rm;
                export const unlink = f.unlink;
                export const rename = f.rename;
                export const copyFile = f.copyFile;
                export const chmod = f.chmod;
                export const realpath = f.realpath;
                export const access = f.access;
                export const truncate = f.truncate;
                export const promises = f.promises;
                export const constants = f.constants;
                export const Dirent = f.Dirent;
                export const Stats = f.Stats;
                "#
                .to_string(),
            ),
            "fs/promises" | "node:fs/promises" => Some(
                r#"
                const p = globalThis.fs.promises;
                export default p;
                export const readFile = p.readFile;
                export const writeFile = p.writeFile;
                export const appendFile = p.appendFile;
                export const stat = p.stat;
                export const lstat = p.lstat;
                export const readdir = p.readdir;
                export const mkdir = p.mkdir;
                export const rmdir = p.rmdir;
                export const rm = p.rm;
                export const unlink = p.unlink;
                export const rename = p.rename;
                export const copyFile = p.copyFile;
                export const chmod = p.chmod;
                export const realpath = p.realpath;
                export const access = p.access;
                export const truncate = p.truncate;
                "#
                .to_string(),
            ),
            "util" | "node:util" => Some(
                r#"
                const u = globalThis.util;
                export default u;
                export const promisify = u.promisify;
                export const callbackify = u.callbackify;
                export const format = u.format;
                export const formatWithOptions = u.formatWithOptions;
                export const inspect = u.inspect;
                export const deprecate = u.deprecate;
                export const isDeepStrictEqual = u.isDeepStrictEqual;
                export const inherits = u.inherits;
                export const debuglog = u.debuglog;
                export const getSystemErrorName = u.getSystemErrorName;
                export const getSystemErrorMap = u.getSystemErrorMap;
                export const types = u.types;
                "#
                .to_string(),
            ),
            "net" | "node:net" => Some(
                r#"
                const n = globalThis.net;
                export default n;
                export const Socket = n.Socket;
                export const Server = n.Server;
                export const BlockList = n.BlockList;
                export const SocketAddress = n.SocketAddress;
                export const createServer = n.createServer;
                export const createConnection = n.createConnection;
                export const connect = n.connect;
                export const isIP = n.isIP;
                export const isIPv4 = n.isIPv4;
                export const isIPv6 = n.isIPv6;
                "#
                .to_string(),
            ),
            "tty" | "node:tty" => Some(
                r#"
                const t = globalThis.tty;
                export default t;
                export const isatty = t.isatty;
                export const ReadStream = t.ReadStream;
                export const WriteStream = t.WriteStream;
                "#
                .to_string(),
            ),
            "url" | "node:url" => Some(
                r#"
                const u = globalThis.url;
                export default u;
                export const URL = globalThis.URL;
                export const URLSearchParams = globalThis.URLSearchParams;
                export const parse = u.parse;
                export const format = u.format;
                export const resolve = u.resolve;
                export const domainToASCII = u.domainToASCII;
                export const domainToUnicode = u.domainToUnicode;
                export const fileURLToPath = u.fileURLToPath;
                export const pathToFileURL = u.pathToFileURL;
                export const urlToHttpOptions = u.urlToHttpOptions;
                export const Url = u.Url;
                "#
                .to_string(),
            ),
            "querystring" | "node:querystring" => Some(
                r#"
                const qs = globalThis.querystring;
                export default qs;
                export const parse = qs.parse;
                export const stringify = qs.stringify;
                export const escape = qs.escape;
                export const unescape = qs.unescape;
                export const decode = qs.decode;
                export const encode = qs.encode;
                "#
                .to_string(),
            ),
            "string_decoder" | "node:string_decoder" => Some(
                r#"
                const sd = globalThis.string_decoder;
                export default sd;
                export const StringDecoder = sd.StringDecoder;
                "#
                .to_string(),
            ),
            "assert" | "node:assert" => Some(
                r#"
                const a = globalThis.assert;
                export default a;
                export const AssertionError = a.AssertionError;
                export const ok = a.ok;
                export const equal = a.equal;
                export const notEqual = a.notEqual;
                export const strictEqual = a.strictEqual;
                export const notStrictEqual = a.notStrictEqual;
                export const deepEqual = a.deepEqual;
                export const notDeepEqual = a.notDeepEqual;
                export const deepStrictEqual = a.deepStrictEqual;
                export const notDeepStrictEqual = a.notDeepStrictEqual;
                export const fail = a.fail;
                export const throws = a.throws;
                export const doesNotThrow = a.doesNotThrow;
                export const rejects = a.rejects;
                export const doesNotReject = a.doesNotReject;
                export const match = a.match;
                export const doesNotMatch = a.doesNotMatch;
                export const ifError = a.ifError;
                export const strict = a.strict;
                "#
                .to_string(),
            ),
            // Add more built-in modules here as they're implemented
            _ => None,
        }
    }
}

impl ModuleLoader for TypeScriptModuleLoader {
    fn load_imported_module(
        self: Rc<Self>,
        referrer: Referrer,
        specifier: boa_engine::JsString,
        context: &RefCell<&mut Context>,
    ) -> impl std::future::Future<Output = JsResult<Module>> {
        let specifier_str = specifier.to_std_string_escaped();

        async move {
            // Get the referrer path using Boa's built-in path() method
            // This properly tracks where each module is loaded from
            let referrer_path = referrer
                .path()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| self.base_path.join("index.ts"));

            let resolved = self
                .resolver
                .resolve(&specifier_str, &referrer_path)
                .map_err(|e| {
                    JsError::from_opaque(JsValue::from(js_string!(format!(
                        "Failed to resolve module '{}': {}",
                        specifier_str, e
                    ))))
                })?;

            let mut resolved_path = match resolved {
                Resolved::Platform(name) => {
                    let builtin_code = Self::get_builtin_module(&name).unwrap_or_else(|| {
                        format!("export default globalThis['{name}'];")
                    });
                    let mut ctx = context.borrow_mut();
                    let source = Source::from_bytes(builtin_code.as_bytes());
                    return Module::parse(source, None, &mut *ctx);
                }
                Resolved::Path(path) => path,
            };

            // Skip TypeScript declaration files (.d.ts) - try to find the JS version
            let resolved_str = resolved_path.to_string_lossy().into_owned();
            if resolved_str.ends_with(".d.ts")
                || resolved_str.ends_with(".d.mts")
                || resolved_str.ends_with(".d.cts")
            {
                let js_path = if resolved_str.ends_with(".d.ts") {
                    resolved_path.with_extension("js")
                } else if resolved_str.ends_with(".d.mts") {
                    resolved_path.with_extension("mjs")
                } else {
                    resolved_path.with_extension("cjs")
                };

                if self.vfs.exists(&js_path) {
                    resolved_path = js_path;
                } else {
                    let parent = resolved_path.parent().unwrap_or(&resolved_path).to_path_buf();
                    let index_js = parent.join("index.js");
                    if self.vfs.exists(&index_js) {
                        resolved_path = index_js;
                    }
                }
            }

            // Read the resolved file through the VFS, never real std::fs
            let source_code = self.vfs.read_to_string(&resolved_path).map_err(|e| {
                JsError::from_opaque(JsValue::from(js_string!(format!(
                    "Failed to read module '{}': {}",
                    resolved_path.display(),
                    e
                ))))
            })?;

            let extension = resolved_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");

            let js_code = if matches!(extension, "ts" | "tsx" | "mts") {
                let filename = resolved_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("module.ts");

                self.transpiler
                    .transpile(&source_code, filename)
                    .map_err(|e| JsError::from_opaque(JsValue::from(js_string!(e.to_string()))))?
            } else {
                source_code
            };

            // CommonJS-shaped files are loaded through the same Module
            // record/cache a JS-level `require()` call would use, rather
            // than textually bundled into one synthesized ESM module.
            if is_commonjs(&js_code) {
                let mut ctx = context.borrow_mut();
                let exports = self
                    .require
                    .load_commonjs(&specifier_str, &resolved_path, &mut *ctx)?;
                let key = format!("__viperCjsExports_{:x}", path_hash(&resolved_path));
                let global = ctx.global_object();
                global.set(js_string!(key.clone()), exports, false, &mut *ctx)?;
                let shim = format!(
                    "const __m = globalThis['{key}'];\nexport default __m;\nexport const module = {{ exports: __m }};"
                );
                let source = Source::from_bytes(shim.as_bytes()).with_path(&resolved_path);
                return Module::parse(source, None, &mut *ctx);
            }

            // Parse and load the module with its path for proper referrer tracking
            // Star exports (export * from "...") are handled natively by Boa
            // with proper path tracking via Source::with_path()
            let source = Source::from_bytes(js_code.as_bytes()).with_path(&resolved_path);
            let mut ctx = context.borrow_mut();
            Module::parse(source, None, &mut *ctx)
        }
    }
}

/// Deterministic stash key for a resolved CJS module's exports object, so
/// repeated imports of the same file collide onto the same global slot
/// instead of leaking a fresh one per import.
fn path_hash(path: &Path) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    hasher.finish()
}

/// Configuration for the Viper runtime
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Base path for module resolution
    pub base_path: PathBuf,
    /// Transpiler configuration
    pub transpiler_config: TranspilerConfig,
    /// Whether to use the high-performance event loop
    pub use_event_loop: bool,
    /// Command-line arguments (for process.argv)
    pub args: Vec<String>,
    /// Virtual filesystem module source is read through. `None` builds a
    /// [`NativeFs`] rooted at `base_path`, the local-checkout default.
    pub vfs: Option<SharedVfs>,
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("base_path", &self.base_path)
            .field("transpiler_config", &self.transpiler_config)
            .field("use_event_loop", &self.use_event_loop)
            .field("args", &self.args)
            .field("vfs", &self.vfs.as_ref().map(|_| "<dyn VirtualFs>"))
            .finish()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            transpiler_config: TranspilerConfig::default(),
            use_event_loop: true,
            args: std::env::args().collect(),
            vfs: None,
        }
    }
}

impl RuntimeConfig {
    /// Create a config with command-line arguments
    pub fn with_args(args: Vec<String>) -> Self {
        Self {
            args,
            ..Default::default()
        }
    }
}

/// The main Viper TypeScript runtime
pub struct Runtime {
    context: Context,
    transpiler: Transpiler,
    vfs: SharedVfs,
    #[allow(dead_code)]
    config: RuntimeConfig,
    #[allow(dead_code)]
    event_loop: Option<Rc<ViperEventLoop>>,
}

impl Runtime {
    /// Create a new runtime with default configuration
    pub fn new() -> RuntimeResult<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(config: RuntimeConfig) -> RuntimeResult<Self> {
        // Create the high-performance event loop
        let event_loop = if config.use_event_loop {
            Some(Rc::new(ViperEventLoop::new()))
        } else {
            None
        };

        // Build (or adopt) the VFS everything below resolves and reads
        // modules through, then the resolver/require machinery on top of it.
        let vfs: SharedVfs = config
            .vfs
            .clone()
            .unwrap_or_else(|| std::sync::Arc::new(NativeFs::new(&config.base_path)));
        let resolver = Rc::new(ModuleResolver::new(vfs.clone(), &config.base_path));
        let transformer = Rc::new(crate::transformer::Transformer::new());
        let module_cache = Rc::new(ModuleCache::new());
        let interop = Rc::new(InteropRegistry::new());
        let require_capability = Rc::new(RequireCapability::new(
            vfs.clone(),
            resolver.clone(),
            transformer,
            module_cache,
            interop,
        ));

        // Create module loader
        let module_loader = Rc::new(TypeScriptModuleLoader::new(
            vfs.clone(),
            resolver,
            require_capability.clone(),
            &config.base_path,
        ));

        // Build the context with module loader
        // Note: We don't set the event loop as job_executor when using modules
        // because it causes RefCell borrow conflicts in async module loading
        let builder = ContextBuilder::default().module_loader(module_loader);

        // Only use event loop for non-module code
        // For module code, Boa handles its own job queue
        if let Some(ref el) = event_loop {
            // We'll manually use the event loop instead of setting it as executor
            let _ = el;
        }

        let mut context = builder
            .build()
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Increase runtime limits to match Node.js/V8 defaults
        // This handles large module graphs (e.g., date-fns has 245 re-exports)
        context.runtime_limits_mut().set_recursion_limit(16384);
        context
            .runtime_limits_mut()
            .set_stack_size_limit(1024 * 1024); // 1MB

        // Register all boa_runtime extensions using tuple syntax
        // This gives us: console, setTimeout/setInterval, URL, TextEncoder/TextDecoder,
        // structuredClone, queueMicrotask, and fetch
        register_extensions(
            (
                ConsoleExtension(ViperLogger),
                TimeoutExtension,
                UrlExtension,
                EncodingExtension,
                StructuredCloneExtension,
                MicrotaskExtension,
                FetchExtension(BlockingReqwestFetcher::default()),
            ),
            None,
            &mut context,
        )
        .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Add global 'global' object (like Node.js)
        let global = context.global_object();
        context
            .global_object()
            .set(js_string!("global"), global, false, &mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Add Viper-specific globals
        Self::register_viper_globals(&mut context)?;

        // Wrap setTimeout/setInterval to track pending timers
        Self::wrap_timer_functions(&mut context)?;

        // Register ultra-fast file system API (Node.js compatible)
        fs::fast::register_fs_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register Viper.serve() API
        server_api::register_server_api(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register process object (with command-line args)
        process::register_process(&mut context, &config.args)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register crypto API
        crypto::register_crypto(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register spawn/exec APIs
        spawn::register_spawn(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register WebSocket API (client only)
        websocket::register_websocket(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;
        websocket::register_websocket_helpers(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register path module (Node.js compatible)
        path::register_path(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register events module (Node.js compatible EventEmitter)
        events::register_events_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register HTTP module (Node.js compatible)
        http::register_http_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register Buffer module (Node.js compatible, high-performance native Rust)
        buffer::register_buffer_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register util module (Node.js compatible utility functions)
        util::register_util_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register stream module (Node.js compatible streams)
        stream::register_stream_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register TTY module (Node.js compatible, native Rust performance)
        tty::register_tty_module(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register net module (Node.js compatible TCP networking, native Rust performance)
        net::register_net_module(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register os module (Node.js compatible, native Rust performance)
        os::register_os_module(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register zlib module (Node.js compatible compression, using zlib-rs for max performance)
        zlib::register_zlib_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register querystring module (Node.js compatible URL query string utilities)
        querystring::register_querystring_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register url module (Node.js compatible URL utilities extending WHATWG URL API)
        url::register_url_module(&mut context).map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register string_decoder module (Node.js compatible string decoding)
        string_decoder::register_string_decoder_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register assert module (Node.js compatible assertions)
        assert::register_assert_module(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register global require() function for CommonJS compatibility
        Self::register_require_function(&mut context)?;

        // Install the require capability (spec.md §4.4): globalThis.require
        // bound to base_path, plus the __dynamicImport shim (§4.5).
        require_capability
            .install(&mut context, config.base_path.clone())
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Register Worker API (high-performance Web Workers)
        worker::register_worker_api(&mut context)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        let transpiler = Transpiler::with_config(config.transpiler_config.clone());

        Ok(Self {
            context,
            transpiler,
            vfs,
            config,
            event_loop,
        })
    }

    /// Register Viper-specific global functions and objects
    fn register_viper_globals(context: &mut Context) -> RuntimeResult<()> {
        // Add version info
        context
            .global_object()
            .set(
                js_string!("__VIPER_VERSION__"),
                JsValue::from(js_string!(env!("CARGO_PKG_VERSION"))),
                false,
                context,
            )
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Add runtime name
        context
            .global_object()
            .set(
                js_string!("__VIPER_RUNTIME__"),
                JsValue::from(js_string!("Viper")),
                false,
                context,
            )
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Add JSX runtime
        Self::register_jsx_runtime(context)?;

        Ok(())
    }

    /// Wrap setTimeout/setInterval to track pending timers for the event loop
    fn wrap_timer_functions(context: &mut Context) -> RuntimeResult<()> {
        // Reset timer count for this runtime instance
        reset_pending_timers();

        let wrapper_code = r#"
            (function() {
                // Store original functions
                const _origSetTimeout = globalThis.setTimeout;
                const _origSetInterval = globalThis.setInterval;
                const _origClearTimeout = globalThis.clearTimeout;
                const _origClearInterval = globalThis.clearInterval;

                // Track active timers
                const activeTimers = new Set();
                const activeIntervals = new Set();

                // nextTick queue (highest priority - runs before I/O)
                const nextTickQueue = [];
                let processingNextTick = false;

                // setImmediate queue (runs after I/O, in check phase)
                const immediateQueue = [];
                let immediateId = 0;
                const immediateCallbacks = new Map();

                // Process nextTick queue
                function processNextTicks() {
                    if (processingNextTick) return;
                    processingNextTick = true;
                    while (nextTickQueue.length > 0) {
                        const { callback, args } = nextTickQueue.shift();
                        try {
                            callback.apply(null, args);
                        } catch (e) {
                            console.error('nextTick error:', e);
                        }
                    }
                    processingNextTick = false;
                }

                // process.nextTick - runs before any I/O
                if (!globalThis.process) globalThis.process = {};
                globalThis.process.nextTick = function(callback, ...args) {
                    nextTickQueue.push({ callback, args });
                    // Use queueMicrotask to process before next macrotask
                    queueMicrotask(processNextTicks);
                };

                // setImmediate - runs in check phase (after I/O)
                globalThis.setImmediate = function(callback, ...args) {
                    const id = ++immediateId;
                    immediateCallbacks.set(id, { callback, args });
                    __viper_timer_increment();
                    // Use setTimeout(0) to schedule in macrotask queue
                    _origSetTimeout(() => {
                        const entry = immediateCallbacks.get(id);
                        if (entry) {
                            immediateCallbacks.delete(id);
                            __viper_timer_decrement();
                            entry.callback.apply(null, entry.args);
                        }
                    }, 0);
                    return id;
                };

                globalThis.clearImmediate = function(id) {
                    if (immediateCallbacks.has(id)) {
                        immediateCallbacks.delete(id);
                        __viper_timer_decrement();
                    }
                };

                // Wrap setTimeout
                globalThis.setTimeout = function(callback, delay, ...args) {
                    __viper_timer_increment();
                    const id = _origSetTimeout(function() {
                        activeTimers.delete(id);
                        __viper_timer_decrement();
                        callback.apply(this, args);
                    }, delay);
                    activeTimers.add(id);
                    return id;
                };

                // Wrap setInterval
                globalThis.setInterval = function(callback, delay, ...args) {
                    __viper_timer_increment();
                    const id = _origSetInterval(function() {
                        callback.apply(this, args);
                    }, delay);
                    activeIntervals.add(id);
                    return id;
                };

                // Wrap clearTimeout
                globalThis.clearTimeout = function(id) {
                    if (activeTimers.has(id)) {
                        activeTimers.delete(id);
                        __viper_timer_decrement();
                    }
                    return _origClearTimeout(id);
                };

                // Wrap clearInterval
                globalThis.clearInterval = function(id) {
                    if (activeIntervals.has(id)) {
                        activeIntervals.delete(id);
                        __viper_timer_decrement();
                    }
                    return _origClearInterval(id);
                };
            })();
        "#;

        // Register native timer tracking functions
        let increment_fn = boa_engine::NativeFunction::from_fn_ptr(|_this, _args, _context| {
            increment_pending_timers();
            Ok(JsValue::undefined())
        });
        context
            .global_object()
            .set(
                js_string!("__viper_timer_increment"),
                increment_fn.to_js_function(context.realm()),
                false,
                context,
            )
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        let decrement_fn = boa_engine::NativeFunction::from_fn_ptr(|_this, _args, _context| {
            decrement_pending_timers();
            Ok(JsValue::undefined())
        });
        context
            .global_object()
            .set(
                js_string!("__viper_timer_decrement"),
                decrement_fn.to_js_function(context.realm()),
                false,
                context,
            )
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        // Execute wrapper code
        let source = Source::from_bytes(wrapper_code.as_bytes());
        context
            .eval(source)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        Ok(())
    }

    /// Register global require() function for CommonJS compatibility
    fn register_require_function(context: &mut Context) -> RuntimeResult<()> {
        let require_code = r#"
            // V8-specific Error API polyfills (needed for depd, etc.)
            if (typeof Error.captureStackTrace !== 'function') {
                Error.captureStackTrace = function(targetObject, constructorOpt) {
                    // Create a mock stack trace array that mimics V8's CallSite objects
                    const mockCallSite = {
                        getFileName: () => 'unknown',
                        getLineNumber: () => 0,
                        getColumnNumber: () => 0,
                        getFunctionName: () => 'anonymous',
                        getTypeName: () => null,
                        getMethodName: () => null,
                        getEvalOrigin: () => null,
                        isTopLevel: () => true,
                        isEval: () => false,
                        isNative: () => false,
                        isConstructor: () => false,
                        toString: () => 'at anonymous (unknown:0:0)'
                    };

                    // Assign a stack array with mock call sites
                    targetObject.stack = [mockCallSite, mockCallSite, mockCallSite];
                };
            }

            if (typeof Error.stackTraceLimit === 'undefined') {
                Error.stackTraceLimit = 10;
            }

            if (typeof Error.prepareStackTrace === 'undefined') {
                Error.prepareStackTrace = undefined;
            }

            // Baseline module/exports for top-level scripts not reached
            // through require() or an ESM import (see Runtime::run's IIFE
            // wrapper, which overrides these with the real per-script pair).
            globalThis.module = { exports: {} };
            globalThis.exports = globalThis.module.exports;
        "#;

        let source = Source::from_bytes(require_code.as_bytes());
        context
            .eval(source)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        Ok(())
    }

    /// Register JSX runtime functions for classic JSX mode
    fn register_jsx_runtime(context: &mut Context) -> RuntimeResult<()> {
        // Simple JSX runtime that creates plain objects representing elements
        let jsx_runtime = r#"
            // JSX element creation function
            globalThis.__viper_jsx = function(type, props, ...children) {
                // Handle null/undefined props
                if (props === null || props === undefined) {
                    props = {};
                }

                // Flatten children array (handle nested arrays)
                const flatChildren = [];
                function flatten(arr) {
                    for (const item of arr) {
                        if (Array.isArray(item)) {
                            flatten(item);
                        } else if (item !== null && item !== undefined && item !== false) {
                            flatChildren.push(item);
                        }
                    }
                }
                flatten(children);

                // If children exist, add them to props
                if (flatChildren.length > 0) {
                    props = { ...props, children: flatChildren.length === 1 ? flatChildren[0] : flatChildren };
                }

                // If type is a function (component), call it
                if (typeof type === 'function') {
                    return type(props);
                }

                // Otherwise, create a plain object representing the element
                return {
                    type: type,
                    props: props,
                    $$typeof: Symbol.for('viper.element')
                };
            };

            // JSX fragment function
            globalThis.__viper_fragment = function(props, ...children) {
                return __viper_jsx(Symbol.for('viper.fragment'), props, ...children);
            };

            // Simple HTML renderer for JSX elements
            globalThis.renderToString = function(element) {
                if (element === null || element === undefined) {
                    return '';
                }

                // Handle text nodes
                if (typeof element === 'string' || typeof element === 'number') {
                    return String(element);
                }

                // Handle arrays
                if (Array.isArray(element)) {
                    return element.map(renderToString).join('');
                }

                // Handle JSX elements
                if (element.$$typeof === Symbol.for('viper.element')) {
                    const { type, props } = element;

                    // Handle fragments
                    if (type === Symbol.for('viper.fragment')) {
                        return renderToString(props.children);
                    }

                    // Void elements that don't need closing tags
                    const voidElements = ['area', 'base', 'br', 'col', 'embed', 'hr', 'img', 'input', 'link', 'meta', 'param', 'source', 'track', 'wbr'];

                    // Build opening tag
                    let html = '<' + type;

                    // Add attributes
                    for (const [key, value] of Object.entries(props)) {
                        if (key === 'children') continue;

                        // Handle className -> class
                        const attrName = key === 'className' ? 'class' : key;

                        // Skip functions and undefined/null
                        if (typeof value === 'function' || value === undefined || value === null) {
                            continue;
                        }

                        // Boolean attributes
                        if (typeof value === 'boolean') {
                            if (value) {
                                html += ' ' + attrName;
                            }
                        } else {
                            html += ' ' + attrName + '="' + String(value) + '"';
                        }
                    }

                    // Handle void elements
                    if (voidElements.includes(type)) {
                        html += ' />';
                        return html;
                    }

                    html += '>';

                    // Add children
                    if (props.children) {
                        html += renderToString(props.children);
                    }

                    // Closing tag
                    html += '</' + type + '>';

                    return html;
                }

                return '';
            };
        "#;

        let source = Source::from_bytes(jsx_runtime.as_bytes());
        context
            .eval(source)
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        Ok(())
    }

    /// Evaluate TypeScript code and return the result
    pub fn eval(&mut self, code: &str, filename: &str) -> RuntimeResult<JsValue> {
        // Determine if this is TypeScript based on filename
        let is_typescript = filename.ends_with(".ts") || filename.ends_with(".tsx");

        let js_code = if is_typescript {
            self.transpiler.transpile(code, filename)?
        } else {
            code.to_string()
        };

        // Evaluate the JavaScript code
        let source = Source::from_bytes(js_code.as_bytes());
        let result = self.context.eval(source);

        // Run any pending jobs using the event loop
        let _ = self.context.run_jobs();

        result.map_err(|e| RuntimeError::JsError(e.to_string()))
    }

    /// Execute a TypeScript file
    #[allow(dead_code)]
    pub fn execute_file(&mut self, path: &Path) -> RuntimeResult<JsValue> {
        let source = self.vfs.read_to_string(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("input.ts");

        self.eval(&source, filename)
    }

    /// Check if code contains ES module syntax (import/export statements or top-level await)
    fn has_module_syntax(code: &str) -> bool {
        let mut in_multiline_comment = false;
        let mut brace_depth = 0; // Track brace nesting for top-level detection

        for line in code.lines() {
            let trimmed = line.trim();

            // Handle multiline comments
            if trimmed.contains("/*") {
                in_multiline_comment = true;
            }
            if trimmed.contains("*/") {
                in_multiline_comment = false;
                continue;
            }
            if in_multiline_comment {
                continue;
            }

            // Skip single-line comments
            if trimmed.starts_with("//") {
                continue;
            }

            // Check for import or export at start of line
            if trimmed.starts_with("import ")
                || trimmed.starts_with("export ")
                || trimmed.starts_with("import{")
                || trimmed.starts_with("export{")
            {
                return true;
            }

            // Track brace depth (simple heuristic for top-level detection)
            // Function declarations/expressions increase depth
            if trimmed.contains("function ") || trimmed.contains("=>") {
                brace_depth += trimmed.matches('{').count() as i32;
            } else {
                brace_depth += trimmed.matches('{').count() as i32;
            }

            // Check for top-level await (await at depth 0)
            if brace_depth == 0 && trimmed.contains("await ") {
                // Make sure it's not in a comment
                if let Some(pos) = trimmed.find("await ") {
                    let before = &trimmed[..pos];
                    if !before.contains("//") {
                        return true;
                    }
                }
            }

            brace_depth -= trimmed.matches('}').count() as i32;
            if brace_depth < 0 {
                brace_depth = 0;
            }
        }
        false
    }

    /// Run a TypeScript file with full event loop support
    /// This will keep running until all timers and async operations complete
    pub fn run(&mut self, code: &str, filename: &str) -> RuntimeResult<JsValue> {
        // Auto-detect module mode based on:
        // 1. File extension (.tsx, .jsx, .mjs, .mts)
        // 2. Presence of import/export statements
        let use_module_mode = filename.ends_with(".tsx")
            || filename.ends_with(".jsx")
            || filename.ends_with(".mjs")
            || filename.ends_with(".mts")
            || Self::has_module_syntax(code);

        if use_module_mode {
            return self.execute_module(code, filename);
        }

        // Determine if this is TypeScript based on filename
        let is_typescript = filename.ends_with(".ts") || filename.ends_with(".tsx");

        let js_code = if is_typescript {
            self.transpiler.transpile(code, filename)?
        } else {
            code.to_string()
        };

        // Wrap the main script in a CommonJS-like wrapper to provide __dirname, __filename, etc.
        // This allows top-level scripts to use require() and have access to module-like globals
        // Convert Windows paths to forward slashes for consistency
        let normalized_filename = filename.replace('\\', "/");
        let wrapped_code = format!(
            r#"(function() {{
                const __filename = '{}';
                const __dirname = globalThis.path ? globalThis.path.dirname(__filename) : '.';
                const exports = {{}};
                const module = {{ exports: exports }};
                {}
            }})();"#,
            normalized_filename.replace('\'', "\\'"),
            js_code
        );

        // Evaluate the JavaScript code
        let source = Source::from_bytes(wrapped_code.as_bytes());
        let result = self.context.eval(source);

        // Run the event loop to completion, including waiting for workers
        self.run_event_loop()?;

        result.map_err(|e| RuntimeError::JsError(e.to_string()))
    }

    /// Run the event loop until all work is complete (including workers, timers, promises)
    ///
    /// This implements a proper event loop that:
    /// 1. Runs all immediate jobs (promises, microtasks)
    /// 2. Waits for timers to fire and runs their callbacks
    /// 3. Keeps running while there are active workers
    fn run_event_loop(&mut self) -> RuntimeResult<()> {
        use std::time::{Duration, Instant};

        let start_time = Instant::now();
        let max_runtime = Duration::from_secs(300); // 5 minute max runtime safety limit

        loop {
            // Safety: don't run forever
            if start_time.elapsed() > max_runtime {
                break;
            }

            // Run pending jobs - this processes promises and ready timers
            self.context
                .run_jobs()
                .map_err(|e| RuntimeError::JsError(e.to_string()))?;

            // Check if we have active workers or pending timers
            let has_workers = worker::has_active_workers();
            let has_timers = has_pending_timers();

            // If we have workers or pending timers, keep running
            if has_workers || has_timers {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }

            // No workers and no pending timers - we're done
            break;
        }

        // Final cleanup run
        self.context
            .run_jobs()
            .map_err(|e| RuntimeError::JsError(e.to_string()))?;

        Ok(())
    }

    /// Run a TypeScript file with full event loop support
    pub fn run_file(&mut self, path: &Path) -> RuntimeResult<JsValue> {
        let source = self.vfs.read_to_string(path)?;

        // Get the full absolute path for __filename. The VFS already deals
        // in absolute POSIX paths, so a real fs::canonicalize would just
        // re-derive what the caller (or config.base_path) already gave us.
        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        };
        let full_path_str = full_path.to_string_lossy().to_string();

        self.run(&source, &full_path_str)
    }

    /// Execute TypeScript code as a module (supports top-level await)
    #[allow(dead_code)]
    pub fn execute_module(&mut self, code: &str, filename: &str) -> RuntimeResult<JsValue> {
        use std::time::{Duration, Instant};

        // Transpile if TypeScript
        let is_typescript = filename.ends_with(".ts") || filename.ends_with(".tsx");
        let js_code = if is_typescript {
            self.transpiler.transpile(code, filename)?
        } else {
            code.to_string()
        };

        // Parse as module
        let source = Source::from_bytes(js_code.as_bytes());
        let module = Module::parse(source, None, &mut self.context)
            .map_err(|e| RuntimeError::ModuleError(e.to_string()))?;

        // Load and evaluate the module
        let promise = module.load_link_evaluate(&mut self.context);

        // Run the event loop until the module promise resolves
        // This handles top-level await properly
        let start_time = Instant::now();
        let max_runtime = Duration::from_secs(300); // 5 minute max

        loop {
            // Safety check
            if start_time.elapsed() > max_runtime {
                return Err(RuntimeError::ModuleError(
                    "Module execution timed out".to_string(),
                ));
            }

            // Run pending jobs
            self.context
                .run_jobs()
                .map_err(|e| RuntimeError::JsError(e.to_string()))?;

            // Check promise state
            match promise.state() {
                PromiseState::Fulfilled(_) => {
                    // Module executed successfully, now run event loop for workers/timers
                    self.run_event_loop()?;
                    return Ok(JsValue::undefined());
                }
                PromiseState::Rejected(err) => {
                    let err_str: JsString = err
                        .to_string(&mut self.context)
                        .unwrap_or_else(|_| js_string!("Unknown error"));
                    return Err(RuntimeError::ModuleError(err_str.to_std_string_escaped()));
                }
                PromiseState::Pending => {
                    // Still pending - check if we have timers or workers keeping us alive
                    let has_workers = worker::has_active_workers();
                    let has_timers = has_pending_timers();

                    if has_workers || has_timers {
                        // Keep running, there's async work to do
                        std::thread::sleep(Duration::from_millis(1));
                        continue;
                    }

                    // No timers or workers, but promise is pending
                    // Give it a bit more time for microtasks to complete
                    std::thread::sleep(Duration::from_millis(1));

                    // Run jobs again
                    self.context
                        .run_jobs()
                        .map_err(|e| RuntimeError::JsError(e.to_string()))?;

                    // Check again
                    match promise.state() {
                        PromiseState::Fulfilled(_) => {
                            self.run_event_loop()?;
                            return Ok(JsValue::undefined());
                        }
                        PromiseState::Rejected(err) => {
                            let err_str: JsString = err
                                .to_string(&mut self.context)
                                .unwrap_or_else(|_| js_string!("Unknown error"));
                            return Err(RuntimeError::ModuleError(err_str.to_std_string_escaped()));
                        }
                        PromiseState::Pending => {
                            // If still pending with no work, it might be waiting for
                            // something that won't happen. Continue for a bit.
                            continue;
                        }
                    }
                }
            }
        }
    }

    /// Get mutable reference to the underlying context
    #[allow(dead_code)]
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Get reference to the underlying context
    #[allow(dead_code)]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Convert a JsValue to a displayable string
    pub fn value_to_string(&mut self, value: &JsValue) -> String {
        value
            .to_string(&mut self.context)
            .map(|s| s.to_std_string_escaped())
            .unwrap_or_else(|_| "[error converting value]".to_string())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new().expect("Failed to create default runtime")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_creation() {
        let runtime = Runtime::new();
        assert!(runtime.is_ok());
    }

    #[test]
    fn test_basic_javascript() {
        let mut runtime = Runtime::new().unwrap();
        let result = runtime.eval("1 + 1", "test.js");
        assert!(result.is_ok());
    }

    #[test]
    fn test_typescript_execution() {
        let mut runtime = Runtime::new().unwrap();
        let ts_code = r#"
            const x: number = 10;
            const y: number = 20;
            x + y
        "#;
        let result = runtime.eval(ts_code, "test.ts");
        assert!(result.is_ok());
    }

    #[test]
    fn test_console_log() {
        let mut runtime = Runtime::new().unwrap();
        let result = runtime.eval("console.log('Hello from Viper!')", "test.js");
        assert!(result.is_ok());
    }

    #[test]
    fn test_promise() {
        let mut runtime = Runtime::new().unwrap();
        let code = r#"
            let result = 0;
            Promise.resolve(42).then(v => { result = v; });
            result
        "#;
        let _ = runtime.run(code, "test.js");
        // Promise should be resolved after run
    }

    #[test]
    fn test_url_api() {
        let mut runtime = Runtime::new().unwrap();
        let code = r#"
            const url = new URL('https://example.com/path?query=value');
            url.hostname
        "#;
        let result = runtime.eval(code, "test.js");
        assert!(result.is_ok());
    }

    #[test]
    fn test_text_encoder() {
        let mut runtime = Runtime::new().unwrap();
        let code = r#"
            const encoder = new TextEncoder();
            const encoded = encoder.encode('Hello');
            encoded.length
        "#;
        let result = runtime.eval(code, "test.js");
        assert!(result.is_ok());
    }
}
