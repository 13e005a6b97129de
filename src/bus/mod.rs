//! In-process HTTP bus (spec.md §4.7, §6.2).
//!
//! A per-process singleton mapping ports to request handlers. No real socket
//! is required: framework handlers started by the orchestrator, and JS
//! `http.createServer().listen()` calls routed through `runtime::http`, both
//! register here. An optional real-socket front door (see `server::hyper_server`)
//! can sit in front of this and forward accepted connections into
//! `Bus::handle_request`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("port {0} already has a registered handler")]
    PortInUse(u16),
    #[error("no handler registered for port {0}")]
    NoHandler(u16),
}

pub type BusResult<T> = Result<T, BusError>;

/// Wire shape for a request crossing the bus, shared with the orchestrator's
/// framework handlers and the optional real-socket front door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl ResponseInfo {
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        ResponseInfo { status: 502, headers, body: message.into() }
    }
}

/// Anything that can answer a bus request. Framework handlers (static file
/// servers, SSR entry points, the JS `http.Server` binding) all implement
/// this; the bus itself just routes by port.
pub trait ServerHandler: Send + Sync {
    fn handle_request(&self, request: RequestInfo) -> ResponseInfo;
    fn is_listening(&self) -> bool {
        true
    }
}

struct Registration {
    handler: Arc<dyn ServerHandler>,
}

#[derive(Default)]
struct BusState {
    handlers: HashMap<u16, Registration>,
}

/// The process-wide bus singleton (spec.md §3: "HTTP bus is a per-process
/// singleton").
pub struct Bus {
    state: Mutex<BusState>,
}

impl Bus {
    fn new() -> Self {
        Bus { state: Mutex::new(BusState::default()) }
    }

    pub fn global() -> &'static Bus {
        static BUS: OnceLock<Bus> = OnceLock::new();
        BUS.get_or_init(Bus::new)
    }

    /// Registers a handler for `port`. If `port` is 0, walks upward from
    /// 3000 by 1 until an unused port number is found, per spec.md §4.7's
    /// port-selection helper.
    pub fn register_server(&self, port: u16, handler: Arc<dyn ServerHandler>) -> BusResult<u16> {
        let mut state = self.state.lock().expect("bus mutex poisoned");
        let assigned = if port == 0 { Self::next_free_port(&state, 3000) } else { port };
        if state.handlers.contains_key(&assigned) {
            return Err(BusError::PortInUse(assigned));
        }
        state.handlers.insert(assigned, Registration { handler });
        Ok(assigned)
    }

    pub fn unregister_server(&self, port: u16) {
        let mut state = self.state.lock().expect("bus mutex poisoned");
        state.handlers.remove(&port);
    }

    pub fn get_server_ports(&self) -> Vec<u16> {
        let state = self.state.lock().expect("bus mutex poisoned");
        let mut ports: Vec<u16> = state.handlers.keys().copied().collect();
        ports.sort_unstable();
        ports
    }

    pub fn get_server_url(&self, port: u16) -> Option<String> {
        let state = self.state.lock().expect("bus mutex poisoned");
        state.handlers.contains_key(&port).then(|| format!("http://127.0.0.1:{port}"))
    }

    /// Dispatches a request to the handler registered for `port`. Returns a
    /// synthetic 502 response, never an error, when nothing is registered —
    /// the bus models an always-answering front door.
    pub fn handle_request(&self, port: u16, request: RequestInfo) -> ResponseInfo {
        let handler = {
            let state = self.state.lock().expect("bus mutex poisoned");
            state.handlers.get(&port).map(|r| r.handler.clone())
        };
        match handler {
            Some(h) => h.handle_request(request),
            None => ResponseInfo::bad_gateway(format!("no server listening on port {port}")),
        }
    }

    fn next_free_port(state: &BusState, start: u16) -> u16 {
        let mut candidate = start;
        while state.handlers.contains_key(&candidate) {
            candidate = candidate.saturating_add(1);
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl ServerHandler for Echo {
        fn handle_request(&self, request: RequestInfo) -> ResponseInfo {
            ResponseInfo { status: 200, headers: HashMap::new(), body: request.url }
        }
    }

    #[test]
    fn unregistered_port_yields_bad_gateway() {
        let bus = Bus::new();
        let resp = bus.handle_request(
            9999,
            RequestInfo { method: "GET".into(), url: "/".into(), headers: HashMap::new(), body: String::new() },
        );
        assert_eq!(resp.status, 502);
    }

    #[test]
    fn zero_port_assigns_next_free_slot() {
        let bus = Bus::new();
        let a = bus.register_server(0, Arc::new(Echo)).unwrap();
        let b = bus.register_server(0, Arc::new(Echo)).unwrap();
        assert_ne!(a, b);
        bus.unregister_server(a);
        bus.unregister_server(b);
    }

    #[test]
    fn registered_handler_answers_requests() {
        let bus = Bus::new();
        let port = bus.register_server(4100, Arc::new(Echo)).unwrap();
        let resp = bus.handle_request(
            port,
            RequestInfo { method: "GET".into(), url: "/hi".into(), headers: HashMap::new(), body: String::new() },
        );
        assert_eq!(resp.body, "/hi");
        bus.unregister_server(port);
    }
}
