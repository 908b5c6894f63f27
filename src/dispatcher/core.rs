//! Dispatcher core - resolve a request and invoke the winning handler.
//!
//! Handlers are plain synchronous functions. The dispatcher owns the mapping from
//! [`HandlerId`] to function and the translation of [`NoMatch`] into an HTTP status.

use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::resolver::{NoMatch, Resolution, Selection};
use crate::ids::RequestId;
use crate::registry::{shared, CandidateRegistry, HandlerId, SharedRegistry};

/// Maximum inline response headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Response header storage; names are `Arc<str>` so repeated names clone in O(1)
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request header carrying a caller-supplied correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A handler function. Must be safe to call from many threads at once.
pub type HandlerFn = Arc<dyn Fn(HandlerRequest) -> HandlerResponse + Send + Sync>;

/// A request as handed over by the HTTP layer, after path routing.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    /// Resolved route template, e.g. `/authors/{authorId}/books/{bookId}`
    pub route: String,
    /// Path parameters extracted by the router
    pub path_params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl IncomingRequest {
    pub fn new(method: Method, route: impl Into<String>) -> Self {
        Self {
            method,
            route: route.into(),
            path_params: HashMap::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Append a header value. Invalid names or values are dropped, as a lenient HTTP
    /// front end would.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => debug!(header = %name, "Dropping invalid request header"),
        }
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Request data passed to a handler
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    pub route: String,
    /// Name of the handler that should process this request
    pub handler_name: HandlerId,
    /// How the handler was selected
    pub selection: Selection,
    pub path_params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl HandlerRequest {
    /// Get a header by name (case-insensitive per RFC 7230)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Response data sent back from a handler
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with a `content-type` header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::with_content_type(status, "application/json", body)
    }

    /// JSON body under a vendor media type, e.g. `application/vnd.marvin.book+json`
    #[must_use]
    pub fn with_content_type(status: u16, content_type: &str, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), content_type.to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// HTTP status for a resolution failure.
///
/// Unknown route → 404, other methods only → 405, unsatisfiable `Accept` or
/// `Content-Type` (or any other constrained header) → 406.
#[must_use]
pub fn no_match_status(no_match: &NoMatch) -> StatusCode {
    match no_match {
        NoMatch::UnknownRoute => StatusCode::NOT_FOUND,
        NoMatch::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        NoMatch::Unsatisfied { .. } => StatusCode::NOT_ACCEPTABLE,
    }
}

fn no_match_response(no_match: &NoMatch) -> HandlerResponse {
    let status = no_match_status(no_match).as_u16();
    match no_match {
        NoMatch::UnknownRoute => HandlerResponse::error(status, "Not Found"),
        NoMatch::MethodNotAllowed { allowed } => {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let mut resp = HandlerResponse::error(status, "Method Not Allowed");
            resp.set_header("allow", allow);
            resp
        }
        NoMatch::Unsatisfied { headers } => {
            let names: Vec<&str> = headers.iter().map(HeaderName::as_str).collect();
            let message = if headers.contains(&ACCEPT) {
                "No handler produces a media type listed in the Accept header"
            } else if headers.contains(&CONTENT_TYPE) {
                "No handler consumes the request Content-Type"
            } else {
                "No handler accepts the request headers"
            };
            HandlerResponse::json(
                status,
                serde_json::json!({ "error": message, "unsatisfied": names }),
            )
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Resolves requests against the shared registry and runs the selected handler.
#[derive(Clone)]
pub struct Dispatcher {
    registry: SharedRegistry,
    /// Map of handler names to their functions
    handlers: HashMap<HandlerId, HandlerFn>,
}

impl Dispatcher {
    /// Dispatcher over an existing shared registry (e.g. one kept fresh by hot reload)
    #[must_use]
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn from_registry(registry: CandidateRegistry) -> Self {
        Self::new(shared(registry))
    }

    /// Current registry snapshot
    #[must_use]
    pub fn registry(&self) -> Arc<CandidateRegistry> {
        self.registry.load_full()
    }

    #[must_use]
    pub fn shared_registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Register the function that serves `name`. Replaces any previous registration.
    pub fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        let id = HandlerId::new(name);
        if self.handlers.insert(id, Arc::new(handler_fn)).is_some() {
            warn!(handler_name = %name, "Replaced existing handler");
        }
        info!(
            handler_name = %name,
            total_handlers = self.handlers.len(),
            "Handler registered successfully"
        );
    }

    /// Candidates in the registry with no registered function, sorted and deduplicated.
    ///
    /// Call at startup: a non-empty result means some requests would answer 500.
    #[must_use]
    pub fn missing_handlers(&self) -> Vec<HandlerId> {
        let registry = self.registry.load();
        let mut missing: Vec<HandlerId> = registry
            .handler_ids()
            .filter(|id| !self.handlers.contains_key(*id))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Resolve the request and invoke the selected handler.
    ///
    /// Resolution failures become 404/405/406 JSON errors, an unregistered or
    /// panicking handler becomes a 500. Every response carries `x-request-id`.
    #[must_use]
    pub fn dispatch(&self, request: IncomingRequest) -> HandlerResponse {
        let request_id = RequestId::from_header_or_new(
            request
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );

        let resolution = {
            let registry = self.registry.load();
            registry.resolve(&request.route, &request.method, &request.headers)
        };

        let selection = match resolution {
            Resolution::Selected(selection) => selection,
            Resolution::NoMatch(no_match) => {
                warn!(
                    request_id = %request_id,
                    method = %request.method,
                    route = %request.route,
                    reason = ?no_match,
                    "No handler matched request"
                );
                let mut resp = no_match_response(&no_match);
                resp.set_header(REQUEST_ID_HEADER, request_id.to_string());
                return resp;
            }
        };

        let Some(handler_fn) = self.handlers.get(&selection.handler) else {
            let available_handlers: Vec<&str> =
                self.handlers.keys().map(HandlerId::as_str).collect();
            error!(
                request_id = %request_id,
                handler_name = %selection.handler,
                available_handlers = ?available_handlers,
                "Handler not found - CRITICAL"
            );
            let mut resp = HandlerResponse::error(500, "Handler not registered");
            resp.set_header(REQUEST_ID_HEADER, request_id.to_string());
            return resp;
        };

        info!(
            request_id = %request_id,
            handler_name = %selection.handler,
            selection = ?selection.kind,
            method = %request.method,
            route = %request.route,
            "Request dispatched to handler"
        );

        let handler_name = selection.handler.clone();
        let handler_request = HandlerRequest {
            request_id,
            method: request.method,
            route: request.route,
            handler_name: selection.handler.clone(),
            selection,
            path_params: request.path_params,
            headers: request.headers,
            body: request.body,
        };

        let start = Instant::now();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handler_fn(handler_request)
        }));

        let mut resp = match outcome {
            Ok(resp) => {
                info!(
                    request_id = %request_id,
                    handler_name = %handler_name,
                    status = resp.status,
                    execution_time_ms = start.elapsed().as_millis() as u64,
                    "Handler execution complete"
                );
                resp
            }
            Err(panic) => {
                let panic_message = panic_message(&*panic);
                error!(
                    request_id = %request_id,
                    handler_name = %handler_name,
                    panic_message = %panic_message,
                    "Handler panicked - CRITICAL"
                );
                HandlerResponse::error(500, &format!("Handler panicked: {panic_message}"))
            }
        };
        resp.set_header(REQUEST_ID_HEADER, request_id.to_string());
        resp
    }
}
