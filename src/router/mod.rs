//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo implementa el router que asocia cada request a una
//! [`Location`] de la configuración y aplica sus políticas.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → (405 | 301) → Dispatcher → Response
//! ```
//!
//! El match es por prefijo literal: gana el prefijo más largo y, ante un
//! empate, la primera location en orden de configuración. Como es una
//! comparación de strings, `/app` también captura `/apple`.

use crate::handlers::Dispatcher;
use crate::http::{Method, Request, Response, StatusCode};
use crate::routing::{Location, RoutingTable};
use std::sync::Arc;
use tracing::debug;

/// Busca la location con el prefijo más largo que coincide con `path`
///
/// # Ejemplo
/// ```
/// use webserv::router::match_location;
/// use webserv::routing::Location;
///
/// let locations = vec![Location::new("/"), Location::new("/a"), Location::new("/a/b")];
/// let found = match_location("/a/b/c", &locations).unwrap();
/// assert_eq!(found.path, "/a/b");
/// ```
pub fn match_location<'a>(path: &str, locations: &'a [Location]) -> Option<&'a Location> {
    let mut best: Option<&Location> = None;

    for location in locations {
        if !path.starts_with(location.path.as_str()) {
            continue;
        }
        // Estricto: ante empate se queda la primera
        if best.map_or(true, |b| location.path.len() > b.path.len()) {
            best = Some(location);
        }
    }

    best
}

/// Indica si `method` está permitido en la location
///
/// Sin location o con lista vacía se permite todo.
pub fn is_allowed(method: &Method, location: Option<&Location>) -> bool {
    match location {
        Some(loc) if !loc.allow_methods.is_empty() => {
            loc.allow_methods.iter().any(|m| m == method.as_str())
        }
        _ => true,
    }
}

/// Router de requests
pub struct Router {
    table: Arc<RoutingTable>,
    dispatcher: Dispatcher,
}

impl Router {
    /// Crea un router sobre la tabla de ruteo
    pub fn new(table: Arc<RoutingTable>) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&table)),
            table,
        }
    }

    /// Respuesta para un request que no se pudo parsear
    pub fn bad_request(&self, reason: &str) -> Response {
        self.dispatcher.error(StatusCode::BadRequest, reason)
    }

    /// Respuesta para una conexión que superó el tiempo de inactividad
    pub fn request_timeout(&self) -> Response {
        self.dispatcher.error(StatusCode::RequestTimeout, "Request Timeout")
    }

    /// Encuentra la location y ejecuta el handler apropiado para un request
    ///
    /// # Ejemplo
    /// ```
    /// use webserv::router::Router;
    /// use webserv::routing::RoutingTable;
    /// use webserv::http::Request;
    /// use std::sync::Arc;
    ///
    /// let router = Router::new(Arc::new(RoutingTable::default()));
    ///
    /// let raw = b"GET /test HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    /// let response = router.route(&request);
    /// ```
    pub fn route(&self, request: &Request) -> Response {
        let location = match_location(request.path(), &self.table.locations);
        debug!(
            path = request.path(),
            location = location.map(|l| l.path.as_str()).unwrap_or("-"),
            "ruta"
        );

        let response = if !is_allowed(request.method(), location) {
            let mut response = self
                .dispatcher
                .error(StatusCode::MethodNotAllowed, "Method Not Allowed");
            if let Some(loc) = location {
                response.add_header("Allow", &loc.allow_methods.join(", "));
            }
            response
        } else if let Some(target) = location.and_then(|loc| loc.redirect.as_deref()) {
            Response::redirect(target)
        } else {
            self.dispatcher.dispatch(request, location)
        };

        if *request.method() == Method::HEAD {
            response.without_body()
        } else {
            response
        }
    }
}
