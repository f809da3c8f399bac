//! # Módulo HTTP
//!
//! Este módulo implementa la parte de protocolo del servidor, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Ensamblado incremental de requests a partir de lecturas parciales
//! - Parsing de requests HTTP/1.1
//! - Construcción y serialización de responses
//! - Status codes y tipos MIME
//!
//! ## Alcance
//!
//! - Se aceptan requests HTTP/1.0 y HTTP/1.1
//! - No hay conexiones persistentes: cada respuesta cierra la conexión
//! - No se decodifica chunked transfer encoding
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <h1>hola</h1>
//! ```

pub mod assembler; // Detección de request completo
pub mod mime;      // Extensión → Content-Type
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;

/// Valor del header `Server` y de `SERVER_SOFTWARE` en CGI
pub const SERVER_SOFTWARE: &str = "Webserv/1.0";
