//! # Traducción de la Salida CGI
//! src/cgi/output.rs
//!
//! La salida del script es `Header: valor` por línea, una línea vacía y el
//! body. Sin línea vacía, todo es body HTML. El status siempre es 200: un
//! header `Status:` se copia como cualquier otro.

use crate::http::assembler::header_end;
use crate::http::{Response, StatusCode};

/// Content-Type cuando el script no declara uno
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Convierte la salida cruda del script en una respuesta 200
pub fn translate(output: &[u8]) -> Response {
    let Some(end) = header_end(output) else {
        return Response::new(StatusCode::Ok)
            .with_header("Content-Type", DEFAULT_CONTENT_TYPE)
            .with_body_bytes(output.to_vec());
    };

    let mut response = Response::new(StatusCode::Ok);
    let head = String::from_utf8_lossy(&output[..end.head]);
    for line in head.lines() {
        if let Some((name, value)) = line.split_once(':') {
            response.add_header(name.trim(), value.trim());
        }
    }
    if response.header("Content-Type").is_none() {
        response.add_header("Content-Type", DEFAULT_CONTENT_TYPE);
    }

    response.with_body_bytes(output[end.body..].to_vec())
}
