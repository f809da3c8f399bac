//! # Páginas de Error
//! src/handlers/error_page.rs
//!
//! Si la configuración declara `error_page <code> <path>` y el archivo se
//! puede leer, se sirve ese archivo. Si no, una página HTML mínima.

use crate::http::{Response, StatusCode, SERVER_SOFTWARE};
use crate::routing::RoutingTable;
use std::fs;

/// Respuesta de error para `status`, con `message` en la página por defecto
pub fn error_response(table: &RoutingTable, status: StatusCode, message: &str) -> Response {
    let custom = table
        .defaults
        .error_pages
        .get(&status.as_u16())
        .and_then(|page| fs::read(table.defaults.root.join(page.trim_start_matches('/'))).ok());

    let body = custom.unwrap_or_else(|| builtin_page(status, message).into_bytes());

    Response::new(status)
        .with_header("Content-Type", "text/html")
        .with_body_bytes(body)
}

/// Página HTML por defecto
pub fn builtin_page(status: StatusCode, message: &str) -> String {
    format!(
        "<html><head><title>Error {code}</title></head><body>\
         <h1>Error {code}</h1><p>{message}</p>\
         <hr><p>{software}</p></body></html>",
        code = status.as_u16(),
        message = message,
        software = SERVER_SOFTWARE,
    )
}
