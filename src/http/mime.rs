//! # Tipos MIME
//!
//! Tabla estática extensión → `Content-Type` para archivos servidos desde disco.

use std::path::Path;

/// Tipo usado cuando la extensión no está en la tabla
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Obtiene el tipo MIME de un archivo a partir de su extensión
///
/// # Ejemplo
/// ```
/// use webserv::http::mime::mime_type;
/// use std::path::Path;
///
/// assert_eq!(mime_type(Path::new("www/index.HTML")), "text/html");
/// assert_eq!(mime_type(Path::new("blob")), "application/octet-stream");
/// ```
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        _ => DEFAULT_MIME_TYPE,
    }
}
