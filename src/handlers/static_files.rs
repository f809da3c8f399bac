//! # Archivos Estáticos
//! src/handlers/static_files.rs
//!
//! Sirve archivos y directorios desde el document root.
//!
//! | Caso                                   | Respuesta            |
//! |----------------------------------------|----------------------|
//! | Archivo legible                        | 200 + tipo MIME      |
//! | No existe                              | 404                  |
//! | Sin permisos de lectura                | 403                  |
//! | Directorio con índice                  | 200 (el índice)      |
//! | Directorio sin índice, autoindex on    | 200 (listado HTML)   |
//! | Directorio sin índice, autoindex off   | 403                  |

use super::autoindex;
use super::error_page::error_response;
use crate::http::mime::mime_type;
use crate::http::{Request, Response, StatusCode};
use crate::routing::{Location, RoutingTable};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

/// Sirve `fs_path`, ya resuelto y validado por el dispatcher
pub fn serve(table: &RoutingTable, request: &Request, location: Option<&Location>, fs_path: &Path) -> Response {
    if fs_path.is_dir() {
        let index = fs_path.join(table.index_for(location));
        if index.is_file() {
            return serve_file(table, &index);
        }

        if location.is_some_and(|loc| loc.autoindex) {
            return match autoindex::render(fs_path, request.path()) {
                Ok(html) => Response::new(StatusCode::Ok)
                    .with_header("Content-Type", "text/html")
                    .with_body(&html),
                Err(e) => {
                    warn!(path = %fs_path.display(), error = %e, "no se pudo listar el directorio");
                    error_response(table, StatusCode::Forbidden, "Directory listing forbidden")
                }
            };
        }

        return error_response(table, StatusCode::Forbidden, "Directory listing forbidden");
    }

    serve_file(table, fs_path)
}

fn serve_file(table: &RoutingTable, path: &Path) -> Response {
    match fs::read(path) {
        Ok(content) => Response::new(StatusCode::Ok)
            .with_header("Content-Type", mime_type(path))
            .with_body_bytes(content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error_response(table, StatusCode::NotFound, "File Not Found")
        }
        Err(_) => error_response(table, StatusCode::Forbidden, "Access Forbidden"),
    }
}
