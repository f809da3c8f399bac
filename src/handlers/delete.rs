//! # DELETE de archivos subidos
//! src/handlers/delete.rs
//!
//! Solo se pueden borrar archivos bajo `/uploads/`. Todas las respuestas son
//! JSON: `{"message": ..., "filename": ...}` o `{"error": ...}`.

use crate::http::{Request, Response, StatusCode};
use crate::routing::{Location, RoutingTable};
use serde::Serialize;
use std::fs;
use tracing::{info, warn};

/// Prefijo de URL bajo el cual se permite borrar
pub const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Debug, Serialize)]
struct Deleted<'a> {
    message: &'static str,
    filename: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteError {
    error: &'static str,
}

fn error(status: StatusCode, message: &'static str) -> Response {
    Response::json(status, &DeleteError { error: message })
}

/// Borra el archivo `/uploads/<nombre>` del directorio de uploads
pub fn handle_delete(table: &RoutingTable, request: &Request, location: Option<&Location>) -> Response {
    let Some(filename) = request.path().strip_prefix(UPLOADS_PREFIX) else {
        return error(
            StatusCode::Forbidden,
            "File deletion only allowed in uploads directory",
        );
    };

    if filename.is_empty() || filename.contains("..") {
        return error(StatusCode::BadRequest, "Invalid filename");
    }

    let path = table.upload_dir_for(location).join(filename);
    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(_) => return error(StatusCode::NotFound, "File not found"),
    };
    if !metadata.is_file() {
        return error(StatusCode::BadRequest, "Cannot delete directories");
    }

    match fs::remove_file(&path) {
        Ok(()) => {
            info!(path = %path.display(), "archivo borrado");
            Response::json(
                StatusCode::Ok,
                &Deleted {
                    message: "File deleted successfully",
                    filename,
                },
            )
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "no se pudo borrar");
            error(StatusCode::InternalServerError, "Failed to delete file")
        }
    }
}
