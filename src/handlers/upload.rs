//! # Uploads multipart/form-data
//! src/handlers/upload.rs
//!
//! Extrae el primer archivo de un body `multipart/form-data` y lo guarda en
//! el directorio de uploads de la location.
//!
//! ## Formato esperado
//!
//! ```text
//! --XyZ\r\n
//! Content-Disposition: form-data; name="file"; filename="a.txt"\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! contenido\r\n
//! --XyZ--\r\n
//! ```
//!
//! El nombre de archivo se valida antes de tocar el disco.

use super::error_page::error_response;
use crate::http::assembler::{find, header_end};
use crate::http::{Request, Response, StatusCode};
use crate::routing::{Location, RoutingTable};
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{info, warn};

/// Tamaño máximo de un body de upload (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Largo máximo de un nombre de archivo
pub const MAX_FILENAME_LEN: usize = 255;

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"boundary="?([^";\s]+)"?"#).expect("valid boundary regex"));

static FILENAME_RE: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r#"filename="([^"]*)""#).expect("valid filename regex"));

/// Errores al interpretar el body multipart; todos son 400
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultipartError {
    #[error("No boundary found in multipart data")]
    MissingBoundary,

    #[error("No form data found")]
    MissingFormData,

    #[error("No filename found")]
    MissingFilename,

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Invalid multipart format")]
    Malformed,
}

/// Primer archivo encontrado en el body
#[derive(Debug, PartialEq, Eq)]
pub struct FilePart<'a> {
    pub filename: String,
    pub content: &'a [u8],
}

/// Acuse de recibo de un upload exitoso
#[derive(Debug, Serialize)]
struct UploadReceipt<'a> {
    message: &'static str,
    filename: &'a str,
    size: usize,
}

/// Guarda el archivo del request en el directorio de uploads
pub fn handle_upload(table: &RoutingTable, request: &Request, location: Option<&Location>) -> Response {
    let body = request.body();
    if body.len() > MAX_UPLOAD_SIZE {
        warn!(size = body.len(), "upload rechazado por tamaño");
        return error_response(
            table,
            StatusCode::PayloadTooLarge,
            &format!(
                "The uploaded file exceeds the maximum size limit of {} MB.",
                MAX_UPLOAD_SIZE / (1024 * 1024)
            ),
        );
    }

    let content_type = request.header("content-type").unwrap_or_default();
    let part = match extract_file(content_type, body) {
        Ok(part) => part,
        Err(e) => {
            warn!(error = %e, "upload inválido");
            return error_response(table, StatusCode::BadRequest, &e.to_string());
        }
    };

    let dir = table.upload_dir_for(location);
    let target = dir.join(&part.filename);
    if let Err(e) = fs::create_dir_all(&dir).and_then(|()| fs::write(&target, part.content)) {
        warn!(path = %target.display(), error = %e, "no se pudo guardar el upload");
        return error_response(table, StatusCode::InternalServerError, "Failed to save uploaded file");
    }

    info!(path = %target.display(), bytes = part.content.len(), "archivo subido");
    Response::json(
        StatusCode::Ok,
        &UploadReceipt {
            message: "File uploaded successfully",
            filename: &part.filename,
            size: part.content.len(),
        },
    )
}

/// Extrae el primer archivo de un body multipart
pub fn extract_file<'a>(content_type: &str, body: &'a [u8]) -> Result<FilePart<'a>, MultipartError> {
    let boundary = BOUNDARY_RE
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("--{}", m.as_str()))
        .ok_or(MultipartError::MissingBoundary)?;

    let disposition = find(body, b"Content-Disposition: form-data").ok_or(MultipartError::MissingFormData)?;
    let part = &body[disposition..];

    let filename = FILENAME_RE
        .captures(part)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .ok_or(MultipartError::MissingFilename)?;

    if !is_valid_filename(&filename) {
        return Err(MultipartError::InvalidFilename(filename));
    }

    let headers = header_end(part).ok_or(MultipartError::Malformed)?;
    let data = &part[headers.body..];
    let end = find(data, boundary.as_bytes()).ok_or(MultipartError::Malformed)?;

    let content = &data[..end];
    let content = content
        .strip_suffix(b"\r\n")
        .or_else(|| content.strip_suffix(b"\n"))
        .unwrap_or(content);

    Ok(FilePart { filename, content })
}

/// Un nombre es válido si no puede escapar del directorio de uploads
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.starts_with('.')
        && name.chars().count() <= MAX_FILENAME_LEN
}
