//! # Construcción de Respuestas HTTP
//!
//! Este módulo proporciona una API para construir respuestas HTTP/1.1
//! de forma programática y convertirlas a bytes para enviar al cliente.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! Server: Webserv/1.0\r\n
//! Date: Sun, 18 Oct 2026 10:00:00 GMT\r\n
//! \r\n
//! <h1>hola</h1>
//! ```
//!
//! `Content-Length`, `Server` y `Date` se agregan al serializar solo si el
//! handler no los puso. Nunca se genera chunked encoding.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use webserv::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("hi");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::{StatusCode, SERVER_SOFTWARE};
use serde::Serialize;
use std::collections::HashMap;

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers HTTP (Content-Type, Location, etc.)
    /// Usamos HashMap para evitar duplicados
    headers: HashMap<String, String>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    ///
    /// Por defecto, la respuesta no tiene headers ni body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe (sin distinguir mayúsculas), se sobrescribe.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo de la respuesta desde un string
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo de la respuesta desde bytes
    ///
    /// Útil para archivos binarios y salida de scripts CGI.
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Crea una respuesta JSON serializando `value`
    ///
    /// # Ejemplo
    /// ```
    /// use webserv::http::{Response, StatusCode};
    /// use serde_json::json;
    ///
    /// let response = Response::json(StatusCode::NotFound, &json!({"error": "File not found"}));
    /// assert_eq!(response.header("content-type"), Some("application/json"));
    /// ```
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        // Serializar structs o json!() de strings no puede fallar
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{}".to_vec());
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body_bytes(body)
    }

    /// Crea una redirección 301 hacia `location`
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::MovedPermanently)
            .with_header("Location", location)
            .with_header("Content-Type", "text/html")
            .with_body(&format!(
                "<html><body><h1>301 Moved Permanently</h1><p><a href=\"{0}\">{0}</a></p></body></html>",
                location
            ))
    }

    /// Convierte la respuesta en la de un request HEAD
    ///
    /// Conserva `Content-Length` del body original y descarta el body.
    pub fn without_body(mut self) -> Self {
        if self.header("Content-Length").is_none() {
            let length = self.body.len().to_string();
            self.add_header("Content-Length", &length);
        }
        self.body.clear();
        self
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// Genera:
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n` (+ los automáticos que falten)
    /// - Línea vacía: `\r\n`
    /// - Body: contenido binario
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.body.len() + 256);

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        // 2. Headers del handler
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Headers automáticos
        if self.header("Content-Length").is_none() {
            result.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }
        if self.header("Server").is_none() {
            result.extend_from_slice(format!("Server: {}\r\n", SERVER_SOFTWARE).as_bytes());
        }
        if self.header("Date").is_none() {
            result.extend_from_slice(format!("Date: {}\r\n", http_date()).as_bytes());
        }

        // 4. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 5. Body (si existe)
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Fecha actual en formato RFC 1123 (`Sun, 18 Oct 2026 10:00:00 GMT`)
fn http_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
