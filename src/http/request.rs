//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Este módulo implementa el parser de requests desde cero. Se invoca una
//! sola vez por conexión, cuando el [`assembler`](super::assembler) decide que
//! el buffer ya contiene un request completo.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /cgi-bin/echo.py?lang=es HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 5\r\n
//! \r\n
//! hello
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query VERSION`
//! 2. **Headers**: Pares `Name: Value` (el nombre se guarda en minúsculas)
//! 3. **Empty Line**: `\r\n` (o `\n` a secas) que separa headers del body
//! 4. **Body**: todo lo que sigue al separador

use super::assembler;
use std::collections::HashMap;
use thiserror::Error;

/// Métodos HTTP
///
/// Los métodos que el servidor no maneja se conservan en `Other` para poder
/// responder 501 y para exportarlos tal cual en `REQUEST_METHOD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Obtener un recurso
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// POST - Enviar datos (uploads, CGI)
    POST,

    /// DELETE - Borrar un archivo subido
    DELETE,

    /// Cualquier otro token de método
    Other(String),
}

impl Method {
    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::DELETE => "DELETE",
            Method::Other(name) => name,
        }
    }

    /// Métodos cuyo request termina con los headers, sin importar el body
    pub fn completes_at_headers(&self) -> bool {
        matches!(self, Method::GET | Method::HEAD | Method::DELETE)
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "DELETE" => Method::DELETE,
            other => Method::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representa un request HTTP parseado
///
/// Es inmutable después del parsing: lo leen el router, el dispatcher y el
/// gateway CGI.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Target tal como vino en la request line (ej: "/cgi-bin/a.py?x=1")
    target: String,

    /// Path sin query string (ej: "/cgi-bin/a.py")
    path: String,

    /// Query string sin el '?' (ej: "x=1")
    query: String,

    /// Versión HTTP (ej: "HTTP/1.1")
    version: String,

    /// Headers con el nombre en minúsculas (ej: {"content-type": "text/plain"})
    headers: HashMap<String, String>,

    /// Todo lo que sigue al separador de headers
    body: Vec<u8>,
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// No se encontró el separador de headers
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// La request line no tiene exactamente método, path y versión
    #[error("Invalid request line: {0:?}")]
    InvalidRequestLine(String),
}

impl Request {
    /// Parsea un request desde el buffer acumulado de una conexión
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use webserv::http::Request;
    ///
    /// let raw = b"GET /docs/index.html?lang=es HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/docs/index.html");
    /// assert_eq!(request.query(), "lang=es");
    /// assert_eq!(request.header("HOST"), Some("x"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ParseError::EmptyRequest);
        }

        let end = assembler::header_end(buffer).ok_or(ParseError::IncompleteRequest)?;
        let head = String::from_utf8_lossy(&buffer[..end.head]);
        let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        // 1. Request line
        let request_line = lines.next().unwrap_or_default();
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        let &[method, target, version] = parts.as_slice() else {
            return Err(ParseError::InvalidRequestLine(request_line.to_string()));
        };

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (target.to_string(), String::new()),
        };

        // 2. Headers (las líneas sin ':' se ignoran)
        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        Ok(Request {
            method: Method::from(method),
            target: target.to_string(),
            path,
            query,
            version: version.to_string(),
            headers,
            // 3. Body
            body: buffer[end.body..].to_vec(),
        })
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el target completo (path + query)
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Obtiene el path del request, sin query string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la query string (vacía si no hay)
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene todos los headers (nombres en minúsculas)
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene un header específico, sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// `Content-Length` declarado, si es un número válido
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length")?.parse().ok()
    }

    /// Indica si el cliente envió el body con `Transfer-Encoding: chunked`
    pub fn is_chunked(&self) -> bool {
        self.header("transfer-encoding")
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false)
    }
}
