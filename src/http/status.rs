//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado que puede producir el servidor.
//! Cada categoría de error del servidor tiene un código asociado:
//!
//! - **2xx**: Éxito (200 OK)
//! - **3xx**: Redirección de una location con `return` (301)
//! - **4xx**: Error del cliente (400, 403, 404, 405, 408, 413)
//! - **5xx**: Error del servidor (500, 501)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 301 Moved Permanently - La location redirige a otra URL
    MovedPermanently = 301,

    /// 400 Bad Request - Request malformado o upload inválido
    BadRequest = 400,

    /// 403 Forbidden - Path con `..`, archivo ilegible o directorio sin índice
    Forbidden = 403,

    /// 404 Not Found - Ruta o recurso no encontrado
    NotFound = 404,

    /// 405 Method Not Allowed - El método no está en `allow_methods`
    MethodNotAllowed = 405,

    /// 408 Request Timeout - Conexión inactiva más allá del umbral
    RequestTimeout = 408,

    /// 413 Payload Too Large - Upload por encima del límite
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - Error interno (pipes, spawn, escritura, CGI)
    InternalServerError = 500,

    /// 501 Not Implemented - Método desconocido o body chunked
    NotImplemented = 501,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use webserv::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use webserv::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
