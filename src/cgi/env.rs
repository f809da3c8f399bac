//! # Variables de Entorno CGI
//! src/cgi/env.rs
//!
//! Construye las meta-variables CGI/1.1 de un request. El mapa es ordenado
//! para que los logs y los tests sean deterministas; se convierte al formato
//! del proceso recién al hacer spawn.

use crate::http::{Request, SERVER_SOFTWARE};
use std::collections::BTreeMap;
use std::path::Path;

/// Entorno CGI: nombre → valor
pub type CgiEnv = BTreeMap<String, String>;

/// Datos del servidor que se exportan al script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub port: u16,
}

/// Construye el entorno CGI para ejecutar `script` en respuesta a `request`
pub fn build_env(request: &Request, script: &Path, server: &ServerInfo) -> CgiEnv {
    let mut env = CgiEnv::new();

    env.insert("GATEWAY_INTERFACE".into(), "CGI/1.1".into());
    env.insert("SERVER_SOFTWARE".into(), SERVER_SOFTWARE.into());
    env.insert("SERVER_PROTOCOL".into(), request.version().into());
    env.insert("SERVER_NAME".into(), server.name.clone());
    env.insert("SERVER_PORT".into(), server.port.to_string());
    env.insert("REQUEST_METHOD".into(), request.method().as_str().into());
    env.insert("REQUEST_URI".into(), request.target().into());
    env.insert("SCRIPT_NAME".into(), request.path().into());
    env.insert("SCRIPT_FILENAME".into(), script.to_string_lossy().into_owned());
    env.insert("QUERY_STRING".into(), request.query().into());
    // Requerido por php-cgi
    env.insert("REDIRECT_STATUS".into(), "200".into());

    let body_length = Some(request.body().len()).filter(|&len| len > 0);
    if let Some(length) = request.content_length().or(body_length) {
        env.insert("CONTENT_LENGTH".into(), length.to_string());
    }
    if let Some(content_type) = request.header("content-type") {
        env.insert("CONTENT_TYPE".into(), content_type.into());
    }

    for (name, value) in request.headers() {
        env.insert(header_variable(name), value.clone());
    }

    env
}

/// `user-agent` → `HTTP_USER_AGENT`
fn header_variable(name: &str) -> String {
    format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"))
}
