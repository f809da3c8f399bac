//! # Dispatcher de Requests
//! src/handlers/mod.rs
//!
//! Recibe un request ya ruteado (location resuelta, método permitido, sin
//! redirección) y elige el handler:
//!
//! ```text
//! chunked                         → 501
//! GET / HEAD                      → CGI | archivo | directorio
//! POST multipart + upload_dir     → upload
//! POST con extensión CGI          → CGI
//! POST                            → acuse de recibo
//! DELETE                          → borrar en /uploads/
//! otro                            → 501
//! ```

pub mod autoindex;
pub mod delete;
pub mod error_page;
pub mod static_files;
pub mod upload;

pub use error_page::error_response;

use crate::cgi::{CgiGateway, ServerInfo};
use crate::http::{Method, Request, Response, StatusCode};
use crate::routing::{Location, RoutingTable};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Elige y ejecuta el handler de cada request
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: Arc<RoutingTable>,
    cgi: CgiGateway,
}

impl Dispatcher {
    pub fn new(table: Arc<RoutingTable>) -> Self {
        let cgi = CgiGateway::new(ServerInfo {
            name: table.defaults.server_name.clone(),
            port: table.defaults.port,
        });
        Self { table, cgi }
    }

    /// Respuesta de error con la página configurada para `status`
    pub fn error(&self, status: StatusCode, message: &str) -> Response {
        error_response(&self.table, status, message)
    }

    /// Ejecuta el handler que corresponde al request
    pub fn dispatch(&self, request: &Request, location: Option<&Location>) -> Response {
        if request.is_chunked() {
            return self.error(
                StatusCode::NotImplemented,
                "Chunked transfer encoding is not supported",
            );
        }

        match request.method() {
            Method::GET | Method::HEAD | Method::POST => self.dispatch_content(request, location),
            Method::DELETE => delete::handle_delete(&self.table, request, location),
            Method::Other(name) => {
                debug!(method = %name, "método no implementado");
                self.error(StatusCode::NotImplemented, "Method Not Implemented")
            }
        }
    }

    fn dispatch_content(&self, request: &Request, location: Option<&Location>) -> Response {
        let Some(fs_path) = self.resolve(request, location) else {
            return self.error(StatusCode::Forbidden, "Access Forbidden");
        };

        if let Some(interpreter) = location.and_then(|loc| cgi_interpreter(loc, &fs_path)) {
            return self.run_cgi(request, &fs_path, interpreter);
        }

        match request.method() {
            Method::POST => self.post(request, location),
            _ => static_files::serve(&self.table, request, location, &fs_path),
        }
    }

    fn post(&self, request: &Request, location: Option<&Location>) -> Response {
        let multipart = request
            .header("content-type")
            .is_some_and(|ct| ct.contains("multipart/form-data"));

        if multipart && location.is_some_and(|loc| loc.upload_dir.is_some()) {
            return upload::handle_upload(&self.table, request, location);
        }

        Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/html")
            .with_body(&format!(
                "<html><body><h1>POST request received</h1><p>Body length: {} bytes</p></body></html>",
                request.body().len()
            ))
    }

    fn run_cgi(&self, request: &Request, script: &Path, interpreter: &Path) -> Response {
        if !script.is_file() {
            return self.error(StatusCode::NotFound, "File Not Found");
        }

        match self.cgi.execute(request, script, interpreter) {
            Ok(response) => response,
            Err(e) => {
                warn!(script = %script.display(), error = %e, "error CGI");
                self.error(StatusCode::InternalServerError, "CGI script execution failed")
            }
        }
    }

    /// Path en disco para el request; `None` si intenta salir del root
    fn resolve(&self, request: &Request, location: Option<&Location>) -> Option<PathBuf> {
        let path = request.path();
        if path.contains("..") {
            return None;
        }
        Some(self.table.root_for(location).join(path.trim_start_matches('/')))
    }
}

/// Intérprete para `fs_path` si su extensión es CGI en la location
fn cgi_interpreter<'a>(location: &'a Location, fs_path: &Path) -> Option<&'a Path> {
    if !location.has_cgi() {
        return None;
    }
    let extension = fs_path.extension()?.to_str()?;
    location.interpreter_for(&format!(".{}", extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ServerDefaults;
    use std::fs;

    struct Fixture {
        dir: tempfile::TempDir,
        dispatcher: Dispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
            fs::create_dir(dir.path().join("cgi-bin")).unwrap();
            fs::write(
                dir.path().join("cgi-bin/hello.sh"),
                "printf 'Content-Type: text/plain\\r\\n\\r\\nHELLO'\n",
            )
            .unwrap();

            let mut cgi = Location::new("/cgi-bin");
            cgi.cgi = vec![(".sh".to_string(), PathBuf::from("/bin/sh"))];
            let mut uploads = Location::new("/uploads");
            uploads.upload_dir = Some(PathBuf::from("uploads"));

            let defaults = ServerDefaults {
                root: dir.path().to_path_buf(),
                ..ServerDefaults::default()
            };
            let table = RoutingTable::new(defaults, vec![cgi, uploads]);
            Self {
                dir,
                dispatcher: Dispatcher::new(Arc::new(table)),
            }
        }

        fn location(&self, index: usize) -> Option<&Location> {
            self.dispatcher.table.locations.get(index)
        }
    }

    fn request(raw: &str) -> Request {
        Request::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_static_index() {
        let fx = Fixture::new();
        let response = fx.dispatcher.dispatch(&request("GET / HTTP/1.1\r\n\r\n"), None);

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"<h1>home</h1>");
    }

    #[test]
    fn test_traversal_forbidden() {
        let fx = Fixture::new();
        let response = fx
            .dispatcher
            .dispatch(&request("GET /../etc/passwd HTTP/1.1\r\n\r\n"), None);

        assert_eq!(response.status(), StatusCode::Forbidden);
    }

    #[test]
    fn test_cgi_dispatch() {
        let fx = Fixture::new();
        let response = fx.dispatcher.dispatch(
            &request("GET /cgi-bin/hello.sh HTTP/1.1\r\n\r\n"),
            fx.location(0),
        );

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.body(), b"HELLO");
    }

    #[test]
    fn test_missing_cgi_script() {
        let fx = Fixture::new();
        let response = fx.dispatcher.dispatch(
            &request("GET /cgi-bin/missing.sh HTTP/1.1\r\n\r\n"),
            fx.location(0),
        );

        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_plain_post_acknowledged() {
        let fx = Fixture::new();
        let response = fx.dispatcher.dispatch(
            &request("POST /form HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc"),
            None,
        );

        assert_eq!(response.status(), StatusCode::Ok);
        assert!(String::from_utf8_lossy(response.body()).contains("Body length: 3 bytes"));
    }

    #[test]
    fn test_upload_and_delete() {
        let fx = Fixture::new();
        let body = "--b\r\nContent-Disposition: form-data; name=\"f\"; filename=\"n.txt\"\r\n\r\nhi\r\n--b--\r\n";
        let raw = format!(
            "POST /uploads HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=b\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let response = fx.dispatcher.dispatch(&request(&raw), fx.location(1));
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(fs::read(fx.dir.path().join("uploads/n.txt")).unwrap(), b"hi");

        let response = fx
            .dispatcher
            .dispatch(&request("DELETE /uploads/n.txt HTTP/1.1\r\n\r\n"), fx.location(1));
        assert_eq!(response.status(), StatusCode::Ok);
        assert!(!fx.dir.path().join("uploads/n.txt").exists());
    }

    #[test]
    fn test_chunked_and_unknown_method() {
        let fx = Fixture::new();

        let chunked = request("POST /x HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert_eq!(fx.dispatcher.dispatch(&chunked, None).status(), StatusCode::NotImplemented);

        let put = request("PUT /x HTTP/1.1\r\n\r\n");
        assert_eq!(fx.dispatcher.dispatch(&put, None).status(), StatusCode::NotImplemented);
    }
}
