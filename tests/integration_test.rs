//! Tests de integración para el servidor HTTP
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, en un thread
//! aparte, con un document root temporal. Al terminar se cancela el token y
//! se espera al thread.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use webserv::routing::loader;
use webserv::server::{Server, ServerSettings, ShutdownToken};

/// Servidor corriendo en background
struct TestServer {
    addr: SocketAddr,
    token: ShutdownToken,
    handle: Option<JoinHandle<()>>,
    root: tempfile::TempDir,
}

impl TestServer {
    fn start(locations: &str) -> Self {
        Self::start_with(locations, Duration::from_secs(30))
    }

    fn start_with(locations: &str, client_timeout: Duration) -> Self {
        let root = tempfile::tempdir().unwrap();
        populate(root.path());

        let config = format!(
            "server {{\n listen 8080;\n root {};\n error_page 404 /errors/404.html;\n{}\n}}\n",
            root.path().display(),
            locations
        );
        let table = Arc::new(loader::parse(&config).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let settings = ServerSettings {
            client_timeout,
            poll_interval: Duration::from_millis(20),
            write_timeout: Duration::from_secs(5),
        };
        let mut server = Server::from_listener(listener, table, settings).unwrap();
        let addr = server.local_addr().unwrap();

        let token = ShutdownToken::new();
        let handle = thread::spawn({
            let token = token.clone();
            move || server.run(&token).unwrap()
        });

        Self {
            addr,
            token,
            handle: Some(handle),
            root,
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream
    }

    /// Envía un request completo y retorna la response completa
    fn send(&self, raw: &[u8]) -> String {
        let mut stream = self.connect();
        stream.write_all(raw).unwrap();
        read_response(stream)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn populate(root: &Path) {
    fs::write(root.join("index.html"), "<h1>Bienvenido</h1>").unwrap();
    fs::create_dir_all(root.join("errors")).unwrap();
    fs::write(root.join("errors/404.html"), "<h1>custom not found</h1>").unwrap();
    fs::create_dir_all(root.join("files")).unwrap();
    fs::write(root.join("files/a.txt"), "alpha").unwrap();
    fs::create_dir_all(root.join("cgi-bin")).unwrap();
    fs::write(
        root.join("cgi-bin/hello.sh"),
        "printf 'Content-Type: text/plain\\r\\n\\r\\nHELLO %s' \"$QUERY_STRING\"\n",
    )
    .unwrap();
    fs::write(root.join("cgi-bin/echo.sh"), "printf 'Content-Type: text/plain\\n\\n'\ncat\n").unwrap();
}

fn read_response(mut stream: TcpStream) -> String {
    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Helper: extrae el body de una response HTTP
fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

const LOCATIONS: &str = r#"
    location / {
        allow_methods GET HEAD POST;
    }
    location /files {
        autoindex on;
    }
    location /cgi-bin {
        allow_methods GET POST;
        cgi_path /bin/sh;
        cgi_ext .sh;
    }
    location /uploads {
        allow_methods GET POST DELETE;
        upload_dir uploads;
    }
    location /old {
        return /;
    }
"#;

#[test]
fn test_static_index() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", response);
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert!(response.contains("Content-Length: 19\r\n"));
    assert!(response.contains("Server: Webserv/1.0\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert_eq!(extract_body(&response), "<h1>Bienvenido</h1>");
}

#[test]
fn test_head_has_no_body() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"HEAD /index.html HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length: 19\r\n"));
    assert_eq!(extract_body(&response), "");
}

#[test]
fn test_custom_404_page() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"GET /missing.html HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert_eq!(extract_body(&response), "<h1>custom not found</h1>");
}

#[test]
fn test_method_not_allowed() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"DELETE /index.html HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
    assert!(response.contains("Allow: GET, HEAD, POST\r\n"));
}

#[test]
fn test_redirect() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"GET /old/page HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 301 Moved Permanently\r\n"));
    assert!(response.contains("Location: /\r\n"));
}

#[test]
fn test_autoindex() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"GET /files HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(extract_body(&response).contains("a.txt"));
}

#[test]
fn test_traversal_is_forbidden() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"GET /../../etc/passwd HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 403 Forbidden\r\n"));
}

#[test]
fn test_cgi_get_with_query() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"GET /cgi-bin/hello.sh?name=ana HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", response);
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert_eq!(extract_body(&response), "HELLO name=ana");
}

#[test]
fn test_cgi_post_body_in_two_writes() {
    let server = TestServer::start(LOCATIONS);
    let mut stream = server.connect();

    stream
        .write_all(b"POST /cgi-bin/echo.sh HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello")
        .unwrap();
    thread::sleep(Duration::from_millis(100));
    stream.write_all(b" world").unwrap();

    let response = read_response(stream);
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", response);
    assert_eq!(extract_body(&response), "hello world");
}

#[test]
fn test_cgi_large_post_does_not_stall_server() {
    let server = TestServer::start(LOCATIONS);
    let body = vec![b'q'; 1 << 20];
    let mut request = format!(
        "POST /cgi-bin/echo.sh HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);

    let mut stream = server.connect();
    let writer = thread::spawn(move || {
        stream.write_all(&request).unwrap();
        stream
    });
    let stream = writer.join().unwrap();
    let response = read_response(stream);

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {:.80}", response);
    assert!(response.contains(&format!("Content-Length: {}\r\n", body.len())));
    assert_eq!(extract_body(&response).len(), body.len());

    // El reactor sigue atendiendo
    let response = server.send(b"GET /files/a.txt HTTP/1.1\r\n\r\n");
    assert_eq!(extract_body(&response), "alpha");
}

#[test]
fn test_upload_then_delete() {
    let server = TestServer::start(LOCATIONS);
    let body = "--XyZ\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
                Content-Type: text/plain\r\n\r\n0123456789\r\n--XyZ--\r\n";
    let request = format!(
        "POST /uploads HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=XyZ\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );

    let response = server.send(request.as_bytes());
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {}", response);
    let saved = server.root.path().join("uploads/a.txt");
    assert_eq!(fs::read(&saved).unwrap().len(), 10);

    let response = server.send(b"DELETE /uploads/a.txt HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(extract_body(&response).contains("File deleted successfully"));
    assert!(!saved.exists());

    let response = server.send(b"DELETE /uploads/a.txt HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

#[test]
fn test_malformed_request() {
    let server = TestServer::start(LOCATIONS);
    let response = server.send(b"NONSENSE\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn test_idle_client_does_not_block_others() {
    let server = TestServer::start(LOCATIONS);

    let mut idle = server.connect();
    idle.write_all(b"GET / HTTP/1.1\r\n").unwrap();

    let response = server.send(b"GET /files/a.txt HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(extract_body(&response), "alpha");

    idle.write_all(b"\r\n").unwrap();
    let response = read_response(idle);
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[test]
fn test_idle_client_times_out() {
    let server = TestServer::start_with(LOCATIONS, Duration::from_millis(200));
    let stream = server.connect();

    let response = read_response(stream);
    assert!(response.starts_with("HTTP/1.1 408 Request Timeout\r\n"), "got: {}", response);
}
