//! # Webserv
//! src/lib.rs
//!
//! Servidor HTTP/1.1 de un solo proceso y un solo hilo, implementado desde
//! cero sobre `poll(2)`, con soporte para CGI.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Ensamblado, parsing y serialización del protocolo HTTP
//! - `routing`: Tabla de ruteo inmutable cargada del archivo de configuración
//! - `router`: Match de locations por prefijo y políticas (405, 301)
//! - `handlers`: Archivos estáticos, listados, uploads y DELETE
//! - `cgi`: Ejecución de scripts en procesos hijos
//! - `server`: Reactor, conexiones y apagado por señales
//! - `config`: Argumentos CLI
//!
//! ## Flujo de un request
//!
//! ```text
//! poll → read → assembler::is_complete → Request::parse
//!      → Router → Dispatcher → (CGI | static | upload | delete)
//!      → Response::to_bytes → write → close
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use webserv::routing::RoutingTable;
//! use webserv::server::{Server, ServerSettings, ShutdownToken};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let table = RoutingTable::load(Path::new("configs/default.conf")).unwrap();
//! let mut server = Server::bind(Arc::new(table), ServerSettings::default()).unwrap();
//! server.run(&ShutdownToken::new()).unwrap();
//! ```

pub mod cgi;
pub mod config;
pub mod handlers;
pub mod http;
pub mod router;
pub mod routing;
pub mod server;
