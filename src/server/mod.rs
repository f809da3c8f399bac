//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Multiplexa todas las conexiones con `poll(2)` en un solo hilo
//! 3. Acumula lecturas parciales hasta tener un request completo
//! 4. Genera la respuesta, la envía y cierra la conexión
//!
//! El loop termina cuando se cancela el [`ShutdownToken`], típicamente desde
//! un handler de señales.

pub mod connection;
pub mod poller;
pub mod reactor;
pub mod shutdown;

// Re-exportar para facilitar el uso
pub use reactor::{Server, ServerSettings};
pub use shutdown::{install_signal_handlers, ShutdownToken};

use crate::routing::ConfigError;
use thiserror::Error;

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo abrir el socket de escucha
    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// `poll` falló por algo distinto de una señal
    #[error("poll failed: {0}")]
    Poll(#[source] std::io::Error),

    /// Archivo de configuración inválido
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No se pudieron instalar los handlers de señales
    #[error("cannot install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
