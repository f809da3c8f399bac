//! # Configuración del Servidor
//! src/config.rs
//!
//! Argumentos de línea de comandos y variables de entorno. Todo lo que tiene
//! que ver con rutas, locations y document root vive en el archivo de
//! configuración (ver [`crate::routing::loader`]); acá solo están el path de
//! ese archivo y los tiempos del reactor.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./webserv configs/default.conf --timeout 30 --poll-interval 500
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! WEBSERV_CLIENT_TIMEOUT=10 RUST_LOG=debug ./webserv
//! ```

use crate::routing::RoutingTable;
use crate::server::ServerSettings;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Path por defecto del archivo de configuración
pub const DEFAULT_CONFIG_FILE: &str = "./configs/default.conf";

/// Configuración de arranque del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "webserv")]
#[command(about = "Servidor HTTP/1.1 de un solo hilo con poll(2) y CGI")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Archivo de configuración estilo nginx
    #[arg(value_name = "CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: PathBuf,

    // === Timeouts ===

    /// Segundos de inactividad antes de responder 408
    #[arg(long = "timeout", default_value = "30", env = "WEBSERV_CLIENT_TIMEOUT")]
    pub client_timeout_secs: u64,

    /// Milisegundos que espera cada llamada a poll
    #[arg(long = "poll-interval", default_value = "1000", env = "WEBSERV_POLL_INTERVAL")]
    pub poll_interval_ms: u64,

    /// Segundos máximos para escribir una respuesta
    #[arg(long = "write-timeout", default_value = "10", env = "WEBSERV_WRITE_TIMEOUT")]
    pub write_timeout_secs: u64,
}

impl Config {
    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.client_timeout_secs == 0 {
            return Err("Client timeout must be > 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("Poll interval must be > 0".to_string());
        }
        if self.write_timeout_secs == 0 {
            return Err("Write timeout must be > 0".to_string());
        }
        Ok(())
    }

    /// Parámetros del reactor
    pub fn settings(&self) -> ServerSettings {
        ServerSettings {
            client_timeout: Duration::from_secs(self.client_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
        }
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self, table: &RoutingTable) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║                Webserv Configuration                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", table.address());
        println!("   Server name:  {}", table.defaults.server_name);
        println!("   Root:         {}", table.defaults.root.display());
        println!("   Config file:  {}", self.config_file.display());
        println!();
        println!("⏱  Timeouts:");
        println!("   Client idle:  {} s", self.client_timeout_secs);
        println!("   Poll:         {} ms", self.poll_interval_ms);
        println!("   Write:        {} s", self.write_timeout_secs);
        println!();
        println!("📍 Locations:");
        if table.locations.is_empty() {
            println!("   (none)");
        }
        for location in &table.locations {
            let methods = if location.allow_methods.is_empty() {
                "*".to_string()
            } else {
                location.allow_methods.join(",")
            };
            let mut extras = Vec::new();
            if let Some(target) = &location.redirect {
                extras.push(format!("→ {}", target));
            }
            if location.has_cgi() {
                let exts: Vec<&str> = location.cgi.iter().map(|(ext, _)| ext.as_str()).collect();
                extras.push(format!("cgi {}", exts.join(" ")));
            }
            if location.autoindex {
                extras.push("autoindex".to_string());
            }
            println!("   {:<16} {:<18} {}", location.path, methods, extras.join(", "));
        }
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            client_timeout_secs: 30,
            poll_interval_ms: 1000,
            write_timeout_secs: 10,
        }
    }
}
