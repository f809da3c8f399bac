//! # Webserv - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor.
//!
//! Códigos de salida: 0 al apagarse normalmente (o con `--help`), 1 ante
//! argumentos inválidos, configuración inválida o error fatal.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use webserv::config::Config;
use webserv::routing::RoutingTable;
use webserv::server::{install_signal_handlers, Server, ServerError, ShutdownToken};

fn main() -> ExitCode {
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) => {
            let _ = e.print();
            // --help y --version también llegan como "error"
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("=================================");
    println!("  Webserv HTTP/1.1");
    println!("  poll(2) + CGI, un solo hilo");
    println!("=================================\n");

    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("💥 Error fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), ServerError> {
    let table = Arc::new(RoutingTable::load(&config.config_file)?);
    config.print_summary(&table);

    let shutdown = ShutdownToken::new();
    install_signal_handlers(&shutdown).map_err(ServerError::Signal)?;

    let mut server = Server::bind(table, config.settings())?;
    server.run(&shutdown)
}
