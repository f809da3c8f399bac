//! # Reactor de un Solo Hilo
//! src/server/reactor.rs
//!
//! Multiplexa el socket de escucha y todas las conexiones con `poll(2)`.
//!
//! ## Tabla de poll
//!
//! ```text
//! pollfds:      [ listener | conn 0 | conn 1 | ... ]
//! connections:             [ conn 0 | conn 1 | ... ]
//! ```
//!
//! Ambas listas se mantienen paralelas: la conexión `i` está en
//! `pollfds[i + 1]`. Borrar preserva el orden, y quien recorre no avanza el
//! cursor después de un borrado.
//!
//! ## Una iteración
//!
//! 1. Expirar conexiones inactivas (408)
//! 2. `poll` con timeout
//! 3. Aceptar conexiones nuevas
//! 4. Leer de las conexiones listas; si el request está completo, rutear,
//!    responder y cerrar
//!
//! El procesamiento es síncrono: mientras corre un script CGI el resto de
//! las conexiones espera.

use super::connection::{Connection, ReadOutcome};
use super::poller;
use super::shutdown::ShutdownToken;
use super::ServerError;
use crate::http::{Request, Response};
use crate::router::Router;
use crate::routing::RoutingTable;
use std::io::{self, ErrorKind};
use std::net::{SocketAddr, TcpListener};
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Parámetros de ejecución del reactor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Inactividad máxima antes de responder 408
    pub client_timeout: Duration,

    /// Timeout de cada llamada a `poll`
    pub poll_interval: Duration,

    /// Límite para escribir una respuesta completa
    pub write_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            client_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1000),
            write_timeout: Duration::from_secs(10),
        }
    }
}

/// Servidor HTTP basado en `poll`
pub struct Server {
    listener: TcpListener,
    router: Router,
    settings: ServerSettings,
    pollfds: Vec<libc::pollfd>,
    connections: Vec<Connection>,
}

impl Server {
    /// Abre el socket de escucha en la dirección de la tabla de ruteo
    pub fn bind(table: Arc<RoutingTable>, settings: ServerSettings) -> Result<Self, ServerError> {
        let address = table.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;
        Self::from_listener(listener, table, settings)
    }

    /// Usa un listener ya abierto (útil para bind en el puerto 0)
    pub fn from_listener(
        listener: TcpListener,
        table: Arc<RoutingTable>,
        settings: ServerSettings,
    ) -> Result<Self, ServerError> {
        listener.set_nonblocking(true)?;
        let pollfds = vec![poller::read_interest(listener.as_raw_fd())];

        Ok(Self {
            listener,
            router: Router::new(table),
            settings,
            pollfds,
            connections: Vec::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Cantidad de conexiones activas
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Corre el loop hasta que se cancele `shutdown` o falle `poll`
    pub fn run(&mut self, shutdown: &ShutdownToken) -> Result<(), ServerError> {
        info!(address = %self.local_addr()?, "servidor escuchando");

        while !shutdown.is_cancelled() {
            self.sweep_timeouts(self.settings.client_timeout);

            match self.poll_ready(self.settings.poll_interval) {
                Ok(0) => continue,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {
                    debug!("poll interrumpido por una señal");
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "poll falló");
                    self.close_all();
                    return Err(ServerError::Poll(e));
                }
            }

            if poller::is_readable(&self.pollfds[0]) {
                self.accept_pending();
            }

            let mut index = 0;
            while index < self.connections.len() {
                let entry = self.pollfds[index + 1];
                let removed = if poller::is_readable(&entry) {
                    self.process_readable(index)
                } else if poller::is_broken(&entry) {
                    self.remove_connection(index);
                    true
                } else {
                    false
                };

                if !removed {
                    index += 1;
                }
            }
        }

        info!("apagando servidor");
        self.close_all();
        Ok(())
    }

    /// Espera a que algún descriptor esté listo
    pub fn poll_ready(&mut self, timeout: Duration) -> io::Result<usize> {
        for entry in &mut self.pollfds {
            entry.revents = 0;
        }
        poller::poll(&mut self.pollfds, timeout)
    }

    /// Acepta todas las conexiones pendientes en el listener
    ///
    /// Retorna cuántas se registraron.
    pub fn accept_pending(&mut self) -> usize {
        let mut accepted = 0;

        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => match Connection::new(stream, peer) {
                    Ok(connection) => {
                        debug!(%peer, "nueva conexión");
                        self.pollfds.push(poller::read_interest(connection.fd()));
                        self.connections.push(connection);
                        accepted += 1;
                    }
                    Err(e) => warn!(%peer, error = %e, "no se pudo configurar la conexión"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "error al aceptar conexión");
                    break;
                }
            }
        }

        accepted
    }

    /// Lee de la conexión `index`; si el request está completo lo atiende
    ///
    /// Retorna `true` si la conexión fue removida.
    pub fn process_readable(&mut self, index: usize) -> bool {
        let Some(connection) = self.connections.get_mut(index) else {
            return false;
        };

        match connection.read_available() {
            Ok(ReadOutcome::WouldBlock) => false,
            Ok(ReadOutcome::Data(_)) if !connection.is_complete() => false,
            Ok(ReadOutcome::Data(_)) => {
                self.respond(index);
                self.remove_connection(index);
                true
            }
            Ok(ReadOutcome::Closed) => {
                debug!(peer = %connection.peer(), "el cliente cerró la conexión");
                self.remove_connection(index);
                true
            }
            Err(e) => {
                debug!(peer = %connection.peer(), error = %e, "error de lectura");
                self.remove_connection(index);
                true
            }
        }
    }

    /// Responde 408 y cierra las conexiones inactivas por más de `threshold`
    ///
    /// Retorna cuántas se cerraron.
    pub fn sweep_timeouts(&mut self, threshold: Duration) -> usize {
        let now = Instant::now();
        let mut expired = 0;
        let mut index = 0;

        while index < self.connections.len() {
            if self.connections[index].idle_for(now) <= threshold {
                index += 1;
                continue;
            }

            let response = self.router.request_timeout();
            let connection = &mut self.connections[index];
            info!(peer = %connection.peer(), "timeout de cliente");
            if let Err(e) = connection.respond(&with_close(response), self.settings.write_timeout) {
                debug!(peer = %connection.peer(), error = %e, "no se pudo enviar 408");
            }
            self.remove_connection(index);
            expired += 1;
        }

        expired
    }

    /// Cierra la conexión `index` y la saca de la tabla de poll
    pub fn remove_connection(&mut self, index: usize) {
        if index < self.connections.len() {
            // El drop del TcpStream cierra el descriptor
            self.connections.remove(index);
            self.pollfds.remove(index + 1);
        }
    }

    /// Cierra todas las conexiones abiertas
    pub fn close_all(&mut self) {
        let open = self.connections.len();
        self.connections.clear();
        self.pollfds.truncate(1);
        if open > 0 {
            debug!(open, "conexiones cerradas");
        }
    }

    fn respond(&mut self, index: usize) {
        let connection = &self.connections[index];
        let (response, summary) = match Request::parse(connection.buffer()) {
            Ok(request) => {
                let response = self.router.route(&request);
                let summary = format!("{} {}", request.method(), request.target());
                (response, summary)
            }
            Err(e) => {
                warn!(peer = %connection.peer(), error = %e, "request inválido");
                (self.router.bad_request(&e.to_string()), "-".to_string())
            }
        };

        info!(
            peer = %connection.peer(),
            request = %summary,
            status = response.status().as_u16(),
            bytes = response.body().len(),
            "respuesta"
        );

        let connection = &mut self.connections[index];
        if let Err(e) = connection.respond(&with_close(response), self.settings.write_timeout) {
            warn!(peer = %connection.peer(), error = %e, "no se pudo enviar la respuesta");
        }
    }
}

/// Toda respuesta cierra la conexión
fn with_close(response: Response) -> Response {
    response.with_header("Connection", "close")
}
