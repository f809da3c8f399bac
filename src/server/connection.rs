//! # Conexión de Cliente
//! src/server/connection.rs
//!
//! Estado por cliente: socket no bloqueante, buffer acumulado y momento de
//! la última actividad. El reactor es su único dueño.
//!
//! Cada lectura busca el separador de headers solo en los bytes nuevos.
//! Encontrado el separador, el largo esperado queda guardado y el flag de
//! completitud se actualiza comparando largos.

use crate::http::assembler;
use crate::http::Response;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 8192;

/// Resultado de una lectura no bloqueante
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Se agregaron `n` bytes al buffer
    Data(usize),
    /// El cliente cerró la conexión
    Closed,
    /// No había nada para leer
    WouldBlock,
}

/// Conexión aceptada y todavía sin responder
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: Vec<u8>,
    last_activity: Instant,
    /// Largo total del request, conocido desde que llegó el separador
    expected_len: Option<usize>,
    complete: bool,
}

impl Connection {
    /// Registra un socket recién aceptado y lo pasa a modo no bloqueante
    pub fn new(stream: TcpStream, peer: SocketAddr) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            peer,
            buffer: Vec::new(),
            last_activity: Instant::now(),
            expected_len: None,
            complete: false,
        })
    }

    pub fn fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Hace una lectura y agrega lo leído al buffer
    pub fn read_available(&mut self) -> io::Result<ReadOutcome> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.stream.read(&mut chunk) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => {
                let previous = self.buffer.len();
                self.buffer.extend_from_slice(&chunk[..n]);
                self.last_activity = Instant::now();
                self.update_completion(previous);
                Ok(ReadOutcome::Data(n))
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                Ok(ReadOutcome::WouldBlock)
            }
            Err(e) => Err(e),
        }
    }

    /// Indica si el buffer ya contiene un request completo
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn update_completion(&mut self, previous: usize) {
        if self.expected_len.is_none() {
            // El separador puede haber empezado en los últimos 3 bytes viejos
            let start = previous.saturating_sub(3);
            if let Some(end) = assembler::header_end_from(&self.buffer, start) {
                self.expected_len = Some(assembler::expected_length(&self.buffer, end));
            }
        }
        self.complete = self.expected_len.is_some_and(|len| self.buffer.len() >= len);
    }

    /// Tiempo transcurrido desde la última lectura
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Escribe la respuesta completa
    ///
    /// La escritura es bloqueante, acotada por `write_timeout`.
    pub fn respond(&mut self, response: &Response, write_timeout: Duration) -> io::Result<()> {
        self.stream.set_nonblocking(false)?;
        self.stream.set_write_timeout(Some(write_timeout))?;
        self.stream.write_all(&response.to_bytes())?;
        self.stream.flush()
    }
}
