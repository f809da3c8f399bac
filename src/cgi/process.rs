//! # Proceso Hijo CGI
//! src/cgi/process.rs
//!
//! Lanza el intérprete con stdin y stdout conectados por pipes y espera al
//! hijo. Los dos pipes quedan en modo no bloqueante y se atienden con
//! `poll(2)`: mientras el body entra por stdin, la salida se va vaciando.
//! Un script que hace eco de su entrada nunca queda trabado con el pipe de
//! salida lleno.

use super::{CgiEnv, CgiError, CgiExchange, CgiState};
use crate::server::poller;
use std::ffi::OsStr;
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::process::{ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

/// Cada cuánto se revisan los pipes si el script no produce nada
const PIPE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Tamaño de cada lectura de stdout
const READ_CHUNK: usize = 8192;

/// Resultado de un proceso ya esperado
#[derive(Debug)]
pub struct Finished {
    /// Código de salida; `None` si terminó por una señal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
}

/// Ejecuta `program args...` con `env` agregado al entorno heredado
pub fn spawn(
    exchange: &mut CgiExchange,
    program: &Path,
    args: &[&OsStr],
    env: &CgiEnv,
    input: &[u8],
) -> Result<Finished, CgiError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .envs(env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    exchange.transition(CgiState::PipesCreated);

    let mut child = command.spawn().map_err(|source| CgiError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;
    exchange.transition(CgiState::Spawned);

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let output = match stdout {
        Some(stdout) => exchange_pipes(exchange, stdin, stdout, input),
        None => Ok(Vec::new()),
    };

    let stdout = match output {
        Ok(stdout) => stdout,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CgiError::Io(e));
        }
    };

    let status = child.wait()?;
    exchange.transition(CgiState::Waited);

    Ok(Finished {
        code: status.code(),
        stdout,
    })
}

/// Escribe `input` en stdin y lee stdout hasta EOF, intercalando ambos
///
/// stdin se cierra apenas se escribió todo, así el script ve EOF.
fn exchange_pipes(
    exchange: &mut CgiExchange,
    stdin: Option<ChildStdin>,
    mut stdout: ChildStdout,
    input: &[u8],
) -> io::Result<Vec<u8>> {
    poller::set_nonblocking(stdout.as_raw_fd())?;

    let mut stdin = match stdin {
        Some(pipe) if !input.is_empty() => {
            poller::set_nonblocking(pipe.as_raw_fd())?;
            exchange.transition(CgiState::ParentWriting);
            Some(pipe)
        }
        _ => None,
    };
    if stdin.is_none() {
        exchange.transition(CgiState::ParentReading);
    }

    let mut written = 0;
    let mut output = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let mut entries = vec![poller::read_interest(stdout.as_raw_fd())];
        if let Some(pipe) = &stdin {
            entries.push(poller::write_interest(pipe.as_raw_fd()));
        }

        match poller::poll(&mut entries, PIPE_POLL_INTERVAL) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }

        if let (Some(pipe), Some(entry)) = (stdin.as_mut(), entries.get(1)) {
            if poller::is_writable(entry) || poller::is_broken(entry) {
                match pipe.write(&input[written..]) {
                    Ok(n) => written += n,
                    Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {}
                    // El script puede terminar sin leer su entrada
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => written = input.len(),
                    Err(e) => return Err(e),
                }
            }
            if written >= input.len() {
                stdin = None;
                exchange.transition(CgiState::ParentReading);
            }
        }

        if poller::is_readable(&entries[0]) || poller::is_broken(&entries[0]) {
            match stdout.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => output.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    Ok(output)
}
