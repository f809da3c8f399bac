//! # Envoltorio de poll(2)
//! src/server/poller.rs

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Entrada de la tabla de poll interesada en lectura
pub fn read_interest(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    }
}

/// Entrada de la tabla de poll interesada en escritura
pub fn write_interest(fd: RawFd) -> libc::pollfd {
    libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    }
}

/// Hay datos para leer (o una conexión para aceptar)
pub fn is_readable(entry: &libc::pollfd) -> bool {
    entry.revents & libc::POLLIN != 0
}

/// Se puede escribir sin bloquear
pub fn is_writable(entry: &libc::pollfd) -> bool {
    entry.revents & libc::POLLOUT != 0
}

/// El descriptor se cerró o quedó en error
pub fn is_broken(entry: &libc::pollfd) -> bool {
    entry.revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0
}

/// Bloquea hasta que algún descriptor esté listo o venza `timeout`
///
/// Retorna la cantidad de entradas con eventos. Una señal se reporta como
/// `ErrorKind::Interrupted`.
pub fn poll(entries: &mut [libc::pollfd], timeout: Duration) -> io::Result<usize> {
    let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    // SAFETY: el puntero y el largo vienen de un slice válido durante toda la llamada
    let ready = unsafe { libc::poll(entries.as_mut_ptr(), entries.len() as libc::nfds_t, timeout_ms) };

    if ready < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ready as usize)
    }
}

/// Pone un descriptor en modo no bloqueante
pub fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl con F_GETFL/F_SETFL no toca memoria del proceso
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
