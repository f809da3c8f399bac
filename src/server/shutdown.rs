//! # Apagado Cooperativo
//! src/server/shutdown.rs
//!
//! El reactor consulta un [`ShutdownToken`] una vez por iteración. Los
//! handlers de SIGINT, SIGTERM y SIGQUIT solo marcan el flag compartido con
//! el token registrado.
//!
//! Los handlers se instalan sin `SA_RESTART`: una señal interrumpe `poll`
//! con `EINTR` y el loop vuelve a mirar el token de inmediato.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Flag compartido con los handlers de señales
static SIGNAL_FLAG: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Token de cancelación del loop del servidor
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pide que el servidor termine al final de la iteración actual
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

extern "C" fn handle_signal(_signal: libc::c_int) {
    // Solo operaciones atómicas: es lo único seguro dentro de un handler
    if let Some(flag) = SIGNAL_FLAG.get() {
        flag.store(true, Ordering::SeqCst);
    }
}

/// Instala los handlers de SIGINT, SIGTERM y SIGQUIT para `token`
///
/// Solo se puede registrar un token por proceso.
pub fn install_signal_handlers(token: &ShutdownToken) -> io::Result<()> {
    SIGNAL_FLAG
        .set(Arc::clone(&token.cancelled))
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "signal handlers already installed"))?;

    // SAFETY: sigaction se inicializa en cero y el handler solo toca un atómico
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = 0;
        libc::sigemptyset(&mut action.sa_mask);

        for signal in [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT] {
            if libc::sigaction(signal, &action, std::ptr::null_mut()) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
    }

    Ok(())
}
