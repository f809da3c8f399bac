//! # Gateway CGI
//! src/cgi/mod.rs
//!
//! Ejecuta scripts externos a través de un intérprete y traduce su salida a
//! una [`Response`].
//!
//! ## Ciclo de vida de un intercambio
//!
//! ```text
//! Idle → PipesCreated → Spawned → ParentWriting → ParentReading
//!      → Waited → Translated → Done
//!
//! (cualquier estado) → Failed
//! ```
//!
//! La ejecución es síncrona: el reactor queda bloqueado hasta que el hijo
//! termina. El hijo hereda stderr del servidor, así los errores del script
//! quedan en el mismo log.

pub mod env;
pub mod output;
pub mod process;

pub use env::{build_env, CgiEnv, ServerInfo};

use crate::http::{Request, Response};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errores de un intercambio CGI; todos terminan en 500
#[derive(Debug, Error)]
pub enum CgiError {
    /// La extensión no tiene intérprete o el intérprete no existe
    #[error("no CGI interpreter available: {0:?}")]
    MissingInterpreter(PathBuf),

    /// No se pudo crear el proceso hijo
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error de I/O en los pipes
    #[error("CGI pipe error: {0}")]
    Io(#[from] std::io::Error),

    /// El script terminó con código distinto de 0 o por una señal
    #[error("CGI script exited with status {code:?}")]
    Failed { code: Option<i32> },
}

/// Estado de un intercambio CGI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgiState {
    Idle,
    PipesCreated,
    Spawned,
    ParentWriting,
    ParentReading,
    Waited,
    Translated,
    Done,
    Failed,
}

/// Intercambio en curso: script, intérprete y estado actual
///
/// Nunca se reutiliza; cada request CGI crea uno nuevo.
#[derive(Debug)]
pub struct CgiExchange {
    script: PathBuf,
    state: CgiState,
}

impl CgiExchange {
    pub fn new(script: &Path) -> Self {
        Self {
            script: script.to_path_buf(),
            state: CgiState::Idle,
        }
    }

    /// Avanza al siguiente estado
    pub fn transition(&mut self, next: CgiState) {
        debug!(script = %self.script.display(), from = ?self.state, to = ?next, "cgi");
        self.state = next;
    }

    pub fn state(&self) -> CgiState {
        self.state
    }
}

/// Ejecutor de scripts CGI
#[derive(Debug, Clone)]
pub struct CgiGateway {
    server: ServerInfo,
}

impl CgiGateway {
    pub fn new(server: ServerInfo) -> Self {
        Self { server }
    }

    /// Ejecuta `script` con `interpreter` y traduce su salida
    ///
    /// El body del request se escribe completo en el stdin del hijo solo
    /// para POST. Un código de salida distinto de 0 es un error.
    pub fn execute(
        &self,
        request: &Request,
        script: &Path,
        interpreter: &Path,
    ) -> Result<Response, CgiError> {
        let mut exchange = CgiExchange::new(script);

        let result = self.run(&mut exchange, request, script, interpreter);
        match &result {
            Ok(response) => {
                exchange.transition(CgiState::Done);
                info!(
                    script = %script.display(),
                    bytes = response.body().len(),
                    "CGI completado"
                );
            }
            Err(e) => {
                exchange.transition(CgiState::Failed);
                warn!(script = %script.display(), error = %e, "CGI falló");
            }
        }

        result
    }

    fn run(
        &self,
        exchange: &mut CgiExchange,
        request: &Request,
        script: &Path,
        interpreter: &Path,
    ) -> Result<Response, CgiError> {
        if interpreter.as_os_str().is_empty() || !interpreter.exists() {
            return Err(CgiError::MissingInterpreter(interpreter.to_path_buf()));
        }

        let env = build_env(request, script, &self.server);
        let input: &[u8] = match request.method() {
            crate::http::Method::POST => request.body(),
            _ => &[],
        };

        let finished = process::spawn(exchange, interpreter, &[script.as_os_str()], &env, input)?;
        if finished.code != Some(0) {
            return Err(CgiError::Failed {
                code: finished.code,
            });
        }

        let response = output::translate(&finished.stdout);
        exchange.transition(CgiState::Translated);
        Ok(response)
    }
}
