//! # Tabla de Ruteo
//! src/routing/mod.rs
//!
//! Estructura inmutable construida una sola vez al arrancar, a partir del
//! archivo de configuración. El router la consulta en cada request; como el
//! servidor es de un solo hilo no necesita locks, y se comparte como
//! `Arc<RoutingTable>` de solo lectura.
//!
//! ```text
//! archivo .conf → loader → RoutingTable { defaults, locations[] } → Router
//! ```

pub mod loader;

pub use loader::ConfigError;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Bloque `location <prefix> { ... }`
///
/// Sobrescribe los valores por defecto del servidor para los paths que
/// empiezan con `path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Prefijo de path (ej: "/cgi-bin")
    pub path: String,

    /// Métodos permitidos; vacío significa "todos"
    pub allow_methods: Vec<String>,

    /// Generar listado HTML para directorios sin índice
    pub autoindex: bool,

    /// Archivo índice propio de la location
    pub index: Option<String>,

    /// Document root propio de la location
    pub root: Option<PathBuf>,

    /// Destino de `return`; si existe, todo request responde 301
    pub redirect: Option<String>,

    /// Pares (extensión, intérprete) en orden de configuración (ej: (".py", "/usr/bin/python3"))
    pub cgi: Vec<(String, PathBuf)>,

    /// Directorio donde se guardan los uploads
    pub upload_dir: Option<PathBuf>,
}

impl Location {
    /// Crea una location vacía para el prefijo dado
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Indica si la location declara al menos una extensión CGI
    pub fn has_cgi(&self) -> bool {
        !self.cgi.is_empty()
    }

    /// Busca el intérprete para una extensión (con punto, ej: ".py")
    pub fn interpreter_for(&self, extension: &str) -> Option<&Path> {
        self.cgi
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, interpreter)| interpreter.as_path())
    }
}

/// Valores del bloque `server` que aplican cuando la location no los define
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefaults {
    /// IP de bind
    pub host: String,

    /// Puerto de bind (`listen`)
    pub port: u16,

    /// Nombre exportado en `SERVER_NAME`
    pub server_name: String,

    /// Document root por defecto
    pub root: PathBuf,

    /// Archivo índice por defecto
    pub index: String,

    /// Páginas de error personalizadas: código → path relativo al root
    pub error_pages: HashMap<u16, String>,

    /// Límite de body declarado en la configuración
    pub client_max_body_size: usize,
}

impl Default for ServerDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            server_name: "localhost".to_string(),
            root: PathBuf::from("./"),
            index: "index.html".to_string(),
            error_pages: HashMap::new(),
            client_max_body_size: 1_000_000,
        }
    }
}

/// Tabla de ruteo completa: defaults + locations en orden de configuración
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    pub defaults: ServerDefaults,
    pub locations: Vec<Location>,
}

impl RoutingTable {
    /// Crea una tabla a partir de sus partes
    pub fn new(defaults: ServerDefaults, locations: Vec<Location>) -> Self {
        Self { defaults, locations }
    }

    /// Lee y parsea un archivo de configuración
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        loader::load_file(path)
    }

    /// Dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.defaults.host, self.defaults.port)
    }

    /// Document root efectivo para una location
    pub fn root_for<'a>(&'a self, location: Option<&'a Location>) -> &'a Path {
        location
            .and_then(|loc| loc.root.as_deref())
            .unwrap_or(self.defaults.root.as_path())
    }

    /// Archivo índice efectivo para una location
    pub fn index_for<'a>(&'a self, location: Option<&'a Location>) -> &'a str {
        location
            .and_then(|loc| loc.index.as_deref())
            .unwrap_or(self.defaults.index.as_str())
    }

    /// Directorio de uploads efectivo
    ///
    /// Un `upload_dir` relativo se resuelve contra el root efectivo; sin
    /// `upload_dir` se usa `<root>/uploads`.
    pub fn upload_dir_for(&self, location: Option<&Location>) -> PathBuf {
        let root = self.root_for(location);
        match location.and_then(|loc| loc.upload_dir.as_deref()) {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => root.join(dir),
            None => root.join("uploads"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        let mut cgi = Location::new("/cgi-bin");
        cgi.root = Some(PathBuf::from("/srv/scripts"));
        cgi.index = Some("main.py".to_string());
        cgi.cgi = vec![(".py".to_string(), PathBuf::from("/usr/bin/python3"))];

        let mut uploads = Location::new("/uploads");
        uploads.upload_dir = Some(PathBuf::from("files"));

        let mut absolute = Location::new("/abs");
        absolute.upload_dir = Some(PathBuf::from("/var/uploads"));

        RoutingTable::new(ServerDefaults::default(), vec![cgi, uploads, absolute])
    }

    #[test]
    fn test_default_values() {
        let defaults = ServerDefaults::default();
        assert_eq!(defaults.port, 8080);
        assert_eq!(defaults.index, "index.html");
        assert_eq!(defaults.client_max_body_size, 1_000_000);
    }

    #[test]
    fn test_address() {
        assert_eq!(table().address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_root_and_index_overrides() {
        let table = table();
        let cgi = &table.locations[0];

        assert_eq!(table.root_for(Some(cgi)), Path::new("/srv/scripts"));
        assert_eq!(table.index_for(Some(cgi)), "main.py");
        assert_eq!(table.root_for(None), Path::new("./"));
        assert_eq!(table.index_for(Some(&table.locations[1])), "index.html");
    }

    #[test]
    fn test_interpreter_lookup() {
        let table = table();
        let cgi = &table.locations[0];

        assert!(cgi.has_cgi());
        assert_eq!(cgi.interpreter_for(".py"), Some(Path::new("/usr/bin/python3")));
        assert_eq!(cgi.interpreter_for(".php"), None);
        assert!(!table.locations[1].has_cgi());
    }

    #[test]
    fn test_upload_dir_resolution() {
        let table = table();

        assert_eq!(table.upload_dir_for(Some(&table.locations[1])), PathBuf::from("./files"));
        assert_eq!(table.upload_dir_for(Some(&table.locations[2])), PathBuf::from("/var/uploads"));
        assert_eq!(table.upload_dir_for(None), PathBuf::from("./uploads"));
    }
}
