//! # Lectura del Archivo de Configuración
//! src/routing/loader.rs
//!
//! Convierte un archivo estilo nginx en una [`RoutingTable`].
//!
//! ## Ejemplo de archivo
//!
//! ```text
//! server {
//!     listen 8080;
//!     server_name localhost;
//!     root ./www;
//!     error_page 404 /errors/404.html;
//!     client_max_body_size 10M;
//!
//!     location /cgi-bin {
//!         allow_methods GET POST;
//!         cgi_path /usr/bin/python3 /bin/sh;
//!         cgi_ext .py .sh;
//!     }
//!
//!     location /old { return /new; }
//! }
//! ```
//!
//! ## Reglas
//!
//! - `#` inicia un comentario hasta el fin de línea
//! - El `;` final es opcional: el fin de línea también cierra la directiva
//! - `cgi_path` y `cgi_ext` se emparejan por posición
//! - Las directivas desconocidas se ignoran con un warning

use super::{Location, RoutingTable, ServerDefaults};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errores al cargar la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No se pudo leer el archivo
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directiva sin su argumento
    #[error("line {line}: `{directive}` expects a value")]
    MissingValue { line: usize, directive: String },

    /// Argumento con formato inválido (puerto, tamaño, código, on/off)
    #[error("line {line}: invalid value {value:?} for `{directive}`")]
    InvalidValue {
        line: usize,
        directive: String,
        value: String,
    },

    /// Bloque que no es `server` ni `location <prefix>`
    #[error("line {line}: unexpected block `{name}`")]
    UnexpectedBlock { line: usize, name: String },

    /// `}` sin `{` o bloque sin cerrar al final del archivo
    #[error("line {line}: unbalanced braces")]
    UnbalancedBraces { line: usize },
}

/// Lee y parsea un archivo de configuración
pub fn load_file(path: &Path) -> Result<RoutingTable, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// Parsea el contenido de un archivo de configuración
///
/// # Ejemplo
/// ```
/// use webserv::routing::loader::parse;
///
/// let table = parse("server {\n listen 9090;\n location / { autoindex on; }\n}").unwrap();
/// assert_eq!(table.defaults.port, 9090);
/// assert!(table.locations[0].autoindex);
/// ```
pub fn parse(text: &str) -> Result<RoutingTable, ConfigError> {
    let mut parser = Parser::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw_line.split('#').next().unwrap_or_default();

        let mut words: Vec<String> = Vec::new();
        for token in tokenize(content) {
            match token {
                Token::Word(word) => words.push(word),
                Token::Semicolon => parser.statement(line, std::mem::take(&mut words))?,
                Token::Open => parser.open(line, std::mem::take(&mut words))?,
                Token::Close => {
                    parser.statement(line, std::mem::take(&mut words))?;
                    parser.close(line)?;
                }
            }
        }
        parser.statement(line, words)?;
    }

    parser.finish(text.lines().count())
}

enum Token {
    Word(String),
    Semicolon,
    Open,
    Close,
}

/// Separa una línea en palabras, tratando `{`, `}` y `;` como tokens propios
fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token::Word(std::mem::take(current)));
        }
    };

    for ch in content.chars() {
        match ch {
            '{' | '}' | ';' => {
                flush(&mut current, &mut tokens);
                tokens.push(match ch {
                    '{' => Token::Open,
                    '}' => Token::Close,
                    _ => Token::Semicolon,
                });
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);

    tokens
}

/// Location en construcción: las listas CGI se emparejan al cerrar el bloque
struct PendingLocation {
    location: Location,
    cgi_paths: Vec<PathBuf>,
    cgi_exts: Vec<String>,
}

enum Block {
    Server,
    Location(PendingLocation),
}

#[derive(Default)]
struct Parser {
    defaults: ServerDefaults,
    locations: Vec<Location>,
    stack: Vec<Block>,
    servers_seen: usize,
}

impl Parser {
    fn open(&mut self, line: usize, words: Vec<String>) -> Result<(), ConfigError> {
        match words.first().map(String::as_str) {
            Some("server") => {
                self.servers_seen += 1;
                if self.servers_seen > 1 {
                    warn!(line, "solo se soporta un bloque server; se combinan sus directivas");
                }
                self.stack.push(Block::Server);
                Ok(())
            }
            Some("location") => {
                if matches!(self.stack.last(), Some(Block::Location(_))) {
                    return Err(ConfigError::UnexpectedBlock {
                        line,
                        name: "nested location".to_string(),
                    });
                }
                let prefix = words.get(1).ok_or_else(|| ConfigError::MissingValue {
                    line,
                    directive: "location".to_string(),
                })?;
                self.stack.push(Block::Location(PendingLocation {
                    location: Location::new(prefix),
                    cgi_paths: Vec::new(),
                    cgi_exts: Vec::new(),
                }));
                Ok(())
            }
            other => Err(ConfigError::UnexpectedBlock {
                line,
                name: other.unwrap_or_default().to_string(),
            }),
        }
    }

    fn close(&mut self, line: usize) -> Result<(), ConfigError> {
        match self.stack.pop() {
            Some(Block::Location(pending)) => {
                self.locations.push(finish_location(pending, line));
                Ok(())
            }
            Some(Block::Server) => Ok(()),
            None => Err(ConfigError::UnbalancedBraces { line }),
        }
    }

    fn finish(self, last_line: usize) -> Result<RoutingTable, ConfigError> {
        if !self.stack.is_empty() {
            return Err(ConfigError::UnbalancedBraces { line: last_line });
        }
        Ok(RoutingTable::new(self.defaults, self.locations))
    }

    fn statement(&mut self, line: usize, words: Vec<String>) -> Result<(), ConfigError> {
        let Some((directive, args)) = words.split_first() else {
            return Ok(());
        };
        let directive = directive.as_str();

        if let Some(Block::Location(pending)) = self.stack.last_mut() {
            if location_directive(pending, line, directive, args)? {
                return Ok(());
            }
        }

        let value = || first_arg(line, directive, args);
        match directive {
            "listen" => {
                let value = value()?;
                let port = match value.rsplit_once(':') {
                    Some((host, port)) => {
                        self.defaults.host = host.to_string();
                        port
                    }
                    None => value,
                };
                self.defaults.port = port.parse().map_err(|_| invalid(line, directive, value))?;
            }
            "server_name" => self.defaults.server_name = value()?.to_string(),
            "host" => self.defaults.host = value()?.to_string(),
            "root" => self.defaults.root = PathBuf::from(value()?),
            "index" => self.defaults.index = value()?.to_string(),
            "client_max_body_size" => {
                let value = value()?;
                self.defaults.client_max_body_size =
                    parse_size(value).ok_or_else(|| invalid(line, directive, value))?;
            }
            "error_page" => {
                let (page, codes) = args.split_last().ok_or_else(|| missing(line, directive))?;
                if codes.is_empty() {
                    return Err(missing(line, directive));
                }
                for code in codes {
                    let code: u16 = code.parse().map_err(|_| invalid(line, directive, code))?;
                    self.defaults.error_pages.insert(code, page.clone());
                }
            }
            _ => warn!(line, directive, "directiva desconocida o fuera de location, se ignora"),
        }

        Ok(())
    }
}

/// Aplica una directiva propia de `location`; retorna `false` si no lo es
fn location_directive(
    pending: &mut PendingLocation,
    line: usize,
    directive: &str,
    args: &[String],
) -> Result<bool, ConfigError> {
    let location = &mut pending.location;

    match directive {
        "allow_methods" | "methods" => {
            location
                .allow_methods
                .extend(args.iter().map(|m| m.to_ascii_uppercase()));
        }
        "autoindex" => {
            location.autoindex = match first_arg(line, directive, args)? {
                "on" => true,
                "off" => false,
                other => return Err(invalid(line, directive, other)),
            };
        }
        "index" => location.index = Some(first_arg(line, directive, args)?.to_string()),
        "root" => location.root = Some(PathBuf::from(first_arg(line, directive, args)?)),
        "return" => {
            // `return <url>` o `return <code> <url>`
            let target = match args {
                [url] => url,
                [code, url] => {
                    code.parse::<u16>().map_err(|_| invalid(line, directive, code))?;
                    url
                }
                [] => return Err(missing(line, directive)),
                _ => return Err(invalid(line, directive, &args.join(" "))),
            };
            location.redirect = Some(target.clone());
        }
        "cgi_path" => pending.cgi_paths.extend(args.iter().map(PathBuf::from)),
        "cgi_ext" => pending
            .cgi_exts
            .extend(args.iter().map(|ext| normalize_extension(ext))),
        "upload_dir" => location.upload_dir = Some(PathBuf::from(first_arg(line, directive, args)?)),
        _ => return Ok(false),
    }

    Ok(true)
}

fn finish_location(pending: PendingLocation, line: usize) -> Location {
    let PendingLocation {
        mut location,
        cgi_paths,
        cgi_exts,
    } = pending;

    if cgi_paths.len() != cgi_exts.len() {
        warn!(
            line,
            location = %location.path,
            paths = cgi_paths.len(),
            extensions = cgi_exts.len(),
            "cgi_path y cgi_ext tienen distinta cantidad; se emparejan por posición"
        );
    }
    // Una extensión sin intérprete queda con path vacío: el gateway responde 500
    let mut interpreters = cgi_paths.into_iter();
    location.cgi = cgi_exts
        .into_iter()
        .map(|ext| (ext, interpreters.next().unwrap_or_default()))
        .collect();
    location
}

fn normalize_extension(ext: &str) -> String {
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Tamaño con sufijo opcional K, M o G (ej: "10M")
fn parse_size(value: &str) -> Option<usize> {
    let (digits, multiplier) = match value.chars().last()?.to_ascii_uppercase() {
        'K' => (&value[..value.len() - 1], 1024),
        'M' => (&value[..value.len() - 1], 1024 * 1024),
        'G' => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        _ => (value, 1),
    };
    digits.parse::<usize>().ok()?.checked_mul(multiplier)
}

fn first_arg<'a>(line: usize, directive: &str, args: &'a [String]) -> Result<&'a str, ConfigError> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| missing(line, directive))
}

fn missing(line: usize, directive: &str) -> ConfigError {
    ConfigError::MissingValue {
        line,
        directive: directive.to_string(),
    }
}

fn invalid(line: usize, directive: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        line,
        directive: directive.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Servidor de ejemplo
server {
    listen 9090;
    server_name example.test;
    host 0.0.0.0;
    root ./www;
    index home.html;
    error_page 404 /errors/404.html;
    error_page 500 502 /errors/50x.html;
    client_max_body_size 2M;

    location / {
        allow_methods GET;
    }

    location /cgi-bin {
        allow_methods GET POST;
        root ./scripts;
        cgi_path /usr/bin/python3 /bin/sh;
        cgi_ext .py sh;
    }

    location /uploads {
        upload_dir uploads;
        autoindex on;
        index list.html;
    }

    location /old { return 301 /new; }
}
"#;

    #[test]
    fn test_server_defaults() {
        let table = parse(SAMPLE).unwrap();
        let defaults = &table.defaults;

        assert_eq!(defaults.port, 9090);
        assert_eq!(defaults.host, "0.0.0.0");
        assert_eq!(defaults.server_name, "example.test");
        assert_eq!(defaults.root, PathBuf::from("./www"));
        assert_eq!(defaults.index, "home.html");
        assert_eq!(defaults.client_max_body_size, 2 * 1024 * 1024);
        assert_eq!(defaults.error_pages.get(&404).map(String::as_str), Some("/errors/404.html"));
        assert_eq!(defaults.error_pages.get(&502).map(String::as_str), Some("/errors/50x.html"));
    }

    #[test]
    fn test_locations_in_order() {
        let table = parse(SAMPLE).unwrap();
        let paths: Vec<&str> = table.locations.iter().map(|l| l.path.as_str()).collect();

        assert_eq!(paths, vec!["/", "/cgi-bin", "/uploads", "/old"]);
    }

    #[test]
    fn test_location_directives() {
        let table = parse(SAMPLE).unwrap();
        let cgi = &table.locations[1];
        let uploads = &table.locations[2];

        assert_eq!(cgi.allow_methods, vec!["GET", "POST"]);
        assert_eq!(cgi.root, Some(PathBuf::from("./scripts")));
        assert_eq!(cgi.interpreter_for(".py"), Some(Path::new("/usr/bin/python3")));
        assert_eq!(cgi.interpreter_for(".sh"), Some(Path::new("/bin/sh")));

        assert!(uploads.autoindex);
        assert_eq!(uploads.index.as_deref(), Some("list.html"));
        assert_eq!(uploads.upload_dir, Some(PathBuf::from("uploads")));

        assert_eq!(table.locations[3].redirect.as_deref(), Some("/new"));
    }

    #[test]
    fn test_root_inside_location_does_not_touch_defaults() {
        let table = parse(SAMPLE).unwrap();
        assert_eq!(table.defaults.root, PathBuf::from("./www"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let table = parse("").unwrap();
        assert_eq!(table.defaults, ServerDefaults::default());
        assert!(table.locations.is_empty());
    }

    #[test]
    fn test_listen_with_host() {
        let table = parse("listen 127.0.0.2:8181").unwrap();
        assert_eq!(table.defaults.host, "127.0.0.2");
        assert_eq!(table.defaults.port, 8181);
    }

    #[test]
    fn test_invalid_port() {
        let err = parse("server {\n listen http;\n}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn test_invalid_autoindex() {
        let err = parse("location / {\n autoindex maybe;\n}").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { line: 2, .. }));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            parse("server {\n listen 80;\n").unwrap_err(),
            ConfigError::UnbalancedBraces { .. }
        ));
        assert!(matches!(
            parse("}\n").unwrap_err(),
            ConfigError::UnbalancedBraces { line: 1 }
        ));
    }

    #[test]
    fn test_nested_location_rejected() {
        let err = parse("location /a {\n location /b {\n }\n}").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedBlock { line: 2, .. }));
    }

    #[test]
    fn test_unknown_directive_is_ignored() {
        let table = parse("server {\n gzip on;\n listen 81;\n}").unwrap();
        assert_eq!(table.defaults.port, 81);
    }

    #[test]
    fn test_extension_without_interpreter() {
        let table = parse("location /cgi {\n cgi_path /bin/sh;\n cgi_ext sh py;\n}").unwrap();
        let location = &table.locations[0];

        assert_eq!(location.interpreter_for(".sh"), Some(Path::new("/bin/sh")));
        assert_eq!(location.interpreter_for(".py"), Some(Path::new("")));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("100"), Some(100));
        assert_eq!(parse_size("1k"), Some(1024));
        assert_eq!(parse_size("3M"), Some(3 * 1024 * 1024));
        assert_eq!(parse_size("M"), None);
        assert_eq!(parse_size("ten"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_file(Path::new("/definitely/not/here.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
