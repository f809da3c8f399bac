//! # Ensamblado Incremental de Requests
//! src/http/assembler.rs
//!
//! El reactor lee los sockets en pedazos: un request puede llegar en varias
//! lecturas. Este módulo decide, mirando solo el buffer acumulado, si ya hay
//! un request completo para parsear.
//!
//! ## Reglas
//!
//! - Sin separador de headers (`\r\n\r\n` o `\n\n`) nunca está completo.
//! - GET, HEAD y DELETE están completos en cuanto aparece el separador.
//! - El resto (POST) espera `Content-Length` bytes de body. Sin
//!   `Content-Length` (o con uno inválido) termina en el separador.
//!
//! `Transfer-Encoding: chunked` no se decodifica: el request se considera
//! completo en el separador y el dispatcher lo rechaza con 501.
//!
//! Una vez encontrado el separador, el largo total del request queda fijo.
//! [`crate::server::connection::Connection`] lo guarda con
//! [`expected_length`] y desde ahí solo compara largos, sin volver a
//! recorrer el body.

use super::Method;

/// Posición del separador de headers dentro del buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderEnd {
    /// Índice donde empieza el separador (fin de la sección de headers)
    pub head: usize,

    /// Índice donde empieza el body (justo después del separador)
    pub body: usize,
}

/// Busca el primer separador de headers, aceptando `\r\n\r\n` o `\n\n`
pub fn header_end(buffer: &[u8]) -> Option<HeaderEnd> {
    header_end_from(buffer, 0)
}

/// Igual que [`header_end`], pero empieza a buscar en `start`
///
/// Las posiciones devueltas son relativas al buffer completo. Quien llama
/// debe garantizar que no hay separador completo antes de `start`.
pub fn header_end_from(buffer: &[u8], start: usize) -> Option<HeaderEnd> {
    let window = buffer.get(start..)?;

    match find(window, b"\r\n\r\n") {
        Some(pos) => {
            // Un "\n\n" anterior solo puede empezar antes del "\r\n\r\n"
            let lf = find(&window[..pos + 2], b"\n\n");
            Some(match lf {
                Some(lf) => HeaderEnd { head: start + lf, body: start + lf + 2 },
                None => HeaderEnd { head: start + pos, body: start + pos + 4 },
            })
        }
        None => find(window, b"\n\n").map(|pos| HeaderEnd { head: start + pos, body: start + pos + 2 }),
    }
}

/// Largo total que tendrá el request cuyo separador de headers es `end`
///
/// Para GET, HEAD, DELETE o un POST sin `Content-Length` válido es el fin
/// del separador; si no, el separador más el largo del body.
pub fn expected_length(buffer: &[u8], end: HeaderEnd) -> usize {
    let head = String::from_utf8_lossy(&buffer[..end.head]);
    let mut lines = head.split('\n').map(|line| line.trim_end_matches('\r'));

    let method = lines
        .next()
        .and_then(|line| line.split_whitespace().next())
        .unwrap_or_default();

    if Method::from(method).completes_at_headers() {
        return end.body;
    }

    match content_length(lines) {
        Some(length) => end.body.saturating_add(length),
        None => end.body,
    }
}

/// Indica si el buffer contiene un request completo
///
/// # Ejemplo
///
/// ```
/// use webserv::http::assembler::is_complete;
///
/// assert!(!is_complete(b"GET / HTTP/1.1\r\nHost: x\r\n"));
/// assert!(is_complete(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"));
///
/// let partial = b"POST /up HTTP/1.1\r\nContent-Length: 4\r\n\r\nab";
/// assert!(!is_complete(partial));
/// ```
pub fn is_complete(buffer: &[u8]) -> bool {
    header_end(buffer).is_some_and(|end| buffer.len() >= expected_length(buffer, end))
}

/// Busca `Content-Length` sin distinguir mayúsculas entre las líneas de headers
fn content_length<'a>(lines: impl Iterator<Item = &'a str>) -> Option<usize> {
    lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_end_crlf() {
        let end = header_end(b"GET / HTTP/1.1\r\n\r\nbody").unwrap();
        assert_eq!(end, HeaderEnd { head: 14, body: 18 });
    }

    #[test]
    fn test_header_end_bare_lf() {
        let end = header_end(b"GET / HTTP/1.1\n\nbody").unwrap();
        assert_eq!(end, HeaderEnd { head: 14, body: 16 });
    }

    #[test]
    fn test_header_end_picks_earliest() {
        // El "\n\n" del body no debe ganarle al separador real
        let end = header_end(b"GET / HTTP/1.1\r\n\r\na\n\nb").unwrap();
        assert_eq!(end.body, 18);
    }

    #[test]
    fn test_header_end_lf_before_crlf() {
        let end = header_end(b"GET / HTTP/1.1\n\nx\r\n\r\n").unwrap();
        assert_eq!(end, HeaderEnd { head: 14, body: 16 });
    }

    #[test]
    fn test_header_end_from_offset() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nok";
        let full = header_end(raw).unwrap();

        // El separador cruza el punto donde terminó la lectura anterior
        for start in [0, full.head.saturating_sub(3), full.head] {
            assert_eq!(header_end_from(raw, start), Some(full));
        }
        assert_eq!(header_end_from(raw, full.body), None);
        assert_eq!(header_end_from(raw, raw.len() + 10), None);
    }

    #[test]
    fn test_expected_length() {
        let raw = b"POST /up HTTP/1.1\r\nContent-Length: 10\r\n\r\n";
        let end = header_end(raw).unwrap();
        assert_eq!(expected_length(raw, end), raw.len() + 10);

        let raw = b"DELETE /uploads/a HTTP/1.1\r\nContent-Length: 10\r\n\r\n";
        let end = header_end(raw).unwrap();
        assert_eq!(expected_length(raw, end), raw.len());
    }

    #[test]
    fn test_large_body_with_blank_lines() {
        let head = b"POST /cgi-bin/echo.sh HTTP/1.1\r\nContent-Length: 1048576\r\n\r\n";
        let mut buffer = head.to_vec();
        let body: Vec<u8> = b"line\n\n".iter().copied().cycle().take(1 << 20).collect();

        for chunk in body.chunks(8192) {
            assert!(!is_complete(&buffer));
            buffer.extend_from_slice(chunk);
        }
        assert!(is_complete(&buffer));
        assert_eq!(header_end(&buffer).unwrap().body, head.len());
    }

    #[test]
    fn test_incomplete_without_terminator() {
        assert!(!is_complete(b""));
        assert!(!is_complete(b"GET / HTTP/1.1\r\n"));
        assert!(!is_complete(b"POST / HTTP/1.1\r\nContent-Length: 0\r\n"));
    }

    #[test]
    fn test_get_head_delete_complete_at_terminator() {
        for method in ["GET", "HEAD", "DELETE"] {
            let raw = format!("{} /x HTTP/1.1\r\nContent-Length: 100\r\n\r\n", method);
            assert!(is_complete(raw.as_bytes()), "{} should be complete", method);
        }
    }

    #[test]
    fn test_post_waits_for_content_length() {
        let head = b"POST /upload HTTP/1.1\r\nContent-Length: 5\r\n\r\n";
        let mut buffer = head.to_vec();

        for byte in b"hell" {
            buffer.push(*byte);
            assert!(!is_complete(&buffer));
        }

        buffer.push(b'o');
        assert!(is_complete(&buffer));
        assert_eq!(buffer.len(), head.len() + 5);

        // Bytes extra no cambian el resultado
        buffer.extend_from_slice(b"extra");
        assert!(is_complete(&buffer));
    }

    #[test]
    fn test_content_length_case_insensitive() {
        let raw = b"POST / HTTP/1.1\r\ncontent-LENGTH:   3  \r\n\r\nab";
        assert!(!is_complete(raw));
    }

    #[test]
    fn test_post_without_content_length_completes_at_headers() {
        assert!(is_complete(b"POST / HTTP/1.1\r\nHost: x\r\n\r\n"));
        assert!(is_complete(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\n"));
    }

    #[test]
    fn test_invalid_content_length_completes_at_headers() {
        assert!(is_complete(b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n"));
    }
}
