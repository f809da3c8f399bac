//! # Listado de Directorios
//! src/handlers/autoindex.rs

use std::fs;
use std::io;
use std::path::Path;

/// Genera un listado HTML de `dir`, con links relativos a `request_path`
///
/// Las entradas van ordenadas por nombre y los directorios llevan `/` al final.
pub fn render(dir: &Path, request_path: &str) -> io::Result<String> {
    let mut entries: Vec<(String, bool)> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (entry.file_name().to_string_lossy().into_owned(), is_dir)
        })
        .collect();
    entries.sort();

    let base = if request_path.ends_with('/') {
        request_path.to_string()
    } else {
        format!("{}/", request_path)
    };
    let title = escape(request_path);

    let mut html = format!(
        "<html><head><title>Directory Listing</title></head><body>\
         <h1>Directory Listing for {}</h1><ul>",
        title
    );
    html.push_str(&format!("<li><a href=\"{}..\">../</a></li>", escape(&base)));
    for (name, is_dir) in entries {
        let suffix = if is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<li><a href=\"{href}{suffix}\">{label}{suffix}</a></li>",
            href = escape(&format!("{}{}", base, name)),
            label = escape(&name),
            suffix = suffix,
        ));
    }
    html.push_str("</ul></body></html>");

    Ok(html)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
