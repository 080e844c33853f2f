//! Filename extraction from `Content-Disposition` headers.

use filehub_core::constants::DEFAULT_DOWNLOAD_FILENAME;

/// Pick the download filename from a `Content-Disposition` value.
///
/// `filename*` (RFC 5987, `charset'lang'percent-encoded`) wins over a plain
/// `filename`. The result is reduced to a single safe path component; anything
/// unusable yields [`DEFAULT_DOWNLOAD_FILENAME`].
pub fn filename_from_header(header: Option<&str>) -> String {
    header
        .and_then(extract)
        .and_then(|name| sanitize(&name))
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_FILENAME.to_string())
}

fn extract(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(header) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(value.trim()),
            "filename" => plain = Some(unquote(value.trim())),
            _ => {}
        }
    }

    extended.or(plain)
}

// Splits on `;` outside of double quotes.
fn split_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in header.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&header[start..]);
    params
}

fn unquote(value: &str) -> String {
    value
        .trim_matches('"')
        .replace("\\\"", "\"")
        .trim()
        .to_string()
}

fn decode_extended(value: &str) -> Option<String> {
    let value = unquote(value);
    let encoded = match value.splitn(3, '\'').collect::<Vec<_>>().as_slice() {
        [_charset, _lang, encoded] => encoded.to_string(),
        _ => value.clone(),
    };
    let decoded = match urlencoding::decode(&encoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => encoded,
    };
    let decoded = decoded.trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

fn sanitize(name: &str) -> Option<String> {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .trim_matches('\0');
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}
