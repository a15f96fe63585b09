/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
}

/// An uploaded file field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Extracts the named file part from a multipart/form-data body.
///
/// Browsers submit an empty part (`filename=""`) for a file input nothing was
/// chosen in; that counts as absent.
pub fn extract_file(body: &[u8], boundary: &str, field_name: &str) -> Option<FilePart> {
    let delimiter = format!("--{}", boundary);
    let parts = split_on(body, delimiter.as_bytes());

    for part in parts {
        let sep = b"\r\n\r\n";
        if let Some(sep_pos) = find_subsequence(part, sep) {
            let headers_str = String::from_utf8_lossy(&part[..sep_pos]);
            if parse_quoted(&headers_str, " name=\"").as_deref() != Some(field_name) {
                continue;
            }
            let filename = parse_quoted(&headers_str, "filename=\"")?;
            let raw = &part[sep_pos + sep.len()..];
            let bytes = raw.strip_suffix(b"\r\n").unwrap_or(raw).to_vec();
            if bytes.is_empty() {
                return None;
            }
            return Some(FilePart { filename, bytes });
        }
    }
    None
}

/// Parses the `key"..."` value from a Content-Disposition header string.
fn parse_quoted(headers: &str, key: &str) -> Option<String> {
    let pos = headers.find(key)?;
    let rest = &headers[pos + key.len()..];
    let end = rest.find('"')?;
    Some(rest[..end].to_owned())
}
