use std::collections::HashMap;
use std::hash::BuildHasher;

/// Read access to a request's headers by name.
///
/// This is the only thing the decoder needs from a transport, so any header
/// representation can be plugged in.
pub trait HeaderLookup {
    /// Returns the value of the header `name`, if present and representable
    /// as a string.
    fn header_value(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for http::HeaderMap {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|val| val.to_str().ok())
    }
}

impl<S: BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, val)| val.as_str())
    }
}

/// Extracts the value of the parameter `param_name` from a header value such
/// as `form-data; name="field"; filename="a.txt"`.
///
/// Both `key=value` and `key="value"` are accepted. The value is returned
/// with surrounding whitespace trimmed; an absent parameter yields an empty
/// string.
///
/// # Examples
///
/// ```
/// use formspool::extract_param;
///
/// assert_eq!(extract_param("filename", r#"form-data; filename="my file.txt""#), "my file.txt");
/// assert_eq!(extract_param("boundary", "multipart/form-data; boundary=abc123"), "abc123");
/// assert_eq!(extract_param("charset", "text/plain"), "");
/// ```
pub fn extract_param(param_name: &str, header: &str) -> String {
    let key = format!("{}=", param_name);
    let mut from = 0;

    while let Some(rel_idx) = header[from..].find(key.as_str()) {
        let idx = from + rel_idx;
        let value_idx = idx + key.len();
        from = value_idx;

        // `name=` must not match the tail of `filename=`.
        if !at_param_start(header, idx) {
            continue;
        }

        if let Some(value) = match_value(&header[value_idx..]) {
            return value.trim().to_owned();
        }
    }

    String::new()
}

fn at_param_start(header: &str, idx: usize) -> bool {
    header[..idx]
        .chars()
        .next_back()
        .map_or(true, |ch| ch.is_whitespace() || ch == ';')
}

fn match_value(rest: &str) -> Option<&str> {
    if let Some(quoted) = rest.strip_prefix('"') {
        return match quoted.find('"') {
            Some(end) if end > 0 => Some(&quoted[..end]),
            _ => None,
        };
    }

    let end = rest
        .find(|ch: char| ch.is_whitespace() || ch == '"' || ch == ';')
        .unwrap_or_else(|| rest.len());

    if end > 0 {
        Some(&rest[..end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_quoted_param() {
        assert_eq!(extract_param("filename", r#"filename="my file.txt""#), "my file.txt");

        let val = r#"form-data; name="my_field"; filename="file abc.txt""#;
        assert_eq!(extract_param("name", val), "my_field");
        assert_eq!(extract_param("filename", val), "file abc.txt");

        let val = "form-data; name=\"কখগ\"; filename=\"你好.txt\"";
        assert_eq!(extract_param("name", val), "কখগ");
        assert_eq!(extract_param("filename", val), "你好.txt");

        let val = r#"form-data; name="  padded  ""#;
        assert_eq!(extract_param("name", val), "padded");
    }

    #[test]
    fn test_extract_unquoted_param() {
        assert_eq!(extract_param("boundary", "boundary=abc123"), "abc123");
        assert_eq!(
            extract_param("boundary", "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW"),
            "----WebKitFormBoundary7MA4YWxkTrZu0gW"
        );
        assert_eq!(extract_param("name", "form-data; name=field; filename=a.txt"), "field");
        assert_eq!(extract_param("name", "form-data; name=field other"), "field");
    }

    #[test]
    fn test_extract_missing_param() {
        assert_eq!(extract_param("filename", r#"form-data; name="text""#), "");
        assert_eq!(extract_param("boundary", "multipart/form-data"), "");
        assert_eq!(extract_param("name", r#"form-data; name="""#), "");
        assert_eq!(extract_param("name", "form-data; name=; x=y"), "");
        assert_eq!(extract_param("name", r#"form-data; name="unterminated"#), "");
    }

    #[test]
    fn test_extract_respects_param_start() {
        let val = r#"form-data; filename="a.txt"; name="files""#;
        assert_eq!(extract_param("name", val), "files");

        let val = r#"form-data; filename="a.txt""#;
        assert_eq!(extract_param("name", val), "");
    }

    #[test]
    fn test_header_lookup() {
        let mut map = HashMap::new();
        map.insert("content-type".to_owned(), "multipart/form-data; boundary=X".to_owned());
        assert_eq!(map.header_value("Content-Type"), Some("multipart/form-data; boundary=X"));
        assert_eq!(map.header_value("Content-Length"), None);

        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert_eq!(headers.header_value("Content-Type"), Some("text/plain"));
        assert_eq!(headers.header_value("Accept"), None);
    }
}
