use axum::http::{HeaderMap, header};
use percent_encoding::percent_decode_str;

/// Boundary token of a `multipart/form-data` request, if it declares one
pub fn form_data_boundary(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let parsed: mime::Mime = content_type.parse().ok()?;

    if parsed.essence_str() != mime::MULTIPART_FORM_DATA.essence_str() {
        return None;
    }

    let boundary = parsed.get_param(mime::BOUNDARY)?.as_str();
    if boundary.is_empty() {
        return None;
    }
    Some(boundary.to_string())
}

/// Parsed `Content-Disposition` header of one multipart section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    pub disposition_type: String,
    pub file_name: Option<String>,
}

impl ContentDisposition {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::CONTENT_DISPOSITION)?;
        Self::parse(&String::from_utf8_lossy(value.as_bytes()))
    }

    /// Parses `form-data; name="file"; filename="photo.jpg"`.
    /// `filename*` (RFC 5987, UTF-8 only) wins over `filename` when both are present.
    pub fn parse(value: &str) -> Option<Self> {
        let mut params = split_params(value).into_iter();
        let disposition_type = params.next()?.trim().to_ascii_lowercase();
        if disposition_type.is_empty() || disposition_type.contains('=') {
            return None;
        }

        let mut file_name = None;
        let mut file_name_ext = None;

        for param in params {
            let Some((key, raw)) = param.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let raw = raw.trim();

            match key.as_str() {
                "filename" => file_name = Some(unquote(raw)),
                "filename*" => file_name_ext = decode_ext_value(raw),
                _ => {}
            }
        }

        Some(Self {
            disposition_type,
            file_name: file_name_ext.or(file_name),
        })
    }

    /// Disposition type is `form-data` and a non-empty file name is present
    pub fn file_part_name(&self) -> Option<&str> {
        if self.disposition_type != "form-data" {
            return None;
        }
        self.file_name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// Splits on `;` outside of quoted strings
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unquote(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) else {
        return raw.to_string();
    };

    // Only `\"` and `\\` are escapes; other backslashes (Windows paths) are literal
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if next == '"' || next == '\\' => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}

fn decode_ext_value(raw: &str) -> Option<String> {
    let (charset, rest) = raw.split_once('\'')?;
    let (_language, encoded) = rest.split_once('\'')?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_form_data_boundary() {
        let headers = headers_with_content_type("multipart/form-data; boundary=abc123");
        assert_eq!(form_data_boundary(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_form_data_boundary_rejects() {
        assert!(form_data_boundary(&HeaderMap::new()).is_none());
        assert!(form_data_boundary(&headers_with_content_type("multipart/form-data")).is_none());
        assert!(form_data_boundary(&headers_with_content_type("application/json")).is_none());
        assert!(form_data_boundary(&headers_with_content_type("multipart/mixed; boundary=x")).is_none());
    }

    #[test]
    fn test_parse_file_part() {
        let cd = ContentDisposition::parse(r#"form-data; name="file"; filename="photo.jpg""#).unwrap();
        assert_eq!(cd.disposition_type, "form-data");
        assert_eq!(cd.file_part_name(), Some("photo.jpg"));
    }

    #[test]
    fn test_parse_quoted_and_extended_names() {
        let cd = ContentDisposition::parse(r#"form-data; name="f"; filename="semi;colon \"q\".jpg""#).unwrap();
        assert_eq!(cd.file_name.as_deref(), Some("semi;colon \"q\".jpg"));

        let cd = ContentDisposition::parse(
            "form-data; name=f; filename=fallback.jpg; filename*=UTF-8''%E5%86%99%E7%9C%9F.jpg",
        )
        .unwrap();
        assert_eq!(cd.file_name.as_deref(), Some("写真.jpg"));
    }

    #[test]
    fn test_parse_keeps_path_backslashes() {
        let cd = ContentDisposition::parse(r#"form-data; name="file"; filename="C:\Users\me\photo.jpg""#).unwrap();
        assert_eq!(cd.file_part_name(), Some(r"C:\Users\me\photo.jpg"));

        let cd = ContentDisposition::parse(r#"form-data; name="file"; filename="a\\b \"c\".jpg""#).unwrap();
        assert_eq!(cd.file_name.as_deref(), Some(r#"a\b "c".jpg"#));
    }

    #[test]
    fn test_missing_disposition_header() {
        let headers = headers_with_content_type("text/plain");
        assert!(ContentDisposition::from_headers(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("form-data; name=\"file\"; filename=\"photo.jpg\""),
        );
        let cd = ContentDisposition::from_headers(&headers).unwrap();
        assert_eq!(cd.file_part_name(), Some("photo.jpg"));
    }

    #[test]
    fn test_non_file_parts() {
        let text_field = ContentDisposition::parse(r#"form-data; name="comment""#).unwrap();
        assert_eq!(text_field.file_part_name(), None);

        let empty_name = ContentDisposition::parse(r#"form-data; name="file"; filename="""#).unwrap();
        assert_eq!(empty_name.file_part_name(), None);

        let attachment = ContentDisposition::parse(r#"attachment; filename="photo.jpg""#).unwrap();
        assert_eq!(attachment.file_part_name(), None);

        assert!(ContentDisposition::parse("").is_none());
        assert!(ContentDisposition::parse("filename=\"x.jpg\"").is_none());
    }
}
