//! Multipart form data parser for signed uploads.
//!
//! Parses `multipart/form-data` bodies into text fields and file parts. This is
//! a synchronous parser that works on the already-collected body bytes. A part
//! is a file when its `Content-Disposition` carries a `filename`; a field may
//! hold several files.

use bytes::Bytes;
use restsign_auth::SignError;

/// A parsed multipart form-data submission.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// Non-file form fields in body order.
    pub fields: Vec<(String, String)>,
    /// File parts in body order, keyed by field name.
    pub files: Vec<(String, Bytes)>,
}

/// Extract the boundary from a `multipart/form-data` content type.
///
/// # Errors
///
/// Returns [`SignError::MalformedMultipartFile`] if the content type is not
/// `multipart/form-data` or the boundary parameter is missing or empty.
pub fn extract_boundary(content_type: &str) -> Result<String, SignError> {
    let mime: mime::Mime = content_type
        .parse()
        .map_err(|e| SignError::MalformedMultipartFile(format!("invalid content type: {e}")))?;

    if mime.type_() != mime::MULTIPART || mime.subtype() != mime::FORM_DATA {
        return Err(SignError::MalformedMultipartFile(format!(
            "expected multipart/form-data, got {content_type}"
        )));
    }

    match mime.get_param(mime::BOUNDARY) {
        Some(boundary) if !boundary.as_str().is_empty() => Ok(boundary.as_str().to_owned()),
        _ => Err(SignError::MalformedMultipartFile(
            "missing boundary in content type".to_owned(),
        )),
    }
}

/// Parse a multipart/form-data body into fields and files.
///
/// An empty body is an empty form.
///
/// # Errors
///
/// Returns [`SignError::MalformedMultipartFile`] if the body carries no
/// boundary delimiter, is not terminated, or contains a part without a header
/// section.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<MultipartForm, SignError> {
    let mut form = MultipartForm::default();
    if body.is_empty() {
        return Ok(form);
    }

    let delimiter = format!("--{boundary}");
    let end_delimiter = format!("--{boundary}--");
    let parts = split_multipart_parts(body, delimiter.as_bytes(), end_delimiter.as_bytes())?;

    for part_bytes in parts {
        let (headers_section, part_body) = split_headers_body(part_bytes).ok_or_else(|| {
            SignError::MalformedMultipartFile("part without header section".to_owned())
        })?;

        let disposition = parse_content_disposition(headers_section);
        let Some(field_name) = disposition.name else {
            continue;
        };

        if disposition.filename.is_some() {
            form.files
                .push((field_name, Bytes::copy_from_slice(part_body)));
        } else {
            let value = String::from_utf8_lossy(part_body).into_owned();
            form.fields.push((field_name, value));
        }
    }

    Ok(form)
}

/// Split the multipart body into individual parts by boundary.
fn split_multipart_parts<'a>(
    body: &'a [u8],
    delimiter: &[u8],
    end_delimiter: &[u8],
) -> Result<Vec<&'a [u8]>, SignError> {
    let mut parts = Vec::new();

    // Skip the preamble.
    let Some(pos) = find_bytes(body, delimiter) else {
        return Err(SignError::MalformedMultipartFile(
            "boundary delimiter not found".to_owned(),
        ));
    };
    if body[pos..].starts_with(end_delimiter) {
        return Ok(parts);
    }
    let mut remaining = skip_crlf(&body[pos + delimiter.len()..]);

    loop {
        let Some(pos) = find_bytes(remaining, delimiter) else {
            return Err(SignError::MalformedMultipartFile(
                "unterminated multipart body".to_owned(),
            ));
        };

        parts.push(strip_trailing_crlf(&remaining[..pos]));
        if remaining[pos..].starts_with(end_delimiter) {
            break;
        }
        remaining = skip_crlf(&remaining[pos + delimiter.len()..]);
    }

    Ok(parts)
}

/// Split a part into headers section and body at the first \r\n\r\n boundary.
fn split_headers_body(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let separator = b"\r\n\r\n";
    find_bytes(part, separator).map(|pos| (&part[..pos], &part[pos + separator.len()..]))
}

struct ContentDisposition {
    name: Option<String>,
    filename: Option<String>,
}

fn parse_content_disposition(headers: &[u8]) -> ContentDisposition {
    let headers_str = String::from_utf8_lossy(headers);
    let mut name = None;
    let mut filename = None;

    for line in headers_str.split("\r\n") {
        if !line
            .to_ascii_lowercase()
            .starts_with("content-disposition:")
        {
            continue;
        }
        for param in line.split(';').skip(1) {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_owned();
            match key.trim().to_ascii_lowercase().as_str() {
                "name" => name = Some(value),
                "filename" => filename = Some(value),
                _ => {}
            }
        }
    }

    ContentDisposition { name, filename }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn skip_crlf(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n").unwrap_or(data)
}

fn strip_trailing_crlf(data: &[u8]) -> &[u8] {
    data.strip_suffix(b"\r\n").unwrap_or(data)
}
