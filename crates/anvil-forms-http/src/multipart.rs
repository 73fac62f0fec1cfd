//! Multipart form-data parsing for file uploads.
//!
//! Provides [`parse_multipart`] to extract regular fields and uploaded files
//! from a `multipart/form-data` request body.

use std::collections::BTreeMap;

use anvil_forms_core::{FormsError, FormsResult};

/// Default maximum in-memory size for one uploaded file (2.5 MB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 2_621_440;

/// An uploaded file extracted from a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The size of the file content in bytes.
    pub size: usize,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Returns the lowercase extension of the original filename, if any.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// The result of parsing a multipart form-data body.
#[derive(Debug, Clone, Default)]
pub struct MultipartData {
    /// Regular form fields: name to list of values.
    pub fields: BTreeMap<String, Vec<String>>,
    /// Uploaded files: field name to list of files.
    pub files: BTreeMap<String, Vec<UploadedFile>>,
}

/// Extracts the boundary string from a `multipart/form-data` Content-Type
/// header value. Returns `None` if no boundary is present.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    for part in content_type.split(';') {
        if let Some(boundary) = part.trim().strip_prefix("boundary=") {
            let boundary = boundary.trim_matches('"');
            if !boundary.is_empty() {
                return Some(boundary);
            }
            return None;
        }
    }
    None
}

/// Parses a `multipart/form-data` request body.
///
/// Splits the body on the boundary delimiter, reads each part's
/// `Content-Disposition` header, and sorts parts into regular fields and
/// file uploads. Files larger than `max_file_size` are rejected.
pub fn parse_multipart(
    body: &[u8],
    boundary: &str,
    max_file_size: usize,
) -> FormsResult<MultipartData> {
    let mut data = MultipartData::default();

    let delimiter = format!("--{boundary}");
    let end_delimiter = format!("--{boundary}--");

    // Boundaries are ASCII; a lossy view keeps the parsing simple.
    let body_str = String::from_utf8_lossy(body);

    for part in body_str.split(&delimiter) {
        let part = part.trim_start_matches("\r\n").trim_end_matches("\r\n");
        if part.is_empty() || part == "--" || part.starts_with("--") {
            continue;
        }

        // Headers are separated from the part body by a blank line.
        let (headers_str, part_body) = if let Some(pos) = part.find("\r\n\r\n") {
            (&part[..pos], &part[pos + 4..])
        } else if let Some(pos) = part.find("\n\n") {
            (&part[..pos], &part[pos + 2..])
        } else {
            continue;
        };

        let mut field_name = None;
        let mut filename = None;
        let mut content_type = "text/plain".to_string();

        for line in headers_str.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let lower = line.to_lowercase();
            if lower.starts_with("content-disposition:") {
                let value = line[line.find(':').unwrap_or(0) + 1..].trim();
                if let Some(name) = header_param(value, "name") {
                    field_name = Some(name);
                }
                if let Some(fname) = header_param(value, "filename") {
                    filename = Some(fname);
                }
            } else if lower.starts_with("content-type:") {
                content_type = line[line.find(':').unwrap_or(0) + 1..].trim().to_string();
            }
        }

        let Some(name) = field_name else {
            continue;
        };

        let part_body = part_body
            .trim_end_matches("\r\n")
            .trim_end_matches(&end_delimiter)
            .trim_end_matches("\r\n");

        if let Some(fname) = filename {
            if fname.is_empty() && part_body.is_empty() {
                continue;
            }

            let content = part_body.as_bytes().to_vec();
            if content.len() > max_file_size {
                return Err(FormsError::Upload(format!(
                    "File '{fname}' exceeds the maximum upload size of {max_file_size} bytes"
                )));
            }

            data.files.entry(name).or_default().push(UploadedFile {
                name: fname,
                content_type,
                size: content.len(),
                content,
            });
        } else {
            data.fields
                .entry(name)
                .or_default()
                .push(part_body.to_string());
        }
    }

    Ok(data)
}

/// Extracts a parameter from a header value, e.g. `name` from
/// `form-data; name="field1"; filename="file.txt"`.
fn header_param(header_value: &str, param: &str) -> Option<String> {
    let quoted = format!("{param}=\"");
    if let Some(start) = header_value.find(&quoted) {
        let value_start = start + quoted.len();
        if let Some(end) = header_value[value_start..].find('"') {
            return Some(header_value[value_start..value_start + end].to_string());
        }
    }

    let bare = format!("{param}=");
    if let Some(start) = header_value.find(&bare) {
        let value_start = start + bare.len();
        let rest = &header_value[value_start..];
        let end = rest.find(';').unwrap_or(rest.len());
        let value = rest[..end].trim().trim_matches('"');
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}
