//! Request reading.
//!
//! [`RequestReader`] extracts a [`Submission`] from a request body — either
//! url-encoded fields or a multipart body carrying file uploads. The host
//! CMS passes the raw body and content type; anvil-forms never touches the
//! server's request object directly.

use anvil_forms_core::{FormsError, FormsResult};
use anvil_forms_http::{multipart, FormData, DEFAULT_MAX_FILE_SIZE};

use crate::submission::Submission;

/// Reads submissions out of request bodies.
pub struct RequestReader {
    max_file_size: usize,
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestReader {
    /// Creates a reader with the default in-memory file size cap.
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Overrides the in-memory file size cap.
    #[must_use]
    pub const fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Reads a submission from a request body.
    ///
    /// Multipart bodies are detected from the content type; anything else
    /// is treated as url-encoded.
    pub fn read(
        &self,
        form_name: &str,
        body: &[u8],
        content_type: &str,
    ) -> FormsResult<Submission> {
        if content_type.starts_with("multipart/form-data") {
            self.read_multipart(form_name, body, content_type)
        } else {
            Ok(self.read_urlencoded(form_name, &String::from_utf8_lossy(body)))
        }
    }

    /// Reads a submission from an url-encoded body.
    pub fn read_urlencoded(&self, form_name: &str, body: &str) -> Submission {
        Submission::from_form_data(form_name, &FormData::parse(body))
    }

    /// Reads a submission from a multipart body, extracting fields and one
    /// uploaded file per file field.
    pub fn read_multipart(
        &self,
        form_name: &str,
        body: &[u8],
        content_type: &str,
    ) -> FormsResult<Submission> {
        let boundary = multipart::extract_boundary(content_type).ok_or_else(|| {
            FormsError::Configuration(format!(
                "Multipart content type without a boundary: {content_type}"
            ))
        })?;

        let data = multipart::parse_multipart(body, boundary, self.max_file_size)?;

        let mut submission = Submission::new(form_name);
        for (name, values) in &data.fields {
            if let Some(last) = values.last() {
                submission.raw.insert(name.clone(), last.clone());
            }
        }
        for (name, files) in data.files {
            if let Some(file) = files.into_iter().next() {
                submission.raw.insert(name.clone(), file.name.clone());
                submission.files.insert(name, file);
            }
        }

        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_urlencoded() {
        let reader = RequestReader::new();
        let submission = reader.read_urlencoded("contact", "name=Alice&message=hi+there");
        assert_eq!(submission.raw_value("name"), Some("Alice"));
        assert_eq!(submission.raw_value("message"), Some("hi there"));
        assert!(submission.files.is_empty());
    }

    #[test]
    fn test_read_dispatches_on_content_type() {
        let reader = RequestReader::new();
        let submission = reader
            .read("contact", b"name=Alice", "application/x-www-form-urlencoded")
            .unwrap();
        assert_eq!(submission.raw_value("name"), Some("Alice"));
    }

    #[test]
    fn test_read_multipart() {
        let boundary = "b123";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"name\"\r\n\
             \r\n\
             Alice\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"cv\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\
             \r\n\
             PDF data\r\n\
             --{boundary}--\r\n"
        );

        let reader = RequestReader::new();
        let submission = reader
            .read(
                "jobs",
                body.as_bytes(),
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .unwrap();

        assert_eq!(submission.raw_value("name"), Some("Alice"));
        // The file field's raw value is its filename
        assert_eq!(submission.raw_value("cv"), Some("cv.pdf"));
        assert_eq!(submission.files.get("cv").unwrap().content, b"PDF data");
    }

    #[test]
    fn test_read_multipart_without_boundary() {
        let reader = RequestReader::new();
        let result = reader.read("jobs", b"", "multipart/form-data");
        assert!(result.is_err());
    }

    #[test]
    fn test_max_file_size_enforced() {
        let boundary = "b123";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"cv\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\
             \r\n\
             0123456789\r\n\
             --{boundary}--\r\n"
        );

        let reader = RequestReader::new().with_max_file_size(5);
        let result = reader.read_multipart(
            "jobs",
            body.as_bytes(),
            &format!("multipart/form-data; boundary={boundary}"),
        );
        assert!(matches!(result, Err(FormsError::Upload(_))));
    }
}
