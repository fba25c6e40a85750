use rand::RngCore;

/// Framing for a single-part `multipart/form-data` body.
///
/// Only the delimiters are produced here; part content is streamed between
/// [`part_header`](Self::part_header) and [`trailer`](Self::trailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
}

impl Multipart {
    /// Random 60 hex digit boundary.
    pub fn new() -> Self {
        let mut raw = [0u8; 30];
        rand::thread_rng().fill_bytes(&mut raw);
        Self {
            boundary: hex::encode(raw),
        }
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn part_header(&self, field: &str, file_name: &str, content_type: &str) -> String {
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            escape_quotes(field),
            escape_quotes(file_name),
            content_type,
        )
    }

    pub fn trailer(&self) -> String {
        format!("\r\n--{}--\r\n", self.boundary)
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
