// Response Sink Port - where headers and the payload are written

/// Response channel for one request
///
/// `set_header` replaces any earlier value with the same name
/// (case-insensitive), so re-running a stage never duplicates headers.
pub trait ResponseSink: Send {
    fn set_header(&mut self, name: &str, value: &str);

    fn write_body(&mut self, chunk: &str);

    /// In-process embedding: the payload is written without a trailing newline
    fn is_embedded(&self) -> bool {
        false
    }
}

/// In-memory response, used by the HTTP front-end and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedResponse {
    headers: Vec<(String, String)>,
    body: String,
    embedded: bool,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embedded() -> Self {
        Self {
            embedded: true,
            ..Self::default()
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_parts(self) -> (Vec<(String, String)>, String) {
        (self.headers, self.body)
    }
}

impl ResponseSink for BufferedResponse {
    fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn write_body(&mut self, chunk: &str) {
        self.body.push_str(chunk);
    }

    fn is_embedded(&self) -> bool {
        self.embedded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut response = BufferedResponse::new();
        response.set_header("Content-Type", "text/plain");
        response.set_header("content-type", "application/json");

        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_body_appends() {
        let mut response = BufferedResponse::embedded();
        response.write_body("{");
        response.write_body("}");
        assert_eq!(response.body(), "{}");
        assert!(response.is_embedded());
    }
}
