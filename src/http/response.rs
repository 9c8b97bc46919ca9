use crate::http::headers::HeaderMap;
use crate::http::status::HttpStatus;

pub struct HttpResponse {
    pub status: HttpStatus,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(status: HttpStatus, content_type: &str, body: Vec<u8>) -> Self {
        let mut res = Self::new(status);
        res.headers.insert("Content-Type", content_type);
        res.headers.insert("Content-Length", &body.len().to_string());
        res.body = body;
        res
    }

    /// Serialize the status line and header block, ready to be written
    /// ahead of the body.
    ///
    /// ```text
    /// HTTP/1.1 <status> <reason>\r\n
    /// <header_name>: <header_value>\r\n
    /// ...
    /// \r\n
    /// ```
    pub fn build_headers(&self) -> String {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status as usize, self.status.reason());
        head.push_str(&self.headers.stringify());
        head.push_str("\r\n");
        head
    }
}
