use crate::http::headers::HeaderMap;

/// A fully reassembled request, exactly as handed over by the parser: the
/// raw request line, the header map, and the body bytes.
///
/// The request line is kept whole; splitting the target into path and query
/// components is left to whoever needs it.
#[derive(Debug)]
pub struct HttpRequest {
    pub request_line: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// First word of the request line, e.g. `GET`.
    pub fn method(&self) -> Option<&str> {
        self.request_line.split_whitespace().next()
    }

    /// Second word of the request line, e.g. `/index.html`.
    pub fn target(&self) -> Option<&str> {
        self.request_line.split_whitespace().nth(1)
    }
}
