//! Incremental reassembly of HTTP/1.1 requests from raw byte chunks.
//!
//! TCP delivers bytes in arbitrary-sized pieces: one read may stop in the
//! middle of a header line, and the `\r\n\r\n` that ends the header section
//! can straddle two reads. [`HeaderParser`] buffers chunks until it has seen
//! that terminator, then splits the section into a request line and a field
//! map. [`RequestParser`] wraps it and keeps accumulating body bytes until
//! the length announced by `content-length` has arrived.
//!
//! Both parsers are driven one chunk at a time by the connection loop in
//! [`net::server`](crate::net::server). They perform no I/O themselves, hold
//! no timeouts, and must be fed chunks in the order they were read from the
//! connection.

use thiserror::Error;
use tracing::{debug, trace};

use crate::http::headers::HeaderMap;
use crate::http::request::HttpRequest;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Malformed input detected while reassembling a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid content-length value {0:?}")]
    InvalidContentLength(String),
}

/// Accumulates chunks until the end of the header section has been seen,
/// then exposes the request line, the field map, and any bytes that arrived
/// past the terminator.
#[derive(Debug, Default)]
pub struct HeaderParser {
    buf: Vec<u8>,
    request_line: String,
    fields: HeaderMap,
    body_prefix: Vec<u8>,
    complete: bool,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_finished(&self) -> bool {
        self.complete
    }

    /// Buffer the next chunk and look for the `\r\n\r\n` terminator.
    ///
    /// The scan resumes three bytes before the old buffer end, the only
    /// position where a terminator straddling the chunk boundary can start.
    /// Rescanning from the front on every call would be quadratic for
    /// headers delivered in many small chunks.
    ///
    /// Once the terminator is found the buffer is frozen to exactly the
    /// header section, everything after the terminator becomes the body
    /// prefix, and the section is split into the request line and fields.
    ///
    /// Feeding a chunk after completion is a bug in the calling loop.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        assert!(!self.complete, "push_chunk called after header completion");

        let scan_from = self.buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        self.buf.extend_from_slice(chunk);
        trace!(chunk_len = chunk.len(), buffered = self.buf.len(), "header chunk buffered");

        let found = self.buf[scan_from..]
            .windows(HEADER_TERMINATOR.len())
            .position(|window| window == HEADER_TERMINATOR);

        if let Some(offset) = found {
            let end = scan_from + offset;
            self.body_prefix = self.buf.split_off(end + HEADER_TERMINATOR.len());
            self.buf.truncate(end);
            self.complete = true;
            self.extract_fields();
        }
    }

    /// Split the finished header section into the request line and the
    /// field map. Field lines are cut at the first `": "`; lines without
    /// that separator are dropped silently.
    fn extract_fields(&mut self) {
        let mut lines = self.buf.split(|&b| b == b'\n');

        if let Some(first) = lines.next() {
            let first = first.strip_suffix(b"\r").unwrap_or(first);
            self.request_line = String::from_utf8_lossy(first).into_owned();
        }

        for line in lines {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let Some(colon) = line.windows(2).position(|w| w == b": ") else {
                continue;
            };
            let name = String::from_utf8_lossy(&line[..colon]);
            let value = String::from_utf8_lossy(&line[colon + 2..]);
            self.fields.insert(&name, &value);
        }

        debug!(
            request_line = %self.request_line,
            fields = self.fields.len(),
            body_prefix = self.body_prefix.len(),
            "header section complete"
        );
    }

    /// The raw header section. Final once [`header_finished`](Self::header_finished)
    /// reports true; partial before that.
    pub fn header(&self) -> &[u8] {
        &self.buf
    }

    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    pub fn fields(&self) -> &HeaderMap {
        &self.fields
    }

    /// Bytes received past the terminator; the start of the body. Only
    /// meaningful after completion.
    pub fn body_prefix(&self) -> &[u8] {
        &self.body_prefix
    }

    pub(crate) fn take_body_prefix(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body_prefix)
    }

    pub(crate) fn into_parts(self) -> (String, HeaderMap) {
        (self.request_line, self.fields)
    }

    pub fn reset_state(&mut self) {
        self.buf.clear();
        self.request_line.clear();
        self.fields.clear();
        self.body_prefix.clear();
        self.complete = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParsePhase {
    AwaitingHeaders,
    AwaitingBody,
    Complete,
}

/// Drives a [`HeaderParser`] and then accumulates body bytes until the
/// length declared by `content-length` (absent means no body) has arrived.
///
/// Completion uses at-least semantics: bytes past the declared length are
/// kept, not truncated. A pipelined follow-up request would therefore be
/// absorbed into the current body; connection reuse is out of scope here.
#[derive(Debug)]
pub struct RequestParser {
    headers: HeaderParser,
    body: Vec<u8>,
    content_length: usize,
    phase: ParsePhase,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            headers: HeaderParser::new(),
            body: Vec::new(),
            content_length: 0,
            phase: ParsePhase::AwaitingHeaders,
        }
    }

    pub fn request_finished(&self) -> bool {
        self.phase == ParsePhase::Complete
    }

    pub fn header_finished(&self) -> bool {
        self.headers.header_finished()
    }

    /// Feed the next chunk read from the connection.
    ///
    /// A single chunk may carry the rest of the header section and the whole
    /// body at once; both transitions happen within the same call.
    ///
    /// Feeding a chunk after completion is a bug in the calling loop.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        assert!(
            self.phase != ParsePhase::Complete,
            "push_chunk called after request completion"
        );

        match self.phase {
            ParsePhase::AwaitingHeaders => {
                self.headers.push_chunk(chunk);
                if self.headers.header_finished() {
                    self.body = self.headers.take_body_prefix();
                    self.phase = ParsePhase::AwaitingBody;
                    self.content_length = self.extract_content_length()?;
                    self.check_body_complete();
                }
            }
            ParsePhase::AwaitingBody => {
                self.body.extend_from_slice(chunk);
                self.check_body_complete();
            }
            ParsePhase::Complete => unreachable!(),
        }

        Ok(())
    }

    fn check_body_complete(&mut self) {
        if self.body.len() >= self.content_length {
            self.phase = ParsePhase::Complete;
            debug!(body_len = self.body.len(), "request complete");
        }
    }

    /// Resolve the expected body length, once, right after the headers
    /// finish. Missing means no body; a value that does not parse as a
    /// non-negative integer is a hard error and the connection loop answers
    /// it with 400.
    fn extract_content_length(&self) -> Result<usize, ParseError> {
        match self.headers.fields().get("content-length") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(raw.to_string())),
            None => Ok(0),
        }
    }

    /// How many header bytes are buffered so far. The connection loop uses
    /// this to bound header growth; the parser itself never rejects on size.
    pub fn buffered_header_len(&self) -> usize {
        self.headers.header().len()
    }

    /// The resolved body length. Zero until the headers finish.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn request_line(&self) -> &str {
        self.headers.request_line()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.headers.fields()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the parser and yield the finished request.
    pub fn into_request(self) -> HttpRequest {
        assert!(self.request_finished(), "into_request called before completion");
        let (request_line, headers) = self.headers.into_parts();
        HttpRequest {
            request_line,
            headers,
            body: self.body,
        }
    }

    /// Return the machine to a fresh state so the same instance can parse
    /// another request.
    pub fn reset_state(&mut self) {
        self.headers.reset_state();
        self.body.clear();
        self.content_length = 0;
        self.phase = ParsePhase::AwaitingHeaders;
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\nContent-Length: 3\r\n\r\nabc";

    fn parse_in_chunks(input: &[u8], chunk_size: usize) -> RequestParser {
        let mut parser = RequestParser::new();
        for chunk in input.chunks(chunk_size) {
            assert!(!parser.request_finished(), "finished before all input was fed");
            parser.push_chunk(chunk).unwrap();
        }
        parser
    }

    #[test]
    fn single_chunk_and_byte_at_a_time_agree() {
        let whole = parse_in_chunks(REQUEST, REQUEST.len());
        let bytewise = parse_in_chunks(REQUEST, 1);

        assert!(whole.request_finished());
        assert!(bytewise.request_finished());
        assert_eq!(whole.request_line(), bytewise.request_line());
        assert_eq!(whole.headers(), bytewise.headers());
        assert_eq!(whole.body(), bytewise.body());
    }

    #[test]
    fn end_to_end_three_chunk_scenario() {
        let mut parser = RequestParser::new();

        parser.push_chunk(&REQUEST[..10]).unwrap();
        assert!(!parser.request_finished());
        parser.push_chunk(&REQUEST[10..30]).unwrap();
        assert!(!parser.request_finished());
        parser.push_chunk(&REQUEST[30..]).unwrap();

        assert!(parser.request_finished());
        assert_eq!(parser.request_line(), "GET / HTTP/1.1");
        assert_eq!(parser.headers().get("host"), Some("x"));
        assert_eq!(parser.headers().get("content-length"), Some("3"));
        assert_eq!(parser.headers().len(), 2);
        assert_eq!(parser.body(), b"abc");
    }

    #[test]
    fn terminator_split_across_chunks() {
        let mut parser = RequestParser::new();

        parser.push_chunk(b"GET / HTTP/1.1\r\nHost: x\r\n\r").unwrap();
        assert!(!parser.header_finished());
        parser.push_chunk(b"\n").unwrap();

        assert!(parser.header_finished());
        assert!(parser.request_finished());
        assert_eq!(parser.headers().get("host"), Some("x"));
    }

    #[test]
    fn headers_and_whole_body_in_one_chunk() {
        let mut parser = RequestParser::new();
        parser.push_chunk(REQUEST).unwrap();

        assert!(parser.request_finished());
        assert_eq!(parser.body(), b"abc");
    }

    #[test]
    fn missing_content_length_completes_with_headers() {
        let mut parser = RequestParser::new();
        parser.push_chunk(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();

        assert!(parser.request_finished());
        assert_eq!(parser.content_length(), 0);
        assert!(parser.body().is_empty());
    }

    #[test]
    fn excess_body_bytes_are_kept() {
        let mut parser = RequestParser::new();
        parser
            .push_chunk(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\n")
            .unwrap();
        assert!(!parser.request_finished());

        parser.push_chunk(b"abcd").unwrap();
        assert!(!parser.request_finished());

        parser.push_chunk(b"efg").unwrap();
        assert!(parser.request_finished());
        assert_eq!(parser.body(), b"abcdefg");
    }

    #[test]
    fn header_names_are_case_insensitive_and_last_wins() {
        let mut parser = RequestParser::new();
        parser
            .push_chunk(b"GET / HTTP/1.1\r\nHOST: a\r\nhost: b\r\n\r\n")
            .unwrap();

        assert!(parser.request_finished());
        assert_eq!(parser.headers().get("Host"), Some("b"));
        assert_eq!(parser.headers().len(), 1);
    }

    #[test]
    fn lines_without_separator_are_skipped() {
        let mut parser = RequestParser::new();
        parser
            .push_chunk(b"GET / HTTP/1.1\r\ngarbage line\r\nColon:nospace\r\nHost: x\r\n\r\n")
            .unwrap();

        assert!(parser.request_finished());
        assert_eq!(parser.headers().len(), 1);
        assert_eq!(parser.headers().get("host"), Some("x"));
        assert_eq!(parser.headers().get("colon"), None);
    }

    #[test]
    fn malformed_content_length_is_rejected() {
        let mut parser = RequestParser::new();
        let result = parser.push_chunk(b"POST / HTTP/1.1\r\nContent-Length: banana\r\n\r\n");

        assert_eq!(
            result,
            Err(ParseError::InvalidContentLength("banana".to_string()))
        );
    }

    #[test]
    fn negative_content_length_is_rejected() {
        let mut parser = RequestParser::new();
        let result = parser.push_chunk(b"POST / HTTP/1.1\r\nContent-Length: -1\r\n\r\n");

        assert_eq!(result, Err(ParseError::InvalidContentLength("-1".to_string())));
    }

    #[test]
    fn header_buffer_is_frozen_on_completion() {
        let mut parser = HeaderParser::new();
        parser.push_chunk(REQUEST);

        assert!(parser.header_finished());
        assert_eq!(parser.header(), b"GET / HTTP/1.1\r\nHost: x\r\nContent-Length: 3");
        assert_eq!(parser.body_prefix(), b"abc");
    }

    #[test]
    fn partial_crlf_runs_do_not_trigger_completion() {
        let mut parser = HeaderParser::new();

        parser.push_chunk(b"GET / HTTP/1.1\r");
        parser.push_chunk(b"\nA: 1\r");
        parser.push_chunk(b"\nB: 2\r\n");
        assert!(!parser.header_finished());

        parser.push_chunk(b"\r\n");
        assert!(parser.header_finished());
        assert_eq!(parser.fields().get("a"), Some("1"));
        assert_eq!(parser.fields().get("b"), Some("2"));
    }

    #[test]
    fn reset_allows_parsing_a_second_request() {
        let mut parser = parse_in_chunks(REQUEST, 7);
        assert!(parser.request_finished());

        parser.reset_state();
        assert!(!parser.request_finished());
        assert!(!parser.header_finished());

        parser
            .push_chunk(b"PUT /other HTTP/1.1\r\nContent-Length: 2\r\n\r\nok")
            .unwrap();
        assert!(parser.request_finished());
        assert_eq!(parser.request_line(), "PUT /other HTTP/1.1");
        assert_eq!(parser.body(), b"ok");
    }

    #[test]
    fn into_request_hands_off_all_parts() {
        let parser = parse_in_chunks(REQUEST, 5);
        let request = parser.into_request();

        assert_eq!(request.request_line, "GET / HTTP/1.1");
        assert_eq!(request.headers.get("host"), Some("x"));
        assert_eq!(request.body, b"abc");
    }

    #[test]
    #[should_panic(expected = "push_chunk called after request completion")]
    fn pushing_after_completion_panics() {
        let mut parser = RequestParser::new();
        parser.push_chunk(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(parser.request_finished());

        let _ = parser.push_chunk(b"more");
    }

    #[test]
    #[should_panic(expected = "push_chunk called after header completion")]
    fn pushing_into_finished_header_parser_panics() {
        let mut parser = HeaderParser::new();
        parser.push_chunk(b"GET / HTTP/1.1\r\n\r\n");
        assert!(parser.header_finished());

        parser.push_chunk(b"more");
    }
}
