//! A minimal HTTP/1.1 server built around an incremental request parser.
//!
//! The interesting part lives in [`http::parser`]: requests are reassembled
//! from whatever byte chunks the transport happens to deliver, without ever
//! assuming a read boundary lines up with a protocol boundary. Everything
//! else (`net`, `handler`) is thin plumbing around that core.

pub mod config;
pub mod handler;
pub mod http;
pub mod net;
