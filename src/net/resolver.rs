//! Hostname resolution for the listener.
//!
//! A host/port pair can resolve to several addresses (IPv4 and IPv6, or
//! multiple A records). The whole list is returned as an owned `Vec`, so it
//! is released with its owner; [`Server::bind`](crate::net::server::Server::bind)
//! walks it in order until one address accepts the bind.

use async_std::net::ToSocketAddrs;
use std::net::SocketAddr;

pub async fn resolve(host: &str, port: u16) -> std::io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().await?.collect();

    if addrs.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no addresses resolved for {host}:{port}"),
        ));
    }

    Ok(addrs)
}
