//! TCP and UDP socket operations backing the source language's `Tcp` and
//! `Udp` namespaces (`spec.md` §1's R3 value library, net category).
//!
//! Sockets are plain OS resources, not arena-tracked like files — the
//! language has no `promote`-style ownership transfer for them in
//! `spec.md`, so this module exposes owned wrapper types instead of
//! arena-registered handles.

use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs, UdpSocket};

fn net_error(message: impl Into<String>) -> Error {
    Error::Network {
        message: message.into(),
    }
}

/// An open TCP connection.
pub struct TcpConnection(TcpStream);

impl TcpConnection {
    /// Connects to `addr` (`"host:port"`).
    pub fn connect(addr: &str) -> Result<Self> {
        TcpStream::connect(addr)
            .map(TcpConnection)
            .map_err(|e| net_error(format!("connect '{addr}': {e}")))
    }

    /// Sends all of `data`.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        self.0
            .write_all(data)
            .map_err(|e| net_error(format!("send: {e}")))
    }

    /// Reads up to `max_len` bytes.
    pub fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let n = self
            .0
            .read(&mut buf)
            .map_err(|e| net_error(format!("receive: {e}")))?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Closes the connection. Dropping the value also closes it; this
    /// exists so codegen can emit an explicit `close()` call site.
    pub fn close(self) {
        drop(self);
    }
}

/// A listening TCP server socket.
pub struct TcpServer(TcpListener);

impl TcpServer {
    /// Binds to `addr` and begins listening.
    pub fn bind(addr: &str) -> Result<Self> {
        TcpListener::bind(addr)
            .map(TcpServer)
            .map_err(|e| net_error(format!("bind '{addr}': {e}")))
    }

    /// Blocks until a client connects, returning the accepted connection.
    pub fn accept(&self) -> Result<TcpConnection> {
        self.0
            .accept()
            .map(|(stream, _addr)| TcpConnection(stream))
            .map_err(|e| net_error(format!("accept: {e}")))
    }

    /// The bound local port.
    pub fn port(&self) -> Result<u16> {
        self.0
            .local_addr()
            .map(|a| a.port())
            .map_err(|e| net_error(format!("local_addr: {e}")))
    }
}

/// A UDP socket, bound or not.
pub struct Udp(UdpSocket);

impl Udp {
    /// Binds a UDP socket to `addr` (use `"0.0.0.0:0"` for an ephemeral
    /// client port).
    pub fn bind(addr: &str) -> Result<Self> {
        UdpSocket::bind(addr)
            .map(Udp)
            .map_err(|e| net_error(format!("bind '{addr}': {e}")))
    }

    /// Sends `data` to `addr`.
    pub fn send_to(&self, data: &[u8], addr: impl ToSocketAddrs) -> Result<usize> {
        self.0
            .send_to(data, addr)
            .map_err(|e| net_error(format!("send_to: {e}")))
    }

    /// Receives up to `max_len` bytes, returning the data and sender
    /// address.
    pub fn receive_from(&self, max_len: usize) -> Result<(Vec<u8>, String)> {
        let mut buf = vec![0u8; max_len];
        let (n, from) = self
            .0
            .recv_from(&mut buf)
            .map_err(|e| net_error(format!("recv_from: {e}")))?;
        buf.truncate(n);
        Ok((buf, from.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn tcp_round_trip() {
        let server = TcpServer::bind("127.0.0.1:0").unwrap();
        let port = server.port().unwrap();
        let handle = thread::spawn(move || {
            let mut conn = TcpConnection::connect(&format!("127.0.0.1:{port}")).unwrap();
            conn.send(b"ping").unwrap();
        });
        let mut accepted = server.accept().unwrap();
        let received = accepted.receive(16).unwrap();
        assert_eq!(&received, b"ping");
        handle.join().unwrap();
    }

    #[test]
    fn udp_round_trip() {
        let server = Udp::bind("127.0.0.1:0").unwrap();
        let server_addr = server.0.local_addr().unwrap().to_string();
        let client = Udp::bind("127.0.0.1:0").unwrap();
        client.send_to(b"hello", &server_addr).unwrap();
        let (data, _from) = server.receive_from(16).unwrap();
        assert_eq!(&data, b"hello");
    }

    #[test]
    fn connect_to_closed_port_is_a_network_error() {
        let result = TcpConnection::connect("127.0.0.1:1");
        assert!(result.is_err());
    }
}
