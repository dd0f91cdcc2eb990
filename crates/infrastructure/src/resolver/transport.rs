//! UDP transport with TCP fallback on a truncated response, mirroring the
//! teacher's `query_server` truncation-retry path.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tracing::debug;

use surveyor_domain::errors::EngineError;

use crate::wire::{self, DecodedResponse};

const MAX_UDP_RESPONSE: usize = 4096;

pub async fn query(
    server: SocketAddr,
    name: &str,
    record_type: surveyor_domain::record_type::RecordType,
    timeout: Duration,
) -> Result<DecodedResponse, EngineError> {
    let query_bytes = wire::build_query(name, record_type)?;
    let response = send_udp(server, &query_bytes, timeout).await?;
    let decoded = wire::parse_response(&response)?;

    if decoded.truncated {
        debug!(%server, %name, "response truncated, retrying over TCP");
        let tcp_response = send_tcp(server, &query_bytes, timeout).await?;
        return wire::parse_response(&tcp_response);
    }

    Ok(decoded)
}

async fn send_udp(
    server: SocketAddr,
    query_bytes: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, EngineError> {
    let bind_addr: SocketAddr = if server.is_ipv4() {
        "0.0.0.0:0".parse().unwrap()
    } else {
        "[::]:0".parse().unwrap()
    };

    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|e| EngineError::Io(format!("failed to bind UDP socket: {e}")))?;

    tokio::time::timeout(timeout, socket.send_to(query_bytes, server))
        .await
        .map_err(|_| EngineError::QueryTimeout)?
        .map_err(|e| EngineError::Io(format!("UDP send to {server} failed: {e}")))?;

    let mut buf = vec![0u8; MAX_UDP_RESPONSE];
    let (n, from) = tokio::time::timeout(timeout, socket.recv_from(&mut buf))
        .await
        .map_err(|_| EngineError::QueryTimeout)?
        .map_err(|e| EngineError::Io(format!("UDP recv from {server} failed: {e}")))?;

    if from.ip() != server.ip() {
        debug!(expected = %server, received_from = %from, "UDP response from unexpected source");
    }

    buf.truncate(n);
    Ok(buf)
}

async fn send_tcp(
    server: SocketAddr,
    query_bytes: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, EngineError> {
    let mut stream = tokio::time::timeout(timeout, TcpStream::connect(server))
        .await
        .map_err(|_| EngineError::QueryTimeout)?
        .map_err(|e| EngineError::Io(format!("TCP connect to {server} failed: {e}")))?;

    let len = query_bytes.len() as u16;
    let mut framed = Vec::with_capacity(query_bytes.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(query_bytes);

    tokio::time::timeout(timeout, stream.write_all(&framed))
        .await
        .map_err(|_| EngineError::QueryTimeout)?
        .map_err(|e| EngineError::Io(format!("TCP write to {server} failed: {e}")))?;

    let mut len_buf = [0u8; 2];
    tokio::time::timeout(timeout, stream.read_exact(&mut len_buf))
        .await
        .map_err(|_| EngineError::QueryTimeout)?
        .map_err(|e| EngineError::Io(format!("TCP read length from {server} failed: {e}")))?;

    let resp_len = u16::from_be_bytes(len_buf) as usize;
    let mut resp = vec![0u8; resp_len];
    tokio::time::timeout(timeout, stream.read_exact(&mut resp))
        .await
        .map_err(|_| EngineError::QueryTimeout)?
        .map_err(|e| EngineError::Io(format!("TCP read body from {server} failed: {e}")))?;

    Ok(resp)
}
