//! Implementation of the Java Minecraft ping protocol.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use std::{
    io,
    net::SocketAddr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::{debug, instrument, trace};

use crate::{
    packet::{self, Packet},
    tokio::AsyncPingable,
    Error, Java, Response, PROTOCOL_VERSION,
};

/// `next_state` value of a handshake that asks for the status state.
const NEXT_STATE_STATUS: u32 = 1;

impl AsyncPingable for Java {
    type Response = Response;

    #[instrument(skip(self), fields(address = %self.server_address, port = self.port))]
    async fn ping(self) -> Result<Self::Response, Error> {
        let mut conn = Connection::new(&self.server_address, self.port, self.timeout).await?;

        // The whole exchange gets its own budget once connected, so a peer that
        // accepts and then goes silent can't hang the caller.
        let payload = timeout(self.timeout, async {
            // Handshake
            conn.send_packet(Packet::Handshake {
                version: PROTOCOL_VERSION,
                host: conn.host.clone(),
                port: conn.port,
                next_state: NEXT_STATE_STATUS,
            })
            .await?;

            // Request
            conn.send_packet(Packet::Request {}).await?;

            // Some servers stall until they see a ping after the request. The
            // pong is never waited on.
            conn.send_packet(Packet::Ping {
                payload: unix_millis(),
            })
            .await?;

            conn.read_response().await
        })
        .await
        .map_err(|_| Error::Timeout)??;

        Response::from_payload(&payload)
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

struct Connection {
    stream: TcpStream,
    host: String,
    port: u16,
}

impl Connection {
    async fn new(host: &str, port: u16, budget: Duration) -> Result<Self, Error> {
        let connect = async {
            let ip = super::lookup(host).await?;
            let socket_addr = SocketAddr::new(ip, port);
            debug!(%socket_addr, "connecting");
            TcpStream::connect(socket_addr)
                .await
                .map_err(Error::ConnectionFailed)
        };

        let stream = timeout(budget, connect)
            .await
            .map_err(|_| Error::Timeout)??;

        Ok(Self {
            stream,
            host: host.to_string(),
            port,
        })
    }

    async fn send_packet(&mut self, p: Packet) -> Result<(), Error> {
        let buf = p.encode()?;
        trace!(packet = ?p, len = buf.len(), "sending packet");
        self.stream
            .write_all(&buf)
            .await
            .map_err(Error::ConnectionFailed)
    }

    /// Reads until the first frame is complete or the server hangs up, and
    /// returns the payload of the status response. At most one read past
    /// [`packet::MAX_PACKET_LEN`] is ever buffered.
    async fn read_response(&mut self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match self.stream.read(&mut chunk).await {
                Ok(n) => n,
                // A reset after the server already sent everything is still a
                // finished response.
                Err(e) if e.kind() == io::ErrorKind::ConnectionReset && !buf.is_empty() => 0,
                Err(e) => return Err(Error::ConnectionFailed(e)),
            };
            if n == 0 {
                trace!(len = buf.len(), "server closed the connection");
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            // The length prefix is checked as soon as it is complete, so an
            // oversized frame is rejected before its body is buffered.
            if let Some(total) = packet::frame_len(&buf)? {
                if buf.len() >= total {
                    break;
                }
            }
        }

        if buf.is_empty() {
            return Err(Error::EmptyResponse);
        }

        let (id, payload) = packet::deframe(&buf)?;
        debug!(id, len = payload.len(), "received status response");
        if id != u32::from(packet::STATUS_ID) {
            return Err(Error::UnexpectedPacket(id));
        }
        Ok(payload.to_vec())
    }
}
