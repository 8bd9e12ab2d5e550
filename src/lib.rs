#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `slping` is a client for the Minecraft Java Edition Server List Ping
//! protocol. It can be used to query a server for its version, player counts,
//! a sample of online players, the MOTD, its icon and Forge mod metadata
//! without joining the game.
//!
//! Pings run on the tokio runtime. Each call owns a single TCP connection and
//! is bounded by a timeout, so callers are free to ping many servers
//! concurrently.
//!
//! The main API surface is [`ping`] and, for more control, [`tokio::get_status`].

pub mod packet;
pub mod tokio;
pub mod varint;

mod java;

pub use java::{
    Chat, Java, ModInfo, Player, Response, DEFAULT_PORT, DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};

/// Errors that can occur when pinging a server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not connect to the server: {0}")]
    ConnectionFailed(#[source] std::io::Error),
    #[error("the server did not answer in time")]
    Timeout,
    #[error("VarInt ended before its last byte")]
    TruncatedVarInt,
    #[error("VarInt is longer than 5 bytes")]
    VarIntTooLong,
    #[error("value does not fit in a VarInt")]
    VarIntOverflow(#[from] std::num::TryFromIntError),
    #[error("packet declares {declared} bytes but only {available} arrived")]
    IncompletePacket { declared: usize, available: usize },
    #[error("packet declares {declared} bytes, more than the protocol allows")]
    PacketTooLarge { declared: usize },
    #[error("packet declares zero bytes and carries no id")]
    EmptyPacket,
    #[error("could not encode packet: {0}")]
    Encode(#[from] std::io::Error),
    #[error("the server closed the connection without answering")]
    EmptyResponse,
    #[error("expected a status response, got packet id {0:#04x}")]
    UnexpectedPacket(u32),
    #[error("status JSON declares {declared} bytes but the packet holds {actual}")]
    InvalidJsonLength { declared: usize, actual: usize },
    #[error("status JSON is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("a JSON error occurred: {0}")]
    Json(#[from] serde_json::Error),
    #[error("status JSON field `{0}` is missing or malformed")]
    MalformedPayload(String),
}

impl Error {
    /// Whether the server could not be reached at all, as opposed to having
    /// answered with something that isn't a valid status response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout)
    }
}

/// Pings the Java server at `address:port` with the default timeout.
///
/// # Examples
///
/// ```no_run
/// # async {
/// let response = slping::ping("mc.hypixel.net", 25565).await?;
/// println!("{}/{} players", response.online_players, response.max_players);
/// # Ok::<(), slping::Error>(())
/// # };
/// ```
///
/// # Errors
/// If the server status cannot be recieved
pub async fn ping(address: &str, port: u16) -> Result<Response, Error> {
    crate::tokio::get_status(Java {
        server_address: address.to_string(),
        port,
        ..Default::default()
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors() {
        assert!(Error::Timeout.is_transport());
        assert!(Error::ConnectionFailed(std::io::ErrorKind::ConnectionRefused.into()).is_transport());
        assert!(!Error::EmptyResponse.is_transport());
        assert!(!Error::EmptyPacket.is_transport());
        assert!(!Error::PacketTooLarge { declared: usize::MAX }.is_transport());
        assert!(!Error::MalformedPayload("version".to_string()).is_transport());
    }
}
