//! Packet framing for the Server List Ping exchange.
//!
//! Every packet on the wire is `VarInt length | VarInt packet id | payload`,
//! where `length` covers the id and the payload together.

use std::io::{self, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::{varint, Error};

/// Packet id of the handshake, status request and status response packets.
pub const STATUS_ID: u8 = 0x00;
/// Packet id of the ping and pong packets.
pub const PING_ID: u8 = 0x01;

/// Largest length a packet may declare (the largest 3-byte VarInt).
pub const MAX_PACKET_LEN: usize = 2_097_151;

/// Wraps `payload` in a length-prefixed, id-tagged frame.
///
/// # Examples
///
/// ```
/// assert_eq!(slping::packet::frame(0x00, b"")?, [0x01, 0x00]);
/// # Ok::<(), slping::Error>(())
/// ```
///
/// # Errors
///
/// [`Error::VarIntOverflow`] if the framed length does not fit in a VarInt.
pub fn frame(packet_id: u8, payload: &[u8]) -> Result<Vec<u8>, Error> {
    let id = varint::encode(u32::from(packet_id));
    let length = u32::try_from(id.len() + payload.len())?;

    let mut buf = Vec::with_capacity(varint::MAX_LEN + id.len() + payload.len());
    varint::encode_into(length, &mut buf);
    buf.extend_from_slice(&id);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Total size of the first frame in `bytes`, length prefix included, or
/// `None` while the length prefix itself is still incomplete.
///
/// # Errors
///
/// [`Error::VarIntTooLong`] for a malformed length prefix and
/// [`Error::PacketTooLarge`] if it declares more than [`MAX_PACKET_LEN`].
pub fn frame_len(bytes: &[u8]) -> Result<Option<usize>, Error> {
    match varint::decode(bytes) {
        Ok((length, prefix)) => {
            let length = length as usize;
            if length > MAX_PACKET_LEN {
                return Err(Error::PacketTooLarge { declared: length });
            }
            Ok(Some(prefix + length))
        }
        Err(Error::TruncatedVarInt) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Splits the first frame in `bytes` into its packet id and payload.
///
/// Bytes after the end of the first frame are ignored.
///
/// # Errors
///
/// [`Error::IncompletePacket`] if fewer bytes follow the length prefix than it
/// declares, [`Error::PacketTooLarge`] if it declares more than
/// [`MAX_PACKET_LEN`], [`Error::EmptyPacket`] if it declares zero bytes, or
/// the VarInt errors of [`varint::decode`] for a malformed length or packet id.
pub fn deframe(bytes: &[u8]) -> Result<(u32, &[u8]), Error> {
    let (length, prefix) = varint::decode(bytes)?;
    let rest = &bytes[prefix..];
    let length = length as usize;
    if length > MAX_PACKET_LEN {
        return Err(Error::PacketTooLarge { declared: length });
    }
    if length == 0 {
        return Err(Error::EmptyPacket);
    }
    if rest.len() < length {
        return Err(Error::IncompletePacket {
            declared: length,
            available: rest.len(),
        });
    }

    let body = &rest[..length];
    let (id, id_width) = varint::decode(body)?;
    Ok((id, &body[id_width..]))
}

/// Writes Minecraft data types into a packet payload.
pub(crate) trait WriteJavaExt: Write + WriteBytesExt {
    fn write_varint(&mut self, value: u32) -> io::Result<()> {
        self.write_all(&varint::encode(value))
    }

    fn write_string(&mut self, s: &str) -> io::Result<()> {
        let len = u32::try_from(s.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.write_varint(len)?;
        self.write_all(s.as_bytes())
    }
}

impl<T> WriteJavaExt for T where T: Write + WriteBytesExt {}

/// Reads Minecraft data types off the front of a byte slice, advancing it.
pub(crate) trait ReadJavaExt {
    fn read_varint(&mut self) -> Result<u32, Error>;
}

impl ReadJavaExt for &[u8] {
    fn read_varint(&mut self) -> Result<u32, Error> {
        let bytes = *self;
        let (value, width) = varint::decode(bytes)?;
        *self = &bytes[width..];
        Ok(value)
    }
}

/// Client-bound and server-bound packets of the status state.
#[derive(Debug)]
pub(crate) enum Packet {
    Handshake {
        version: u32,
        host: String,
        port: u16,
        next_state: u32,
    },
    Request {},
    Ping {
        payload: i64,
    },
}

impl Packet {
    pub(crate) const fn id(&self) -> u8 {
        match self {
            Self::Handshake { .. } | Self::Request {} => STATUS_ID,
            Self::Ping { .. } => PING_ID,
        }
    }

    /// Serializes the packet, frame included.
    pub(crate) fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        match self {
            Self::Handshake {
                version,
                host,
                port,
                next_state,
            } => {
                buf.write_varint(*version)?;
                buf.write_string(host)?;
                buf.write_u16::<BigEndian>(*port)?;
                buf.write_varint(*next_state)?;
            }
            Self::Request {} => {}
            Self::Ping { payload } => buf.write_i64::<BigEndian>(*payload)?,
        }
        frame(self.id(), &buf)
    }
}
