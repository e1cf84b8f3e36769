//! Functionality for dealing with fixed headers of MQTT packets.

use std::fmt;
use std::io::Read;
use std::slice::Iter;

use bytes::{BufMut, Bytes, BytesMut};

use crate::parse::*;
use crate::{Error, PacketType, QoS};

/// Fixed header of an MQTT Control Packet
///
/// See [specification](http://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718020).
///
/// ```text
///           7                          3                          0
///           +--------------------------+--------------------------+
/// byte 1    | MQTT Control Packet Type |   Flags for each type    |
///           +--------------------------+--------------------------+
/// bytes 2.. |            Remaining Length (1 to 4 bytes)          |
///           +-----------------------------------------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub struct FixedHeader {
    /// Contains the packet type and several flags
    pub control_field: u8,
    /// Remaining length of the packet.
    ///
    /// This does not include the fixed header bytes.
    /// It represents the variable header + payload.
    pub remaining_len: VarInt,
}

impl FixedHeader {
    pub fn new(byte1: u8, remaining_len: VarInt) -> FixedHeader {
        FixedHeader {
            control_field: byte1,
            remaining_len,
        }
    }

    /// Builds the header of an outgoing packet.
    ///
    /// # Errors
    /// Fails for the reserved packet types and for a remaining length
    /// that can't be encoded.
    pub fn for_packet(
        packet_type: PacketType,
        flags: u8,
        remaining_len: usize,
    ) -> Result<FixedHeader, Error> {
        if !packet_type.is_valid() {
            return Err(Error::InvalidPacketType {
                found: packet_type as u8,
                expected: None,
            });
        }

        let remaining_len = VarInt::new(remaining_len)?;
        let control_field = ((packet_type as u8) << 4) | (flags & 0x0F);
        Ok(FixedHeader::new(control_field, remaining_len))
    }

    /// Parse the [PacketType] from the control field
    pub fn packet_type(&self) -> Result<PacketType, Error> {
        PacketType::try_from(self.control_field >> 4)
    }

    /// Get the flag bits from the control field
    #[inline]
    pub fn flags(&self) -> u8 {
        self.control_field & 0x0F
    }

    /// Returns the size of the fixed header
    #[inline]
    pub fn size(&self) -> usize {
        1 + self.remaining_len.length()
    }

    /// Returns the size of full packet (fixed header + variable header + payload)
    ///
    /// Fixed header is enough to get the size of a frame in the stream
    #[inline]
    pub fn packet_size(&self) -> usize {
        self.size() + self.remaining_len.value()
    }

    /// Checks the packet type and flags of a control field.
    ///
    /// The type must not be reserved and, if `expected` is given, must match it.
    /// Flags must be the type's default, except for PUBLISH where they only need
    /// to carry a valid QoS.
    pub fn validate(control_field: u8, expected: Option<PacketType>) -> Result<PacketType, Error> {
        let found = control_field >> 4;
        let packet_type = PacketType::try_from(found)
            .map_err(|_| Error::InvalidPacketType { found, expected })?;

        if expected.is_some_and(|expected| expected != packet_type) {
            return Err(Error::InvalidPacketType { found, expected });
        }

        let flags = control_field & 0x0F;
        let valid = match packet_type {
            PacketType::Publish => QoS::try_from((flags & 0b0110) >> 1).is_ok(),
            _ => flags == packet_type.default_flags(),
        };

        if !valid {
            return Err(Error::InvalidFlags { packet_type, flags });
        }

        Ok(packet_type)
    }

    /// Checks if the stream has enough bytes to frame a packet and returns fixed header
    /// only if a packet can be framed with existing bytes in the `stream`.
    ///
    /// The passed stream doesn't modify parent stream's cursor.
    /// If this function returned an error, next `check` on the same parent stream
    /// is forced start with cursor at 0 again.
    pub fn check(stream: Iter<u8>, max_packet_size: u32) -> Result<Self, Error> {
        let stream_len = stream.len();
        let fixed_header = Self::parse_fixed_header(stream)?;
        Self::validate(fixed_header.control_field, None)?;

        // Don't let rogue connections attack with huge payloads.
        // Disconnect them before reading all that data
        if fixed_header.remaining_len > max_packet_size as usize {
            return Err(Error::PacketTooLarge {
                size: fixed_header.remaining_len.value(),
                max: max_packet_size,
            });
        }

        // If the current call fails due to insufficient bytes in the stream,
        // after calculating remaining length, we extend the stream
        let frame_length = fixed_header.packet_size();
        if stream_len < frame_length {
            return Err(Error::InsufficientData(frame_length - stream_len));
        }

        Ok(fixed_header)
    }

    /// Reads one packet from a reader: the fixed header, then exactly
    /// `remaining length` bytes of body.
    ///
    /// Type and flags are validated before the remaining length is read.
    pub fn read_from<R: Read>(
        src: &mut R,
        expected: Option<PacketType>,
    ) -> Result<(Self, Bytes), Error> {
        let mut byte1 = [0u8; 1];
        read_exact(src, &mut byte1)?;
        Self::validate(byte1[0], expected)?;

        let (remaining_len, _) = VarInt::read_from(src)?;
        let mut body = BytesMut::zeroed(remaining_len.value());
        read_exact(src, &mut body)?;

        Ok((Self::new(byte1[0], remaining_len), body.freeze()))
    }

    /// Writes the control field and the remaining length
    pub fn write(&self, buffer: &mut BytesMut) -> usize {
        buffer.put_u8(self.control_field);
        self.remaining_len.write(buffer);
        self.size()
    }

    /// Tries to read a [FixedHeader] from the bytestream
    fn parse_fixed_header(mut stream: Iter<u8>) -> Result<Self, Error> {
        let byte1 = stream.next().ok_or(Error::InsufficientData(2))?;
        let remaining_len = VarInt::read(stream)?;

        Ok(Self::new(*byte1, remaining_len))
    }
}

impl fmt::Display for FixedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let packet_type = PacketType::from_bits(self.control_field >> 4);
        fmt_header(f, packet_type, self.flags(), self.remaining_len.value())
    }
}

/// First line of every packet's `Display` output
pub(crate) fn fmt_header(
    f: &mut fmt::Formatter<'_>,
    packet_type: PacketType,
    flags: u8,
    remaining_len: usize,
) -> fmt::Result {
    write!(
        f,
        "Packet type: {}, Flags: {:04b}, Remaining Length: {} bytes",
        packet_type.name(),
        flags,
        remaining_len
    )
}
