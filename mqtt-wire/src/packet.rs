//! This module defines the MQTT 3.1.1 control packets.
//!
//! At the heart of this module is the [`Packet`] enum, which consolidates all
//! supported MQTT control packets into a single type. Each variant wraps a
//! struct defined in its own submodule and re-exported here.
//!
//! Every packet struct implements [`ControlPacket`], which ties its body
//! encoding to the shared [`FixedHeader`]:
//!
//! - decoding validates the fixed header, then hands the body decoder exactly
//!   `remaining length` bytes and fails if any of them is left unread;
//! - encoding validates the fields, computes the remaining length and writes
//!   header and body as one contiguous frame.

use std::io::Read;

use bytes::{Bytes, BytesMut};

use crate::{Error, FixedHeader};

mod connack;
mod connect;
mod disconnect;
mod ping;
mod puback;
mod pubcomp;
mod publish;
mod pubrec;
mod pubrel;
mod suback;
mod subscribe;
mod unsuback;
mod unsubscribe;

pub use connack::{ConnAck, ConnectReturnCode};
pub use connect::{Connect, LastWill, Login, Password};
pub use disconnect::Disconnect;
pub use ping::{PingReq, PingResp};
pub use puback::PubAck;
pub use pubcomp::PubComp;
pub use publish::Publish;
pub use pubrec::PubRec;
pub use pubrel::PubRel;
pub use suback::{SubAck, SubscribeReturnCode};
pub use subscribe::{Filter, Subscribe};
pub use unsuback::UnsubAck;
pub use unsubscribe::Unsubscribe;

/// MQTT Control Packet
///
/// This enumeration represents the different types of MQTT packets that can be sent or received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    Connect(Connect),
    ConnAck(ConnAck),
    Publish(Publish),
    PubAck(PubAck),
    PubRec(PubRec),
    PubRel(PubRel),
    PubComp(PubComp),
    Subscribe(Subscribe),
    SubAck(SubAck),
    Unsubscribe(Unsubscribe),
    UnsubAck(UnsubAck),
    PingReq(PingReq),
    PingResp(PingResp),
    Disconnect(Disconnect),
}

/// MQTT packet types
///
/// The two reserved values can appear on the wire but never denote a valid packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Forbidden, reserved
    Reserved = 0,
    /// Connection request
    Connect,
    /// Connect acknowledgment
    ConnAck,
    /// Publish message
    Publish,
    /// Publish acknowledgment (QoS 1)
    PubAck,
    /// Publish received (QoS 2 delivery part 1)
    PubRec,
    /// Publish release (QoS 2 delivery part 2)
    PubRel,
    /// Publish complete (QoS 2 delivery part 3)
    PubComp,
    /// Subscribe request
    Subscribe,
    /// Subscribe acknowledgment
    SubAck,
    /// Unsubscribe request
    Unsubscribe,
    /// Unsubscribe acknowledgment
    UnsubAck,
    /// PING request
    PingReq,
    /// PING response
    PingResp,
    /// Disconnect notification
    Disconnect,
    /// Forbidden, reserved
    Reserved2,
}

impl PacketType {
    /// Maps the low nibble of `bits` to a packet type, reserved values included
    pub const fn from_bits(bits: u8) -> PacketType {
        match bits & 0x0F {
            0 => PacketType::Reserved,
            1 => PacketType::Connect,
            2 => PacketType::ConnAck,
            3 => PacketType::Publish,
            4 => PacketType::PubAck,
            5 => PacketType::PubRec,
            6 => PacketType::PubRel,
            7 => PacketType::PubComp,
            8 => PacketType::Subscribe,
            9 => PacketType::SubAck,
            10 => PacketType::Unsubscribe,
            11 => PacketType::UnsubAck,
            12 => PacketType::PingReq,
            13 => PacketType::PingResp,
            14 => PacketType::Disconnect,
            _ => PacketType::Reserved2,
        }
    }

    pub const fn is_valid(&self) -> bool {
        !matches!(self, PacketType::Reserved | PacketType::Reserved2)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            PacketType::Reserved => "RESERVED",
            PacketType::Connect => "CONNECT",
            PacketType::ConnAck => "CONNACK",
            PacketType::Publish => "PUBLISH",
            PacketType::PubAck => "PUBACK",
            PacketType::PubRec => "PUBREC",
            PacketType::PubRel => "PUBREL",
            PacketType::PubComp => "PUBCOMP",
            PacketType::Subscribe => "SUBSCRIBE",
            PacketType::SubAck => "SUBACK",
            PacketType::Unsubscribe => "UNSUBSCRIBE",
            PacketType::UnsubAck => "UNSUBACK",
            PacketType::PingReq => "PINGREQ",
            PacketType::PingResp => "PINGRESP",
            PacketType::Disconnect => "DISCONNECT",
            PacketType::Reserved2 => "RESERVED2",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            PacketType::Reserved | PacketType::Reserved2 => "Reserved",
            PacketType::Connect => "Client request to connect to Server",
            PacketType::ConnAck => "Connect acknowledgement",
            PacketType::Publish => "Publish message",
            PacketType::PubAck => "Publish acknowledgement",
            PacketType::PubRec => "Publish received (assured delivery part 1)",
            PacketType::PubRel => "Publish release (assured delivery part 2)",
            PacketType::PubComp => "Publish complete (assured delivery part 3)",
            PacketType::Subscribe => "Client subscribe request",
            PacketType::SubAck => "Subscribe acknowledgement",
            PacketType::Unsubscribe => "Unsubscribe request",
            PacketType::UnsubAck => "Unsubscribe acknowledgement",
            PacketType::PingReq => "PING request",
            PacketType::PingResp => "PING response",
            PacketType::Disconnect => "Client is disconnecting",
        }
    }

    /// Flags every packet of this type carries in its fixed header.
    ///
    /// PUBLISH flags are not fixed; `0` is returned for them.
    pub const fn default_flags(&self) -> u8 {
        match self {
            PacketType::PubRel | PacketType::Subscribe | PacketType::Unsubscribe => 0b0010,
            _ => 0,
        }
    }
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let packet_type = PacketType::from_bits(value);
        if value > 0x0F || !packet_type.is_valid() {
            return Err(Error::InvalidPacketType {
                found: value,
                expected: None,
            });
        }

        Ok(packet_type)
    }
}

/// Encoding and decoding of a single kind of control packet against the
/// shared fixed header.
pub trait ControlPacket: Sized {
    /// Type written to, and expected in, the fixed header
    const PACKET_TYPE: PacketType;

    /// Flags written to the fixed header
    fn flags(&self) -> u8 {
        Self::PACKET_TYPE.default_flags()
    }

    /// Checks the fields before anything gets written
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Size of variable header + payload
    fn remaining_len(&self) -> usize;

    /// Decodes the body. `bytes` holds exactly `remaining length` bytes.
    fn read_body(fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error>;

    /// Encodes variable header and payload
    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error>;

    /// Decodes a packet from its fixed header and body.
    ///
    /// The body decoder must consume the body exactly: running short or leaving
    /// bytes behind are both reported as [Error::SizeMismatch].
    fn read(fixed_header: FixedHeader, mut bytes: Bytes) -> Result<Self, Error> {
        FixedHeader::validate(fixed_header.control_field, Some(Self::PACKET_TYPE))?;

        let declared = fixed_header.remaining_len.value();
        if bytes.len() != declared {
            return Err(Error::SizeMismatch {
                declared,
                actual: bytes.len(),
            });
        }

        let packet = Self::read_body(fixed_header, &mut bytes).map_err(|e| match e {
            Error::InsufficientData(missing) => Error::SizeMismatch {
                declared,
                actual: declared + missing,
            },
            e => e,
        })?;

        if !bytes.is_empty() {
            return Err(Error::SizeMismatch {
                declared,
                actual: declared - bytes.len(),
            });
        }

        Ok(packet)
    }

    /// Reads one packet of this type from `src`.
    ///
    /// Returns the packet and the number of bytes consumed.
    fn decode<R: Read>(src: &mut R) -> Result<(Self, usize), Error> {
        let (fixed_header, bytes) = FixedHeader::read_from(src, Some(Self::PACKET_TYPE))?;
        let packet = Self::read(fixed_header, bytes)?;
        Ok((packet, fixed_header.packet_size()))
    }

    /// Writes the whole packet and returns the number of bytes written.
    ///
    /// On error, `buffer` is left as it was.
    fn write(&self, buffer: &mut BytesMut) -> Result<usize, Error> {
        self.validate()?;
        let fixed_header =
            FixedHeader::for_packet(Self::PACKET_TYPE, self.flags(), self.remaining_len())?;

        let start = buffer.len();
        fixed_header.write(buffer);
        if let Err(e) = self.write_body(buffer) {
            buffer.truncate(start);
            return Err(e);
        }

        debug_assert_eq!(buffer.len() - start, fixed_header.packet_size());
        Ok(fixed_header.packet_size())
    }

    /// Encodes the packet into a fresh buffer
    fn encode(&self) -> Result<Bytes, Error> {
        let mut buffer = BytesMut::new();
        self.write(&mut buffer)?;
        Ok(buffer.freeze())
    }
}

impl Packet {
    /// Creates an empty packet of the given type
    pub fn new(packet_type: PacketType) -> Result<Packet, Error> {
        let packet = match packet_type {
            PacketType::Connect => Packet::Connect(Connect::default()),
            PacketType::ConnAck => Packet::ConnAck(ConnAck::default()),
            PacketType::Publish => Packet::Publish(Publish::default()),
            PacketType::PubAck => Packet::PubAck(PubAck::default()),
            PacketType::PubRec => Packet::PubRec(PubRec::default()),
            PacketType::PubRel => Packet::PubRel(PubRel::default()),
            PacketType::PubComp => Packet::PubComp(PubComp::default()),
            PacketType::Subscribe => Packet::Subscribe(Subscribe::default()),
            PacketType::SubAck => Packet::SubAck(SubAck::default()),
            PacketType::Unsubscribe => Packet::Unsubscribe(Unsubscribe::default()),
            PacketType::UnsubAck => Packet::UnsubAck(UnsubAck::default()),
            PacketType::PingReq => Packet::PingReq(PingReq),
            PacketType::PingResp => Packet::PingResp(PingResp),
            PacketType::Disconnect => Packet::Disconnect(Disconnect),
            p @ (PacketType::Reserved | PacketType::Reserved2) => {
                return Err(Error::InvalidPacketType {
                    found: p as u8,
                    expected: None,
                })
            }
        };

        Ok(packet)
    }

    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(_) => PacketType::Connect,
            Packet::ConnAck(_) => PacketType::ConnAck,
            Packet::Publish(_) => PacketType::Publish,
            Packet::PubAck(_) => PacketType::PubAck,
            Packet::PubRec(_) => PacketType::PubRec,
            Packet::PubRel(_) => PacketType::PubRel,
            Packet::PubComp(_) => PacketType::PubComp,
            Packet::Subscribe(_) => PacketType::Subscribe,
            Packet::SubAck(_) => PacketType::SubAck,
            Packet::Unsubscribe(_) => PacketType::Unsubscribe,
            Packet::UnsubAck(_) => PacketType::UnsubAck,
            Packet::PingReq(_) => PacketType::PingReq,
            Packet::PingResp(_) => PacketType::PingResp,
            Packet::Disconnect(_) => PacketType::Disconnect,
        }
    }

    /// Reads a packet from the front of `stream`.
    ///
    /// Returns [Error::InsufficientData] without touching `stream` if it doesn't
    /// hold a complete frame yet.
    pub fn read(stream: &mut BytesMut, max_size: u32) -> Result<Packet, Error> {
        let fixed_header = FixedHeader::check(stream.iter(), max_size)?;

        let mut packet = stream.split_to(fixed_header.packet_size());
        // skip the fixed header, we have already parsed it
        let _ = packet.split_to(fixed_header.size());

        Self::assemble(fixed_header, packet.freeze())
    }

    /// Reads one packet from `src`, dispatching on the packet type in its first byte.
    ///
    /// With `expected` set, any other packet type is rejected before the rest
    /// of the packet is read. Returns the packet and the number of bytes consumed.
    pub fn decode<R: Read>(
        src: &mut R,
        expected: Option<PacketType>,
    ) -> Result<(Packet, usize), Error> {
        let (fixed_header, bytes) = FixedHeader::read_from(src, expected)?;
        let packet = Self::assemble(fixed_header, bytes)?;
        Ok((packet, fixed_header.packet_size()))
    }

    fn assemble(fixed_header: FixedHeader, packet: Bytes) -> Result<Packet, Error> {
        let packet = match fixed_header.packet_type()? {
            PacketType::Connect => Packet::Connect(Connect::read(fixed_header, packet)?),
            PacketType::ConnAck => Packet::ConnAck(ConnAck::read(fixed_header, packet)?),
            PacketType::Publish => Packet::Publish(Publish::read(fixed_header, packet)?),
            PacketType::PubAck => Packet::PubAck(PubAck::read(fixed_header, packet)?),
            PacketType::PubRec => Packet::PubRec(PubRec::read(fixed_header, packet)?),
            PacketType::PubRel => Packet::PubRel(PubRel::read(fixed_header, packet)?),
            PacketType::PubComp => Packet::PubComp(PubComp::read(fixed_header, packet)?),
            PacketType::Subscribe => Packet::Subscribe(Subscribe::read(fixed_header, packet)?),
            PacketType::SubAck => Packet::SubAck(SubAck::read(fixed_header, packet)?),
            PacketType::Unsubscribe => {
                Packet::Unsubscribe(Unsubscribe::read(fixed_header, packet)?)
            }
            PacketType::UnsubAck => Packet::UnsubAck(UnsubAck::read(fixed_header, packet)?),
            PacketType::PingReq => Packet::PingReq(PingReq::read(fixed_header, packet)?),
            PacketType::PingResp => Packet::PingResp(PingResp::read(fixed_header, packet)?),
            PacketType::Disconnect => {
                Packet::Disconnect(Disconnect::read(fixed_header, packet)?)
            }
            p => {
                return Err(Error::InvalidPacketType {
                    found: p as u8,
                    expected: None,
                })
            }
        };

        Ok(packet)
    }

    /// Writes the packet to `buffer` and returns the number of bytes written
    pub fn write(&self, buffer: &mut BytesMut) -> Result<usize, Error> {
        match self {
            Packet::Connect(c) => c.write(buffer),
            Packet::ConnAck(c) => c.write(buffer),
            Packet::Publish(p) => p.write(buffer),
            Packet::PubAck(p) => p.write(buffer),
            Packet::PubRec(p) => p.write(buffer),
            Packet::PubRel(p) => p.write(buffer),
            Packet::PubComp(p) => p.write(buffer),
            Packet::Subscribe(s) => s.write(buffer),
            Packet::SubAck(s) => s.write(buffer),
            Packet::Unsubscribe(u) => u.write(buffer),
            Packet::UnsubAck(u) => u.write(buffer),
            Packet::PingReq(p) => p.write(buffer),
            Packet::PingResp(p) => p.write(buffer),
            Packet::Disconnect(d) => d.write(buffer),
        }
    }

    /// Encodes the packet into a fresh buffer
    pub fn encode(&self) -> Result<Bytes, Error> {
        let mut buffer = BytesMut::new();
        self.write(&mut buffer)?;
        Ok(buffer.freeze())
    }

    /// Size of the encoded packet, fixed header included
    pub fn size(&self) -> Result<usize, Error> {
        let len = match self {
            Packet::Connect(c) => c.remaining_len(),
            Packet::ConnAck(c) => c.remaining_len(),
            Packet::Publish(p) => p.remaining_len(),
            Packet::PubAck(p) => p.remaining_len(),
            Packet::PubRec(p) => p.remaining_len(),
            Packet::PubRel(p) => p.remaining_len(),
            Packet::PubComp(p) => p.remaining_len(),
            Packet::Subscribe(s) => s.remaining_len(),
            Packet::SubAck(s) => s.remaining_len(),
            Packet::Unsubscribe(u) => u.remaining_len(),
            Packet::UnsubAck(u) => u.remaining_len(),
            Packet::PingReq(p) => p.remaining_len(),
            Packet::PingResp(p) => p.remaining_len(),
            Packet::Disconnect(d) => d.remaining_len(),
        };

        let len = crate::VarInt::new(len)?;
        // control field + remaining length + variable header & payload
        Ok(1 + len.length() + len.value())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{QoS, Violation};

    #[test]
    fn packet_type_registry() {
        assert_eq!(PacketType::try_from(1).unwrap(), PacketType::Connect);
        assert_eq!(PacketType::try_from(14).unwrap(), PacketType::Disconnect);
        for invalid in [0, 15, 16, 0xFF] {
            assert!(matches!(
                PacketType::try_from(invalid),
                Err(Error::InvalidPacketType { .. })
            ));
        }

        assert_eq!(PacketType::Subscribe.name(), "SUBSCRIBE");
        assert_eq!(
            PacketType::PubRec.description(),
            "Publish received (assured delivery part 1)"
        );
        assert_eq!(PacketType::Reserved2.name(), "RESERVED2");
        assert_eq!(PacketType::Unsubscribe.default_flags(), 2);
        assert_eq!(PacketType::UnsubAck.default_flags(), 0);
    }

    #[test]
    fn new_packet_for_every_valid_type() {
        for bits in 1..=14 {
            let packet_type = PacketType::from_bits(bits);
            let packet = Packet::new(packet_type).unwrap();
            assert_eq!(packet.packet_type(), packet_type);
        }

        assert!(Packet::new(PacketType::Reserved).is_err());
        assert!(Packet::new(PacketType::Reserved2).is_err());
    }

    #[test]
    fn decode_dispatches_on_packet_type() {
        let stream = vec![
            0xD0, 0x00, // pingresp
            0x90, 0x03, 0x00, 0x01, 0x02, // suback
            0xE0, 0x00, // disconnect
        ];
        let mut src = Cursor::new(stream);

        let (packet, n) = Packet::decode(&mut src, None).unwrap();
        assert_eq!(packet, Packet::PingResp(PingResp));
        assert_eq!(n, 2);

        let (packet, n) = Packet::decode(&mut src, Some(PacketType::SubAck)).unwrap();
        assert_eq!(
            packet,
            Packet::SubAck(SubAck::new(
                1,
                vec![SubscribeReturnCode::Success(QoS::ExactlyOnce)]
            ))
        );
        assert_eq!(n, 5);

        assert!(matches!(
            Packet::decode(&mut src, Some(PacketType::PingReq)),
            Err(Error::InvalidPacketType {
                found: 14,
                expected: Some(PacketType::PingReq)
            })
        ));

        // only the control field of the rejected packet was consumed
        assert_eq!(src.position(), 8);
    }

    #[test]
    fn decode_from_exhausted_source() {
        let mut src = Cursor::new(Vec::new());
        assert!(matches!(
            Packet::decode(&mut src, None),
            Err(Error::InsufficientData(1))
        ));
    }

    #[test]
    fn read_waits_for_complete_frame() {
        let mut stream = BytesMut::from(&[0x40, 0x02, 0x00][..]);
        assert!(matches!(
            Packet::read(&mut stream, 128),
            Err(Error::InsufficientData(1))
        ));
        assert_eq!(stream.len(), 3);

        stream.extend_from_slice(&[0x0A, 0xC0, 0x00]);
        let packet = Packet::read(&mut stream, 128).unwrap();
        assert_eq!(packet, Packet::PubAck(PubAck::new(10)));

        let packet = Packet::read(&mut stream, 128).unwrap();
        assert_eq!(packet, Packet::PingReq(PingReq));
        assert!(stream.is_empty());
    }

    #[test]
    fn trailing_bytes_are_a_size_mismatch() {
        // PUBACK with 3 bytes of body
        let mut src = Cursor::new(vec![0x40, 0x03, 0x00, 0x0A, 0xFF]);
        assert!(matches!(
            Packet::decode(&mut src, None),
            Err(Error::SizeMismatch {
                declared: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn truncated_body_is_a_size_mismatch() {
        // CONNACK with a single byte of body
        let mut src = Cursor::new(vec![0x20, 0x01, 0x00]);
        assert!(matches!(
            Packet::decode(&mut src, None),
            Err(Error::SizeMismatch {
                declared: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn failed_write_leaves_buffer_untouched() {
        let mut buffer = BytesMut::from(&[0xC0, 0x00][..]);
        let publish = Packet::Publish(Publish::default());
        assert!(matches!(
            publish.write(&mut buffer),
            Err(Error::ProtocolViolation(Violation::InvalidTopic(_)))
        ));
        assert_eq!(buffer, vec![0xC0, 0x00]);
    }

    #[test]
    fn captured_stream_round_trips() {
        #[rustfmt::skip]
        let stream: Vec<u8> = vec![
            0x10, 0x11, 0x00, 0x04, b'M', b'Q', b'T', b'T', 0x04, 0x02, 0x00, 0x0A, 0x00, 0x03, b'a', b'b', b'c',
            0x20, 0x02, 0x01, 0x00,
            0x82, 0x08, 0x00, 0x01, 0x00, 0x03, b'a', b'/', b'b', 0x01,
            0x90, 0x03, 0x00, 0x01, 0x01,
            0x34, 0x09, 0x00, 0x03, b'a', b'/', b'b', 0x00, 0x02, 0xCA, 0xFE,
            0x50, 0x02, 0x00, 0x02,
            0x62, 0x02, 0x00, 0x02,
            0x70, 0x02, 0x00, 0x02,
            0xA2, 0x07, 0x00, 0x03, 0x00, 0x03, b'a', b'/', b'b',
            0xB0, 0x02, 0x00, 0x03,
            0xC0, 0x00,
            0xD0, 0x00,
            0xE0, 0x00,
        ];

        let mut src = Cursor::new(stream.clone());
        let mut out = BytesMut::new();
        let mut consumed = 0;
        while (src.position() as usize) < stream.len() {
            let (packet, n) = Packet::decode(&mut src, None).unwrap();
            assert_eq!(packet.write(&mut out).unwrap(), n);
            assert_eq!(packet.size().unwrap(), n);
            consumed += n;
        }

        assert_eq!(consumed, stream.len());
        assert_eq!(out, stream);
    }
}
