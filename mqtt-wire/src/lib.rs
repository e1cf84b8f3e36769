//! MQTT protocol serialization and deserialization
//!
//! This crate implements the assembling and disassembling of MQTT control packets
//! for version 3 of the protocol (MQTT 3.1) and version 4 (MQTT 3.1.1).
//!
//! It is a pure transformation layer: a transport hands it bytes and gets
//! [`Packet`]s back, or hands it packets and gets bytes back. Packets can be
//! read from a [`bytes::BytesMut`] buffer (see [`Packet::read`] and [`Codec`])
//! or from any blocking [`std::io::Read`] (see [`Packet::decode`]).

mod codec;
mod copy;
mod error;
mod header;
mod packet;
mod parse;

pub use codec::Codec;
pub use copy::copy_packet;
pub use error::{Error, Violation};
pub use header::FixedHeader;
pub use packet::*;
pub use parse::{VarInt, MAX_REMAINING_LENGTH, MAX_STRING_LENGTH};

/// The supported MQTT protocol versions, keyed by their protocol level byte.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// MQTT 3.1
    V3 = 0x03,
    /// MQTT 3.1.1
    #[default]
    V4 = 0x04,
}

impl ProtocolVersion {
    /// The protocol name a CONNECT packet of this version must carry
    pub const fn name(&self) -> &'static str {
        match self {
            ProtocolVersion::V3 => "MQIsdp",
            ProtocolVersion::V4 => "MQTT",
        }
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x03 => Ok(ProtocolVersion::V3),
            0x04 => Ok(ProtocolVersion::V4),
            _ => Err(Violation::UnacceptableProtocolVersion.into()),
        }
    }
}

/// Quality of Service levels for packet delivery.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd)]
#[allow(clippy::enum_variant_names)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            qos => Err(Violation::InvalidQoS(qos).into()),
        }
    }
}

/// Checks that a topic name can be published to: not empty and free of
/// the wildcard characters `#` and `*`.
pub fn valid_topic(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(['#', '*'])
}

/// Checks that a client identifier only contains `[0-9A-Za-z]`.
///
/// Identifiers longer than the 23 bytes servers are required to accept are allowed.
pub fn valid_client_id(client_id: &str) -> bool {
    client_id.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_validation() {
        assert!(!valid_topic(""));
        assert!(!valid_topic("a/#"));
        assert!(!valid_topic("a/*/c"));
        assert!(valid_topic("a/b"));
        assert!(valid_topic("a/+/c"));
    }

    #[test]
    fn client_id_validation() {
        assert!(valid_client_id(""));
        assert!(valid_client_id("abc123XYZ"));
        assert!(valid_client_id("averyveryveryverylongclientidentifier"));
        assert!(!valid_client_id("abc-123"));
        assert!(!valid_client_id("abc def"));
        assert!(!valid_client_id("élan"));
    }

    #[test]
    fn qos_conversion() {
        assert_eq!(QoS::try_from(2).unwrap(), QoS::ExactlyOnce);
        assert!(matches!(
            QoS::try_from(3),
            Err(Error::ProtocolViolation(Violation::InvalidQoS(3)))
        ));
    }

    #[test]
    fn protocol_versions() {
        assert_eq!(ProtocolVersion::try_from(3).unwrap().name(), "MQIsdp");
        assert_eq!(ProtocolVersion::try_from(4).unwrap().name(), "MQTT");
        assert!(matches!(
            ProtocolVersion::try_from(5),
            Err(Error::ProtocolViolation(
                Violation::UnacceptableProtocolVersion
            ))
        ));
    }
}
