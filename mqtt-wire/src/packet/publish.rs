use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::header::fmt_header;
use crate::parse::*;
use crate::{valid_topic, Error, FixedHeader, QoS, Violation};

/// Publish message
///
/// Sent from a client to a server or from a server to a client to transport an application message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Publish {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
    topic: String,
    /// Only sent for QoS 1 and 2
    pub pkid: u16,
    pub payload: Bytes,
}

const DUP: u8 = 0b1000;
const QOS: u8 = 0b0110;
const RETAIN: u8 = 0b0001;

impl Publish {
    /// Creates a message for `topic`
    ///
    /// # Errors
    /// The topic must be a valid topic name, see [crate::valid_topic]
    pub fn new<T: Into<String>, P: Into<Bytes>>(
        topic: T,
        qos: QoS,
        payload: P,
    ) -> Result<Self, Error> {
        let mut publish = Publish {
            qos,
            payload: payload.into(),
            ..Default::default()
        };
        publish.set_topic(topic)?;
        Ok(publish)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn set_topic(&mut self, topic: impl Into<String>) -> Result<(), Error> {
        let topic = topic.into();
        if !valid_topic(&topic) {
            return Err(Violation::InvalidTopic(topic).into());
        }

        self.topic = topic;
        Ok(())
    }
}

impl ControlPacket for Publish {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    fn flags(&self) -> u8 {
        let dup = self.dup as u8;
        let qos = self.qos as u8;
        let retain = self.retain as u8;
        (dup << 3) | (qos << 1) | retain
    }

    fn validate(&self) -> Result<(), Error> {
        if !valid_topic(&self.topic) {
            return Err(Violation::InvalidTopic(self.topic.clone()).into());
        }

        if self.payload.is_empty() {
            return Err(Violation::EmptyPayload.into());
        }

        Ok(())
    }

    fn remaining_len(&self) -> usize {
        let mut len = 2 + self.topic.len();
        if self.qos != QoS::AtMostOnce {
            // packet identifier is only present for QoS > 0
            len += 2;
        }

        len + self.payload.len()
    }

    fn read_body(fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let flags = fixed_header.flags();
        let dup = (flags & DUP) != 0;
        let qos = QoS::try_from((flags & QOS) >> 1)?;
        let retain = (flags & RETAIN) != 0;

        let topic = read_mqtt_string(bytes)?;
        if !valid_topic(&topic) {
            return Err(Violation::InvalidTopic(topic).into());
        }

        // Packet identifier exists where QoS > 0
        let pkid = match qos {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce | QoS::ExactlyOnce => read_u16(bytes)?,
        };

        // the payload is whatever is left of the body, possibly nothing
        let payload = bytes.split_off(0);

        Ok(Publish {
            dup,
            qos,
            retain,
            topic,
            pkid,
            payload,
        })
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        write_mqtt_string(buffer, &self.topic)?;

        if self.qos != QoS::AtMostOnce {
            buffer.put_u16(self.pkid);
        }

        buffer.extend_from_slice(&self.payload);
        Ok(())
    }
}

impl fmt::Display for Publish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_header(f, Self::PACKET_TYPE, self.flags(), self.remaining_len())?;
        write!(
            f,
            "\nTopic: {}\nPacket ID: {}\nPayload: {}",
            self.topic,
            self.pkid,
            String::from_utf8_lossy(&self.payload)
        )
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Packet;

    #[test]
    fn qos1_publish_parsing_works() {
        let stream = &[
            0b0011_0010,
            11, // packet type, flags and remaining len
            0x00,
            0x03,
            b'a',
            b'/',
            b'b', // variable header. topic name = 'a/b'
            0x00,
            0x0a, // variable header. pkid = 10
            0xF1,
            0xF2,
            0xF3,
            0xF4, // publish payload
            0xDE,
            0xAD,
            0xBE,
            0xEF, // extra packets in the stream
        ];

        let mut stream = BytesMut::from(&stream[..]);
        let packet = Packet::read(&mut stream, 128).unwrap();

        let payload = Bytes::from_static(&[0xF1, 0xF2, 0xF3, 0xF4]);
        let mut expected = Publish::new("a/b", QoS::AtLeastOnce, payload).unwrap();
        expected.pkid = 10;
        assert_eq!(packet, Packet::Publish(expected));
        assert_eq!(&stream[..], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn qos0_publish_parsing_works() {
        let stream = vec![
            0b0011_0001,
            7, // packet type, flags and remaining len
            0x00,
            0x03,
            b'a',
            b'/',
            b'b', // variable header. topic name = 'a/b'
            0x01,
            0x02, // payload
            0xDE,
            0xAD,
            0xBE,
            0xEF, // extra packets in the stream
        ];

        let (publish, n) = Publish::decode(&mut Cursor::new(stream)).unwrap();
        assert_eq!(n, 9);
        assert_eq!(publish.topic(), "a/b");
        assert_eq!(publish.qos, QoS::AtMostOnce);
        assert!(publish.retain);
        assert!(!publish.dup);
        assert_eq!(publish.pkid, 0);
        assert_eq!(&publish.payload[..], &[0x01, 0x02]);
    }

    #[test]
    fn qos1_publish_encoding_works() {
        let payload = vec![0xF1u8, 0xF2, 0xF3, 0xF4];
        let mut publish = Publish::new("a/b", QoS::AtLeastOnce, payload).unwrap();
        publish.pkid = 10;

        let mut buf = BytesMut::new();
        assert_eq!(publish.write(&mut buf).unwrap(), 13);

        assert_eq!(
            buf,
            vec![
                0b0011_0010,
                11,
                0x00,
                0x03,
                b'a',
                b'/',
                b'b',
                0x00,
                0x0a,
                0xF1,
                0xF2,
                0xF3,
                0xF4
            ]
        );
    }

    #[test]
    fn qos0_publish_encoding_works() {
        let payload = vec![0xE1u8, 0xE2, 0xE3, 0xE4];
        let mut publish = Publish::new("a/b", QoS::AtMostOnce, payload).unwrap();
        // ignored for QoS 0
        publish.pkid = 7;
        publish.dup = true;

        let mut buf = BytesMut::new();
        publish.write(&mut buf).unwrap();

        assert_eq!(
            buf,
            vec![
                0b0011_1000,
                9,
                0x00,
                0x03,
                b'a',
                b'/',
                b'b',
                0xE1,
                0xE2,
                0xE3,
                0xE4
            ]
        );
    }

    #[test]
    fn qos2_publish_round_trips() {
        let mut publish = Publish::new("a/+/c", QoS::ExactlyOnce, "hello").unwrap();
        publish.pkid = 0xBEEF;
        publish.retain = true;

        let bytes = publish.encode().unwrap();
        assert_eq!(bytes[0], 0b0011_0101);
        let (decoded, n) = Publish::decode(&mut Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(n, bytes.len());
        assert_eq!(decoded, publish);
    }

    #[test]
    fn publish_display() {
        let mut publish = Publish::new("a/b", QoS::AtLeastOnce, "hi").unwrap();
        publish.pkid = 10;
        publish.retain = true;

        assert_eq!(
            publish.to_string(),
            "Packet type: PUBLISH, Flags: 0011, Remaining Length: 9 bytes\n\
             Topic: a/b\n\
             Packet ID: 10\n\
             Payload: hi"
        );
    }

    #[test]
    fn publish_empty_payload_decodes_but_does_not_encode() {
        let stream = vec![0x30, 0x03, 0x00, 0x01, b't'];
        let (publish, _) = Publish::decode(&mut Cursor::new(stream)).unwrap();
        assert!(publish.payload.is_empty());

        assert!(matches!(
            publish.encode(),
            Err(Error::ProtocolViolation(Violation::EmptyPayload))
        ));
    }

    #[test]
    fn publish_topic_is_validated() {
        assert!(matches!(
            Publish::new("", QoS::AtMostOnce, "x"),
            Err(Error::ProtocolViolation(Violation::InvalidTopic(_)))
        ));

        let mut publish = Publish::new("a/b", QoS::AtMostOnce, "x").unwrap();
        assert!(publish.set_topic("a/#").is_err());
        assert!(publish.set_topic("a/*").is_err());
        assert_eq!(publish.topic(), "a/b");

        // wildcard topic on the wire
        let stream = vec![0x30, 0x04, 0x00, 0x01, b'#', 0xFF];
        assert!(matches!(
            Publish::decode(&mut Cursor::new(stream)),
            Err(Error::ProtocolViolation(Violation::InvalidTopic(t))) if t == "#"
        ));
    }

    #[test]
    fn publish_qos3_flags_rejected() {
        let stream = vec![0x36, 0x04, 0x00, 0x01, b't', 0xFF];
        assert!(matches!(
            Publish::decode(&mut Cursor::new(stream)),
            Err(Error::InvalidFlags {
                packet_type: PacketType::Publish,
                flags: 0b0110
            })
        ));
    }

    #[test]
    fn publish_missing_pkid_is_a_size_mismatch() {
        // QoS 1 but the body ends after the topic
        let stream = vec![0x32, 0x03, 0x00, 0x01, b't'];
        assert!(matches!(
            Publish::decode(&mut Cursor::new(stream)),
            Err(Error::SizeMismatch {
                declared: 3,
                actual: 5
            })
        ));
    }
}
