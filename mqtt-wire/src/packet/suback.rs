use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::header::fmt_header;
use crate::parse::*;
use crate::{Error, FixedHeader, QoS, Violation};

/// Subscribe acknowledgement
///
/// Sent by the server to the client to confirm receipt and processing of a SUBSCRIBE packet.
/// Holds one return code per filter of the SUBSCRIBE, in the same order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubAck {
    pub pkid: u16,
    pub return_codes: Vec<SubscribeReturnCode>,
}

const FAILURE: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeReturnCode {
    /// Subscription accepted with the granted QoS
    Success(QoS),
    Failure,
}

impl TryFrom<u8> for SubscribeReturnCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let v = match value {
            0 => Self::Success(QoS::AtMostOnce),
            1 => Self::Success(QoS::AtLeastOnce),
            2 => Self::Success(QoS::ExactlyOnce),
            FAILURE => Self::Failure,
            v => return Err(Violation::InvalidSubscribeReturnCode(v).into()),
        };

        Ok(v)
    }
}

impl From<SubscribeReturnCode> for u8 {
    fn from(value: SubscribeReturnCode) -> u8 {
        match value {
            SubscribeReturnCode::Success(qos) => qos as u8,
            SubscribeReturnCode::Failure => FAILURE,
        }
    }
}

impl SubAck {
    pub fn new(pkid: u16, return_codes: Vec<SubscribeReturnCode>) -> Self {
        SubAck { pkid, return_codes }
    }

    /// Appends a raw return code, which must be 0, 1, 2 or 0x80
    pub fn add_return_code(&mut self, code: u8) -> Result<&mut SubAck, Error> {
        self.return_codes.push(SubscribeReturnCode::try_from(code)?);
        Ok(self)
    }
}

impl ControlPacket for SubAck {
    const PACKET_TYPE: PacketType = PacketType::SubAck;

    fn remaining_len(&self) -> usize {
        2 + self.return_codes.len()
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;

        let mut return_codes = Vec::new();
        while bytes.has_remaining() {
            let return_code = read_u8(bytes)?;
            return_codes.push(return_code.try_into()?);
        }

        Ok(SubAck::new(pkid, return_codes))
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        // packet identifier
        buffer.put_u16(self.pkid);

        // return codes
        let p = self.return_codes.iter().map(|&c| u8::from(c));
        buffer.extend(p);

        Ok(())
    }
}

impl fmt::Display for SubAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_header(f, Self::PACKET_TYPE, self.flags(), self.remaining_len())?;
        let codes: Vec<u8> = self.return_codes.iter().map(|&c| u8::from(c)).collect();
        write!(f, "\nPacket ID: {}\nReturn Codes: {:?}", self.pkid, codes)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use bytes::BytesMut;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Packet;

    #[test]
    fn suback_parsing_works() {
        let stream = vec![
            0x90, 4, // packet type, flags and remaining len
            0x00, 0x0F, // variable header. pkid = 15
            0x01, 0x80, // payload. return codes [success qos1, failure]
            0xDE, 0xAD, 0xBE, 0xEF, // extra packets in the stream
        ];

        let mut stream = BytesMut::from(&stream[..]);
        let packet = Packet::read(&mut stream, 128).unwrap();

        assert_eq!(
            packet,
            Packet::SubAck(SubAck {
                pkid: 15,
                return_codes: vec![
                    SubscribeReturnCode::Success(QoS::AtLeastOnce),
                    SubscribeReturnCode::Failure,
                ],
            })
        );
    }

    #[test]
    fn suback_encoding_works() {
        let mut suback = SubAck::new(15, Vec::new());
        suback
            .add_return_code(0x01)
            .unwrap()
            .add_return_code(0x80)
            .unwrap();

        let bytes = suback.encode().unwrap();
        assert_eq!(&bytes[..], &[0x90, 0x04, 0x00, 0x0F, 0x01, 0x80]);
    }

    #[test]
    fn suback_invalid_return_code_rejected() {
        let mut suback = SubAck::new(1, Vec::new());
        assert!(matches!(
            suback.add_return_code(0x03),
            Err(Error::ProtocolViolation(
                Violation::InvalidSubscribeReturnCode(3)
            ))
        ));
        assert!(suback.return_codes.is_empty());

        let mut src = Cursor::new(vec![0x90, 0x03, 0x00, 0x01, 0x81]);
        assert!(matches!(
            SubAck::decode(&mut src),
            Err(Error::ProtocolViolation(
                Violation::InvalidSubscribeReturnCode(0x81)
            ))
        ));
    }

    #[test]
    fn suback_display() {
        let suback = SubAck::new(
            15,
            vec![
                SubscribeReturnCode::Success(QoS::AtLeastOnce),
                SubscribeReturnCode::Failure,
            ],
        );

        assert_eq!(
            suback.to_string(),
            "Packet type: SUBACK, Flags: 0000, Remaining Length: 4 bytes\n\
             Packet ID: 15\n\
             Return Codes: [1, 128]"
        );
    }

    #[test]
    fn suback_without_return_codes() {
        let mut src = Cursor::new(vec![0x90, 0x02, 0x00, 0x07]);
        let (suback, _) = SubAck::decode(&mut src).unwrap();
        assert_eq!(suback, SubAck::new(7, Vec::new()));
    }
}
