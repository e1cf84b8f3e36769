use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader};

/// Publish release
///
/// Response to a PUBREC packet. It is the third packet of the QoS 2 protocol exchange.
/// Always carries the flags `0b0010`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PubRel {
    pub pkid: u16,
}

impl PubRel {
    pub fn new(pkid: u16) -> Self {
        Self { pkid }
    }
}

impl ControlPacket for PubRel {
    const PACKET_TYPE: PacketType = PacketType::PubRel;

    fn remaining_len(&self) -> usize {
        2 // pkid
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;
        Ok(PubRel::new(pkid))
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        buffer.put_u16(self.pkid);
        Ok(())
    }
}
