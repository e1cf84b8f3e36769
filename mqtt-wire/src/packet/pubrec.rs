use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader};

/// Publish received
///
/// Response to a PUBLISH packet with QoS 2. It is the second packet of the QoS 2 protocol exchange.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PubRec {
    pub pkid: u16,
}

impl PubRec {
    pub fn new(pkid: u16) -> Self {
        Self { pkid }
    }
}

impl ControlPacket for PubRec {
    const PACKET_TYPE: PacketType = PacketType::PubRec;

    fn remaining_len(&self) -> usize {
        2 // pkid
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;
        Ok(PubRec::new(pkid))
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        buffer.put_u16(self.pkid);
        Ok(())
    }
}
