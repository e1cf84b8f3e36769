use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader};

/// Publish acknowledgement
///
/// Response to a PUBLISH packet with QoS 1.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PubAck {
    pub pkid: u16,
}

impl PubAck {
    pub fn new(pkid: u16) -> Self {
        Self { pkid }
    }
}

impl ControlPacket for PubAck {
    const PACKET_TYPE: PacketType = PacketType::PubAck;

    fn remaining_len(&self) -> usize {
        2 // pkid
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;
        Ok(PubAck::new(pkid))
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        buffer.put_u16(self.pkid);
        Ok(())
    }
}
