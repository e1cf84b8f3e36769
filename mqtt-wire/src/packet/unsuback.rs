use bytes::{BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader};

/// Unsubscribe acknowledgment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnsubAck {
    pub pkid: u16,
}

impl UnsubAck {
    pub fn new(pkid: u16) -> Self {
        Self { pkid }
    }
}

impl ControlPacket for UnsubAck {
    const PACKET_TYPE: PacketType = PacketType::UnsubAck;

    fn remaining_len(&self) -> usize {
        2 // pkid
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;
        Ok(UnsubAck::new(pkid))
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        buffer.put_u16(self.pkid);
        Ok(())
    }
}
