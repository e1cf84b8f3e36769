use bytes::{Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::{Error, FixedHeader};

/// Disconnect notification
///
/// The final packet sent from the client to the server.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Disconnect;

impl ControlPacket for Disconnect {
    const PACKET_TYPE: PacketType = PacketType::Disconnect;

    fn remaining_len(&self) -> usize {
        0 // no payload
    }

    fn read_body(_fixed_header: FixedHeader, _bytes: &mut Bytes) -> Result<Self, Error> {
        Ok(Disconnect)
    }

    fn write_body(&self, _buffer: &mut BytesMut) -> Result<(), Error> {
        Ok(())
    }
}
