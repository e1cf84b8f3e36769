use bytes::{Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::{Error, FixedHeader};

/// PING request, sent by a client to keep the connection alive
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PingReq;

impl ControlPacket for PingReq {
    const PACKET_TYPE: PacketType = PacketType::PingReq;

    fn remaining_len(&self) -> usize {
        0 // no payload
    }

    fn read_body(_fixed_header: FixedHeader, _bytes: &mut Bytes) -> Result<Self, Error> {
        Ok(PingReq)
    }

    fn write_body(&self, _buffer: &mut BytesMut) -> Result<(), Error> {
        Ok(())
    }
}

/// PING response, sent by the server to a PINGREQ
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PingResp;

impl ControlPacket for PingResp {
    const PACKET_TYPE: PacketType = PacketType::PingResp;

    fn remaining_len(&self) -> usize {
        0 // no payload
    }

    fn read_body(_fixed_header: FixedHeader, _bytes: &mut Bytes) -> Result<Self, Error> {
        Ok(PingResp)
    }

    fn write_body(&self, _buffer: &mut BytesMut) -> Result<(), Error> {
        Ok(())
    }
}
