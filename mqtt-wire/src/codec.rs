use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::{Error, Packet};

/// A type that implements the [Encoder] and [Decoder] traits for MQTT packets.
#[derive(Debug, Clone)]
pub struct Codec {
    /// Maximum packet size allowed by client
    pub max_incoming_size: u32,
    /// Maximum packet size allowed by broker
    pub max_outgoing_size: u32,
}

impl Codec {
    /// Creates a new codec with specified maximum sizes
    pub fn new(max_incoming_size: u32, max_outgoing_size: u32) -> Self {
        Self {
            max_incoming_size,
            max_outgoing_size,
        }
    }
}

impl Decoder for Codec {
    type Item = Packet;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match Packet::read(src, self.max_incoming_size) {
            Ok(packet) => {
                log::trace!("Decoded {} packet", packet.packet_type().name());
                Ok(Some(packet))
            }
            Err(Error::InsufficientData(b)) => {
                // Get more packets to construct the incomplete packet
                src.reserve(b);
                Ok(None)
            }
            Err(e) => {
                log::debug!("Rejected incoming frame: {e}");
                Err(e)
            }
        }
    }
}

impl Encoder<Packet> for Codec {
    type Error = Error;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = item.size()?;
        if size > self.max_outgoing_size as usize {
            return Err(Error::PacketTooLarge {
                size,
                max: self.max_outgoing_size,
            });
        }

        item.write(dst)?;
        log::trace!("Encoded {} packet, {size} bytes", item.packet_type().name());

        Ok(())
    }
}
