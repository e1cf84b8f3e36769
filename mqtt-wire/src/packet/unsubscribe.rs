use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader, Violation};

/// Unsubscribe request
///
/// Sent by the client to the server to unsubscribe from topics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Unsubscribe {
    pub pkid: u16,
    pub filters: Vec<String>,
}

impl Unsubscribe {
    pub fn new(pkid: u16) -> Unsubscribe {
        Unsubscribe {
            pkid,
            filters: Vec::new(),
        }
    }

    /// Adds a topic filter, unless the packet already holds it
    pub fn add_filter(&mut self, topic: impl Into<String>) -> &mut Unsubscribe {
        let topic = topic.into();
        if !self.contains(&topic) {
            self.filters.push(topic);
        }

        self
    }

    /// Removes a topic filter, returning whether it was present
    pub fn remove_filter(&mut self, topic: &str) -> bool {
        match self.filters.iter().position(|t| t == topic) {
            Some(i) => {
                self.filters.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.filters.iter().any(|t| t == topic)
    }
}

impl ControlPacket for Unsubscribe {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn validate(&self) -> Result<(), Error> {
        if self.filters.is_empty() {
            return Err(Violation::EmptyFilterList.into());
        }

        Ok(())
    }

    fn remaining_len(&self) -> usize {
        // Packet id + length of filters
        2 + self.filters.iter().fold(0, |s, t| s + 2 + t.len())
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;

        if !bytes.has_remaining() {
            return Err(Violation::EmptyFilterList.into());
        }

        let mut filters = Vec::new();
        while bytes.has_remaining() {
            let topic_filter = read_mqtt_string(bytes)?;
            filters.push(topic_filter);
        }

        Ok(Unsubscribe { pkid, filters })
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        // packet identifier
        buffer.put_u16(self.pkid);

        // topic filters
        for topic in self.filters.iter() {
            write_mqtt_string(buffer, topic.as_str())?;
        }

        Ok(())
    }
}
