use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::parse::*;
use crate::{Error, FixedHeader, QoS, Violation};

/// Subscribe request
///
/// Sent from the client to the server to create one or more subscriptions.
/// Each subscription registers a client’s interest in one or more topics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Subscribe {
    pub pkid: u16,
    pub filters: Vec<Filter>,
}

/// Subscription filter
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filter {
    pub path: String,
    pub qos: QoS,
}

impl Subscribe {
    pub fn new(pkid: u16) -> Self {
        Self {
            pkid,
            filters: Vec::new(),
        }
    }

    /// Adds a topic filter. Subscribing to a filter that is already in the
    /// packet replaces its requested QoS, keeping its position.
    pub fn add_filter(&mut self, path: impl Into<String>, qos: QoS) -> &mut Subscribe {
        let path = path.into();
        match self.filters.iter_mut().find(|f| f.path == path) {
            Some(filter) => filter.qos = qos,
            None => self.filters.push(Filter::new(path, qos)),
        }

        self
    }

    /// Removes a topic filter, returning whether it was present
    pub fn remove_filter(&mut self, path: &str) -> bool {
        let len = self.filters.len();
        self.filters.retain(|f| f.path != path);
        self.filters.len() != len
    }

    pub fn contains(&self, path: &str) -> bool {
        self.filters.iter().any(|f| f.path == path)
    }

    /// Requested QoS of a topic filter
    pub fn filter_qos(&self, path: &str) -> Option<QoS> {
        self.filters.iter().find(|f| f.path == path).map(|f| f.qos)
    }
}

impl Filter {
    pub fn new(path: impl Into<String>, qos: QoS) -> Self {
        Self {
            path: path.into(),
            qos,
        }
    }

    fn read(bytes: &mut Bytes) -> Result<Filter, Error> {
        let path = read_mqtt_string(bytes)?;
        let requested_qos = read_u8(bytes)?;

        Ok(Filter {
            path,
            qos: QoS::try_from(requested_qos)?,
        })
    }

    fn write(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        write_mqtt_string(buffer, &self.path)?;
        buffer.put_u8(self.qos as u8);
        Ok(())
    }

    fn len(&self) -> usize {
        // filter len + filter + requested qos
        2 + self.path.len() + 1
    }
}

impl ControlPacket for Subscribe {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

    fn validate(&self) -> Result<(), Error> {
        if self.filters.is_empty() {
            return Err(Violation::EmptyFilterList.into());
        }

        Ok(())
    }

    fn remaining_len(&self) -> usize {
        // len of pkid + vec![subscribe filter len]
        2 + self.filters.iter().fold(0, |s, t| s + t.len())
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let pkid = read_u16(bytes)?;

        let mut filters = Vec::new();
        while bytes.has_remaining() {
            filters.push(Filter::read(bytes)?);
        }

        match filters.len() {
            0 => Err(Violation::EmptyFilterList.into()),
            _ => Ok(Subscribe { pkid, filters }),
        }
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        // packet identifier
        buffer.put_u16(self.pkid);

        // topic filters
        for f in self.filters.iter() {
            f.write(buffer)?;
        }

        Ok(())
    }
}
