use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ControlPacket, PacketType};
use crate::header::fmt_header;
use crate::parse::*;
use crate::{valid_client_id, Error, FixedHeader, ProtocolVersion, QoS, Violation};

/// Connection request
///
/// The first packet that must be sent to a server after a client establishes a network connection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Connect {
    /// Protocol level, which also decides the protocol name on the wire
    pub protocol: ProtocolVersion,
    /// MQTT keep alive time
    pub keep_alive: u16,
    /// Clean session. Asks the broker to clear previous state
    pub clean_session: bool,
    /// Client Identifier - must be present in the payload
    client_id: String,
    /// Will message that broker needs to publish when the client disconnects
    pub last_will: Option<LastWill>,
    /// Login credentials
    pub login: Option<Login>,
}

/// LastWill that broker forwards on behalf of the client
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub message: Bytes,
    pub qos: QoS,
    pub retain: bool,
}

/// Credentials of a CONNECT packet.
///
/// The username and password flags can be set without their strings being in
/// the packet. `None` username and [Password::Omitted] keep track of that, so a
/// decoded packet is written back exactly as it was read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Login {
    pub username: Option<String>,
    pub password: Password,
}

/// Password of a [Login]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Password {
    /// Password flag not set
    #[default]
    Unset,
    /// Password flag set, but no password in the packet
    Omitted,
    Present(Bytes),
}

// connect flags
const USERNAME: u8 = 0b1000_0000;
const PASSWORD: u8 = 0b0100_0000;
const WILL_RETAIN: u8 = 0b0010_0000;
const WILL_QOS: u8 = 0b0001_1000;
const WILL: u8 = 0b0000_0100;
const CLEAN_SESSION: u8 = 0b0000_0010;
const RESERVED: u8 = 0b0000_0001;

impl Connect {
    /// Creates a MQTT 3.1.1 connection request
    ///
    /// # Errors
    /// The client identifier must only contain `[0-9A-Za-z]`
    pub fn new(
        client_id: impl Into<String>,
        keep_alive: u16,
        clean_session: bool,
    ) -> Result<Self, Error> {
        let mut connect = Connect {
            keep_alive,
            clean_session,
            ..Default::default()
        };
        connect.set_client_id(client_id)?;
        Ok(connect)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sets the client identifier, rejecting anything outside of `[0-9A-Za-z]`.
    ///
    /// An empty identifier is accepted here, but only encodes with a clean session.
    pub fn set_client_id(&mut self, client_id: impl Into<String>) -> Result<(), Error> {
        let client_id = client_id.into();
        if !valid_client_id(&client_id) {
            return Err(Violation::IdentifierRejected.into());
        }

        self.client_id = client_id;
        Ok(())
    }

    pub fn set_will(
        &mut self,
        topic: impl Into<String>,
        message: impl Into<Bytes>,
        qos: QoS,
        retain: bool,
    ) -> &mut Connect {
        self.last_will = Some(LastWill::new(topic, message, qos, retain));
        self
    }

    pub fn set_login(
        &mut self,
        username: impl Into<String>,
        password: Option<Bytes>,
    ) -> &mut Connect {
        self.login = Some(Login::new(username, password));
        self
    }

    fn connect_flags(&self) -> u8 {
        let mut connect_flags = 0;
        if self.clean_session {
            connect_flags |= CLEAN_SESSION;
        }

        if let Some(w) = &self.last_will {
            connect_flags |= WILL | ((w.qos as u8) << 3);
            if w.retain {
                connect_flags |= WILL_RETAIN;
            }
        }

        if let Some(l) = &self.login {
            connect_flags |= USERNAME;
            if l.password != Password::Unset {
                connect_flags |= PASSWORD;
            }
        }

        connect_flags
    }

    fn validate_client_id(client_id: &str, clean_session: bool) -> Result<(), Error> {
        // A zero-byte client id is only allowed for clean sessions
        if client_id.is_empty() && !clean_session {
            return Err(Violation::IdentifierRejected.into());
        }

        if !valid_client_id(client_id) {
            return Err(Violation::IdentifierRejected.into());
        }

        Ok(())
    }
}

impl LastWill {
    pub fn new(
        topic: impl Into<String>,
        message: impl Into<Bytes>,
        qos: QoS,
        retain: bool,
    ) -> LastWill {
        LastWill {
            topic: topic.into(),
            message: message.into(),
            qos,
            retain,
        }
    }

    fn read(connect_flags: u8, bytes: &mut Bytes) -> Result<Option<LastWill>, Error> {
        if connect_flags & WILL == 0 {
            return Ok(None);
        }

        let topic = read_mqtt_string(bytes)?;
        let message = read_mqtt_bytes(bytes)?;
        Ok(Some(LastWill {
            topic,
            message,
            qos: QoS::try_from((connect_flags & WILL_QOS) >> 3)?,
            retain: (connect_flags & WILL_RETAIN) != 0,
        }))
    }

    fn write(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        write_mqtt_string(buffer, &self.topic)?;
        write_mqtt_bytes(buffer, &self.message)
    }

    fn len(&self) -> usize {
        2 + self.topic.len() + 2 + self.message.len()
    }
}

impl Login {
    pub fn new(username: impl Into<String>, password: Option<Bytes>) -> Login {
        Login {
            username: Some(username.into()),
            password: password.map_or(Password::Unset, Password::Present),
        }
    }

    /// Reads username and password. A string whose flag is set is only
    /// read if the packet still has bytes left.
    fn read(connect_flags: u8, bytes: &mut Bytes) -> Result<Option<Login>, Error> {
        if connect_flags & USERNAME == 0 {
            return Ok(None);
        }

        let username = if bytes.has_remaining() {
            Some(read_mqtt_string(bytes)?)
        } else {
            None
        };

        let password = if connect_flags & PASSWORD == 0 {
            Password::Unset
        } else if bytes.has_remaining() {
            Password::Present(read_mqtt_bytes(bytes)?)
        } else {
            Password::Omitted
        };

        Ok(Some(Login { username, password }))
    }

    fn validate(&self) -> Result<(), Error> {
        // a password in the packet would be read back as the username
        if self.username.is_none() && matches!(self.password, Password::Present(_)) {
            return Err(Violation::PasswordWithoutUsername.into());
        }

        Ok(())
    }

    fn write(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        if let Some(username) = &self.username {
            write_mqtt_string(buffer, username)?;
        }

        if let Password::Present(password) = &self.password {
            write_mqtt_bytes(buffer, password)?;
        }

        Ok(())
    }

    fn len(&self) -> usize {
        let mut len = 0;

        if let Some(username) = &self.username {
            len += 2 + username.len();
        }

        if let Password::Present(password) = &self.password {
            len += 2 + password.len();
        }

        len
    }
}

impl ControlPacket for Connect {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn validate(&self) -> Result<(), Error> {
        Self::validate_client_id(&self.client_id, self.clean_session)?;

        match &self.login {
            Some(l) => l.validate(),
            None => Ok(()),
        }
    }

    fn remaining_len(&self) -> usize {
        let mut len = 2 + self.protocol.name().len() // protocol name
                    + 1  // protocol version
                    + 1  // connect flags
                    + 2; // keep alive

        len += 2 + self.client_id.len();

        // last will len
        if let Some(w) = &self.last_will {
            len += w.len();
        }

        // username and password len
        if let Some(l) = &self.login {
            len += l.len();
        }

        len
    }

    fn read_body(_fixed_header: FixedHeader, bytes: &mut Bytes) -> Result<Self, Error> {
        let protocol_name = read_mqtt_bytes(bytes)?;
        let protocol_level = read_u8(bytes)?;
        let protocol = ProtocolVersion::try_from(protocol_level)?;
        if protocol_name != protocol.name().as_bytes() {
            return Err(Violation::UnacceptableProtocolVersion.into());
        }

        let connect_flags = read_u8(bytes)?;
        if connect_flags & RESERVED != 0 {
            return Err(Violation::ReservedBitsSet(connect_flags).into());
        }

        let will_qos = (connect_flags & WILL_QOS) >> 3;
        QoS::try_from(will_qos)?;
        if connect_flags & WILL == 0 && (will_qos != 0 || connect_flags & WILL_RETAIN != 0) {
            return Err(Violation::WillFlagsWithoutWill.into());
        }

        if connect_flags & PASSWORD != 0 && connect_flags & USERNAME == 0 {
            return Err(Violation::PasswordWithoutUsername.into());
        }

        let keep_alive = read_u16(bytes)?;
        let clean_session = (connect_flags & CLEAN_SESSION) != 0;

        let client_id = read_mqtt_string(bytes)?;
        Self::validate_client_id(&client_id, clean_session)?;

        let last_will = LastWill::read(connect_flags, bytes)?;
        let login = Login::read(connect_flags, bytes)?;

        Ok(Connect {
            protocol,
            keep_alive,
            clean_session,
            client_id,
            last_will,
            login,
        })
    }

    fn write_body(&self, buffer: &mut BytesMut) -> Result<(), Error> {
        // protocol name
        write_mqtt_string(buffer, self.protocol.name())?;
        // protocol version
        buffer.put_u8(self.protocol as u8);
        // connect flags
        buffer.put_u8(self.connect_flags());
        // keep alive time
        buffer.put_u16(self.keep_alive);

        // client identifier
        write_mqtt_string(buffer, &self.client_id)?;

        // last will message
        if let Some(w) = &self.last_will {
            w.write(buffer)?;
        }

        // username and password
        if let Some(l) = &self.login {
            l.write(buffer)?;
        }

        Ok(())
    }
}

impl fmt::Display for Connect {
    /// The password is shown by length only
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_header(f, Self::PACKET_TYPE, self.flags(), self.remaining_len())?;
        write!(
            f,
            "\nConnect Flags: {:08b}\nProtocol: {} ({})\nKeep Alive: {}\nClient ID: {}",
            self.connect_flags(),
            self.protocol.name(),
            self.protocol as u8,
            self.keep_alive,
            self.client_id
        )?;

        let (will_topic, will_message) = match &self.last_will {
            Some(w) => (w.topic.as_str(), String::from_utf8_lossy(&w.message)),
            None => ("", Default::default()),
        };
        write!(f, "\nWill Topic: {will_topic}\nWill Message: {will_message}")?;

        let (username, password_len) = match &self.login {
            Some(l) => (
                l.username.as_deref().unwrap_or_default(),
                match &l.password {
                    Password::Present(p) => p.len(),
                    _ => 0,
                },
            ),
            None => ("", 0),
        };
        write!(f, "\nUsername: {username}\nPassword: {password_len} bytes")
    }
}
