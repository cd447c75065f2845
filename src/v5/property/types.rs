use crate::{
    eio::{Read, Write},
    io::{
        err::{ReadError, WriteError},
        read::Readable,
        write::Writable,
    },
};

/// Identifiers of the properties that may appear in PUBLISH packets and the
/// PUBACK/PUBREC/PUBREL/PUBCOMP family. Any other identifier in those packets
/// is a malformed packet.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PropertyType {
    /// PUBLISH
    PayloadFormatIndicator,

    /// PUBLISH
    MessageExpiryInterval,

    /// PUBLISH
    ContentType,

    /// PUBLISH
    ResponseTopic,

    /// PUBLISH
    CorrelationData,

    /// PUBLISH
    SubscriptionIdentifier,

    /// PUBACK, PUBREC, PUBREL, PUBCOMP, DISCONNECT
    ReasonString,

    /// PUBLISH
    TopicAlias,

    /// PUBLISH, PUBACK, PUBREC, PUBREL, PUBCOMP, DISCONNECT
    UserProperty,
}

impl PropertyType {
    /// Parses a property identifier byte.
    pub const fn from_identifier(identifier: u8) -> Result<Self, ()> {
        Ok(match identifier {
            0x01 => Self::PayloadFormatIndicator,
            0x02 => Self::MessageExpiryInterval,
            0x03 => Self::ContentType,
            0x08 => Self::ResponseTopic,
            0x09 => Self::CorrelationData,
            0x0B => Self::SubscriptionIdentifier,
            0x1F => Self::ReasonString,
            0x23 => Self::TopicAlias,
            0x26 => Self::UserProperty,
            _ => return Err(()),
        })
    }

    /// Returns the identifier byte.
    pub const fn identifier(&self) -> u8 {
        match self {
            Self::PayloadFormatIndicator => 0x01,
            Self::MessageExpiryInterval => 0x02,
            Self::ContentType => 0x03,
            Self::ResponseTopic => 0x08,
            Self::CorrelationData => 0x09,
            Self::SubscriptionIdentifier => 0x0B,
            Self::ReasonString => 0x1F,
            Self::TopicAlias => 0x23,
            Self::UserProperty => 0x26,
        }
    }
}

impl<R: Read> Readable<R> for PropertyType {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        let identifier = u8::read(read).await?;

        Self::from_identifier(identifier).map_err(|_| ReadError::MalformedPacket)
    }
}

impl Writable for PropertyType {
    fn written_len(&self) -> usize {
        1
    }

    async fn write<W: Write>(&self, write: &mut W) -> Result<(), WriteError<W::Error>> {
        self.identifier().write(write).await
    }
}
