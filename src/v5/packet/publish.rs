use crate::{
    buffer::BufferProvider,
    bytes::Bytes,
    eio::Read,
    fmt::{error, trace},
    header::{FixedHeader, PacketType},
    io::read::{BodyReader, Readable, Store},
    packet::{Packet, RxError, RxPacket},
    types::{IdentifiedQoS, MqttString, QoS, VarByteInt},
    v5::property::{
        AtMostOnceProperty, ContentType, CorrelationData, MessageExpiryInterval,
        PayloadFormatIndicator, PropertyType, ResponseTopic, SubscriptionIdentifier, TopicAlias,
    },
};

/// A PUBLISH packet as received from the server, together with the state
/// carried in its fixed header (DUP flag, QoS, packet identifier).
///
/// This crate only decodes PUBLISH packets; sending publications is the
/// outbound path's business.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PublishPacket<'p> {
    /// Set when the server indicates this is not its first delivery attempt.
    pub dup: bool,
    /// Quality of service, carrying the packet identifier for levels 1 and 2.
    pub identified_qos: IdentifiedQoS,
    /// Whether this publication stems from a retained message.
    pub retain: bool,

    /// The topic the message was published on.
    pub topic: MqttString<'p>,

    /// Whether the payload is declared to be UTF-8. Not verified.
    pub payload_format_indicator: Option<PayloadFormatIndicator>,
    /// Remaining message lifetime in seconds.
    pub message_expiry_interval: Option<MessageExpiryInterval>,
    /// Alias chosen by the server for the topic of this publication.
    pub topic_alias: Option<TopicAlias>,
    /// Topic a response to this publication should be published on.
    pub response_topic: Option<ResponseTopic<'p>>,
    /// Data correlating a response with the request that caused it.
    pub correlation_data: Option<CorrelationData<'p>>,
    /// Content type of the payload as declared by the publisher.
    pub content_type: Option<ContentType<'p>>,

    /// The application message.
    pub message: Bytes<'p>,
}

impl<'p> Packet for PublishPacket<'p> {
    const PACKET_TYPE: PacketType = PacketType::Publish;
}

impl<'p> RxPacket<'p> for PublishPacket<'p> {
    async fn receive<R: Read, B: BufferProvider<'p>>(
        header: &FixedHeader,
        mut reader: BodyReader<'_, 'p, R, B>,
    ) -> Result<Self, RxError<R::Error, B::ProvisionError>> {
        trace!("decoding");

        let flags = header.flags();

        let dup = flags >> 3 == 1;
        let qos = QoS::try_from_bits((flags >> 1) & 0x03).map_err(|_| RxError::MalformedPacket)?;
        let retain = flags & 0x01 == 1;

        let r = &mut reader;

        trace!("reading topic name");
        let topic = MqttString::read(r).await?;

        let identified_qos = match qos {
            QoS::AtMostOnce => IdentifiedQoS::AtMostOnce,
            QoS::AtLeastOnce | QoS::ExactlyOnce => {
                trace!("reading packet identifier");
                let packet_identifier = u16::read(r).await?;
                if packet_identifier == 0 {
                    error!("packet identifier is 0");
                    return Err(RxError::ProtocolError);
                }
                match qos {
                    QoS::AtLeastOnce => IdentifiedQoS::AtLeastOnce(packet_identifier),
                    _ => IdentifiedQoS::ExactlyOnce(packet_identifier),
                }
            }
        };

        trace!("reading properties length");
        let properties_length = VarByteInt::read(r).await?.size();

        // The payload is everything after the properties.
        let payload_boundary = r
            .remaining_len()
            .checked_sub(properties_length)
            .ok_or(RxError::MalformedPacket)?;

        let mut packet = Self {
            dup,
            identified_qos,
            retain,
            topic,
            payload_format_indicator: None,
            message_expiry_interval: None,
            topic_alias: None,
            response_topic: None,
            correlation_data: None,
            content_type: None,
            message: Bytes::default(),
        };

        while r.remaining_len() > payload_boundary {
            let property_type = PropertyType::read(r).await?;
            trace!("reading property {:?}", property_type);

            match property_type {
                PropertyType::PayloadFormatIndicator => {
                    packet.payload_format_indicator.try_set(r).await?
                }
                PropertyType::MessageExpiryInterval => {
                    packet.message_expiry_interval.try_set(r).await?
                }
                PropertyType::TopicAlias => packet.topic_alias.try_set(r).await?,
                PropertyType::ResponseTopic => packet.response_topic.try_set(r).await?,
                PropertyType::CorrelationData => packet.correlation_data.try_set(r).await?,
                PropertyType::ContentType => packet.content_type.try_set(r).await?,
                PropertyType::SubscriptionIdentifier => {
                    // May appear multiple times; not tracked by this crate.
                    let mut subscription_identifier: Option<SubscriptionIdentifier> = None;
                    subscription_identifier.try_set(r).await?;
                }
                PropertyType::UserProperty => {
                    let len = u16::read(r).await? as usize;
                    r.skip(len).await?;
                    let len = u16::read(r).await? as usize;
                    r.skip(len).await?;
                }
                p => {
                    // Malformed packet according to <https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901029>
                    error!("packet contains unexpected property {:?}", p);
                    return Err(RxError::MalformedPacket);
                }
            };
        }

        if r.remaining_len() != payload_boundary {
            error!("a property extended past the properties length");
            return Err(RxError::MalformedPacket);
        }

        trace!("reading message ({} bytes)", payload_boundary);
        packet.message = r.read_and_store(payload_boundary).await?;

        Ok(packet)
    }
}

impl<'p> PublishPacket<'p> {
    /// Creates a publication without optional properties, as the tests and
    /// downstream consumers of the inbound engine construct them.
    pub fn new(
        dup: bool,
        retain: bool,
        identified_qos: IdentifiedQoS,
        topic: MqttString<'p>,
        message: Bytes<'p>,
    ) -> Self {
        Self {
            dup,
            identified_qos,
            retain,
            topic,
            payload_format_indicator: None,
            message_expiry_interval: None,
            topic_alias: None,
            response_topic: None,
            correlation_data: None,
            content_type: None,
            message,
        }
    }

    /// Returns the quality of service without the packet identifier.
    pub fn qos(&self) -> QoS {
        self.identified_qos.into()
    }

    /// Returns the packet identifier for QoS 1 and 2 publications.
    pub fn packet_identifier(&self) -> Option<u16> {
        self.identified_qos.packet_identifier()
    }
}
